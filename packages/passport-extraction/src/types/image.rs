//! Raw and encoded image types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::AsyncRead;

/// Where the bytes of a [`RawImage`] come from.
pub(crate) enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

/// A user-supplied file: a content source plus its declared media type.
///
/// Consumed by ingestion; nothing keeps it around afterwards.
pub struct RawImage {
    pub(crate) media_type: String,
    pub(crate) source: ImageSource,
}

impl RawImage {
    /// File on disk. The media type is guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let media_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            media_type,
            source: ImageSource::Path(path),
        }
    }

    /// In-memory content with an explicit media type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            source: ImageSource::Bytes(bytes.into()),
        }
    }

    /// Any async byte stream (upload body, pipe) with an explicit media type.
    pub fn from_reader(
        reader: impl AsyncRead + Send + Unpin + 'static,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            media_type: media_type.into(),
            source: ImageSource::Reader(Box::new(reader)),
        }
    }

    /// Override the declared media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            ImageSource::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ImageSource::Path(path) => format!("path({})", path.display()),
            ImageSource::Bytes(bytes) => format!("bytes({})", bytes.len()),
            ImageSource::Reader(_) => "reader".to_string(),
        };
        f.debug_struct("RawImage")
            .field("media_type", &self.media_type)
            .field("source", &source)
            .finish()
    }
}

/// A `data:<media type>;base64,<payload>` URL.
///
/// Immutable and cheap to clone; the same value is sent to the service and
/// used as the preview.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data_url: Arc<str>,
    /// Byte offset of the payload within `data_url`.
    payload_start: usize,
}

impl EncodedImage {
    /// Encode `bytes` as a data URL of the given media type.
    pub fn encode(media_type: &str, bytes: &[u8]) -> Self {
        let prefix = format!("data:{};base64,", media_type);
        let payload_start = prefix.len();
        let mut data_url = prefix;
        STANDARD.encode_string(bytes, &mut data_url);
        Self {
            data_url: Arc::from(data_url),
            payload_start,
        }
    }

    /// The full data URL.
    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    /// Media type declared in the URL header.
    pub fn media_type(&self) -> &str {
        &self.data_url["data:".len()..self.payload_start - ";base64,".len()]
    }

    /// The base64 payload without the header.
    pub fn payload(&self) -> &str {
        &self.data_url[self.payload_start..]
    }

    /// Decode the payload back into the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload())
    }

    /// Size of the data URL in bytes.
    pub fn len(&self) -> usize {
        self.data_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type())
            .field("len", &self.len())
            .finish()
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for EncodedImage {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
