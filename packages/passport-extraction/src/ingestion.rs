//! Image ingestion: raw file in, data URL out.

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::IngestionError;
use crate::types::image::{EncodedImage, ImageSource, RawImage};

/// Read the whole file and encode it as a data URL.
///
/// The media type is checked before any I/O. There is no size ceiling here;
/// the service boundary enforces its own limits.
pub async fn ingest(file: RawImage) -> Result<EncodedImage, IngestionError> {
    let RawImage { media_type, source } = file;
    let media_type = normalize_media_type(&media_type)?;

    let bytes = match source {
        ImageSource::Bytes(bytes) => bytes,
        ImageSource::Path(path) => tokio::fs::read(&path)
            .await
            .map_err(|source| IngestionError::Read {
                path: Some(path.clone()),
                source,
            })?,
        ImageSource::Reader(mut reader) => {
            let mut buf = Vec::new();
            reader
                .read_to_end(&mut buf)
                .await
                .map_err(|source| IngestionError::Read { path: None, source })?;
            buf
        }
    };

    if bytes.is_empty() {
        return Err(IngestionError::Empty);
    }

    let encoded = EncodedImage::encode(&media_type, &bytes);
    debug!(
        media_type = %media_type,
        bytes = bytes.len(),
        encoded_len = encoded.len(),
        "Ingested image"
    );
    Ok(encoded)
}

/// Lowercased `type/subtype` without parameters; must be `image/*`.
fn normalize_media_type(declared: &str) -> Result<String, IngestionError> {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => Ok(essence),
        _ => Err(IngestionError::UnsupportedMediaType {
            media_type: declared.to_string(),
        }),
    }
}
