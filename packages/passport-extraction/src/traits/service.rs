//! The remote extraction capability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::types::image::EncodedImage;

/// A remote multimodal service that reads passport fields from an image.
///
/// Implementations wrap a specific provider and report failures as
/// [`ExtractionError::Service`]. The returned payload is untrusted: the
/// orchestrator validates it against the passport schema before anyone sees it.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Run one extraction for `image` (a data URL).
    async fn extract(&self, image: &EncodedImage) -> Result<serde_json::Value, ExtractionError>;
}

#[async_trait]
impl<S: ExtractionService + ?Sized> ExtractionService for Arc<S> {
    async fn extract(&self, image: &EncodedImage) -> Result<serde_json::Value, ExtractionError> {
        (**self).extract(image).await
    }
}

#[async_trait]
impl<S: ExtractionService + ?Sized> ExtractionService for Box<S> {
    async fn extract(&self, image: &EncodedImage) -> Result<serde_json::Value, ExtractionError> {
        (**self).extract(image).await
    }
}
