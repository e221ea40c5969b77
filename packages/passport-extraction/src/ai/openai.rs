//! OpenAI-compatible implementation of [`ExtractionService`].

use async_trait::async_trait;
use openai_client::{strip_code_blocks, OpenAIClient, OpenAIError, StructuredOutput, StructuredRequest};
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{ExtractionError, ServiceErrorKind};
use crate::traits::ExtractionService;
use crate::types::{EncodedImage, PassportData};

const SYSTEM_PROMPT: &str = "You read the data page of passports. \
Return every requested field exactly as printed on the document, in the \
document's own spelling and date format. If a field is not visible or not \
legible, return an empty string for it. Never guess and never add fields.";

const USER_PROMPT: &str = "Extract the passport fields from this image.";

/// Sends the image to a chat completions endpoint with a strict JSON schema
/// derived from [`PassportData`].
#[derive(Debug, Clone)]
pub struct OpenAiExtractionService {
    client: OpenAIClient,
    model: String,
}

impl OpenAiExtractionService {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ExtractionError> {
        let client = OpenAIClient::new(config.api_key())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout)
            .map_err(map_client_error)?;
        Ok(Self::new(client, config.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, image: &EncodedImage) -> StructuredRequest {
        StructuredRequest::with_image(
            self.model.clone(),
            SYSTEM_PROMPT,
            USER_PROMPT,
            image.as_str(),
            PassportData::openai_schema(),
        )
        .schema_name("passport_data")
    }
}

#[async_trait]
impl ExtractionService for OpenAiExtractionService {
    async fn extract(&self, image: &EncodedImage) -> Result<serde_json::Value, ExtractionError> {
        debug!(model = %self.model, media_type = %image.media_type(), "Requesting passport extraction");

        let content = self
            .client
            .structured_output(self.request(image))
            .await
            .map_err(map_client_error)?;

        parse_payload(&content)
    }
}

/// Parse the model's reply as JSON. Shape validation happens upstream.
fn parse_payload(content: &str) -> Result<serde_json::Value, ExtractionError> {
    serde_json::from_str(strip_code_blocks(content)).map_err(|e| {
        warn!(error = %e, content_len = content.len(), "Extraction reply is not JSON");
        ExtractionError::Schema(format!("reply is not valid JSON: {}", e))
    })
}

fn map_client_error(err: OpenAIError) -> ExtractionError {
    let (kind, message) = match err {
        OpenAIError::Api { status, message } => (kind_for_status(status), message),
        OpenAIError::Network(message) => (ServiceErrorKind::Network, message),
        OpenAIError::Parse(message) => (ServiceErrorKind::Internal, message),
        OpenAIError::Refusal(message) => (ServiceErrorKind::Internal, message),
        OpenAIError::Config(message) => (ServiceErrorKind::Internal, message),
    };
    let message = Some(message.trim().to_string()).filter(|m| !m.is_empty());
    ExtractionError::Service { kind, message }
}

fn kind_for_status(status: u16) -> ServiceErrorKind {
    match status {
        429 => ServiceErrorKind::RateLimited,
        400 | 413 | 415 | 422 => ServiceErrorKind::InvalidInput,
        401 | 403 => ServiceErrorKind::Unauthorized,
        _ => ServiceErrorKind::Internal,
    }
}
