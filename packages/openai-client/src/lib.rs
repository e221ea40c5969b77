//! OpenAI-compatible REST API client
//!
//! A small client for chat completions with strict JSON-schema structured
//! output and image inputs. It carries no domain logic; any endpoint that
//! speaks the chat completions protocol works (OpenAI, Azure, Gemini's
//! OpenAI compatibility layer, local proxies).
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, StructuredOutput, StructuredRequest};
//!
//! let client = OpenAIClient::new(api_key).with_base_url(base_url);
//!
//! let request = StructuredRequest::with_image(
//!     "gpt-4o",
//!     "You read identity documents.",
//!     "Extract the fields.",
//!     "data:image/jpeg;base64,...",
//!     Document::openai_schema(),
//! );
//! let json = client.structured_output(request).await?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{api_message_from_body, OpenAIError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`, connect through response body.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Structured output with JSON schema.
    ///
    /// Uses the `json_schema` response format and returns the raw content
    /// string of the first choice. Parsing is left to the caller so that it
    /// can decide how much of the payload to trust.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI structured output error");
            return Err(OpenAIError::from_response(status.as_u16(), &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OpenAIError::Network(e.to_string()))?;

        let content = parse_first_content(&body)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            content_len = content.len(),
            "OpenAI structured output"
        );

        Ok(content)
    }
}

/// Content of the first choice of a chat completion body.
fn parse_first_content(body: &str) -> Result<String> {
    let chat_response: types::ChatResponseRaw =
        serde_json::from_str(body).map_err(|e| OpenAIError::Parse(e.to_string()))?;

    if let Some(usage) = &chat_response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "OpenAI token usage"
        );
    }

    let message = chat_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| OpenAIError::Parse("No choices in response".into()))?;

    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(OpenAIError::Refusal(refusal));
    }

    message
        .content
        .ok_or_else(|| OpenAIError::Parse("Response message has no content".into()))
}
