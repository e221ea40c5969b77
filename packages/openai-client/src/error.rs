//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The model declined to answer
    #[error("Model refused: {0}")]
    Refusal(String),
}

impl OpenAIError {
    /// HTTP status for API errors, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            OpenAIError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an API error from a non-2xx response body.
    ///
    /// Prefers the `error.message` field of an OpenAI-style error envelope
    /// and falls back to the raw body text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = api_message_from_body(body).unwrap_or_else(|| body.trim().to_string());
        OpenAIError::Api { status, message }
    }
}

/// Pull `error.message` out of an OpenAI-style error body.
///
/// Gemini's compatibility endpoint wraps errors in a one-element array,
/// so both shapes are accepted.
pub fn api_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let envelope = match &value {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };
    envelope
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_openai_envelope() {
        let body = r#"{"error":{"message":"Rate limit reached for gpt-4o","type":"requests","code":"rate_limit_exceeded"}}"#;
        assert_eq!(
            api_message_from_body(body).as_deref(),
            Some("Rate limit reached for gpt-4o")
        );
    }

    #[test]
    fn test_message_from_array_envelope() {
        let body = r#"[{"error":{"code":400,"message":"Invalid image","status":"INVALID_ARGUMENT"}}]"#;
        assert_eq!(api_message_from_body(body).as_deref(), Some("Invalid image"));
    }

    #[test]
    fn test_from_response_falls_back_to_body() {
        let err = OpenAIError::from_response(502, "  Bad Gateway\n");
        assert_eq!(err.status(), Some(502));
        match err {
            OpenAIError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_only_for_api_errors() {
        assert_eq!(OpenAIError::Network("reset".into()).status(), None);
        assert_eq!(
            OpenAIError::Api { status: 429, message: "slow down".into() }.status(),
            Some(429)
        );
    }
}
