//! OpenAI API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// "system", "user" or "assistant"
    pub role: String,

    /// Message content
    pub content: MessageContent,
}

/// Message content: plain text or a list of multimodal parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference; `url` may be an http(s) URL or a `data:` URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,

    /// "low", "high" or "auto"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Image part at full detail. Small print on documents needs it.
    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: Some("high".to_string()),
            },
        }
    }
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message from multimodal parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Chat completion body, only the parts the client reads.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub refusal: Option<String>,
}

/// Token accounting reported with each completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt side, image tokens included
    pub prompt_tokens: u32,

    /// Generated side
    pub completion_tokens: u32,

    pub total_tokens: u32,
}

// =============================================================================
// Structured Output
// =============================================================================

/// Chat completion request constrained to a strict JSON schema.
#[derive(Debug, Serialize)]
pub struct StructuredRequest {
    /// Model to use
    pub model: String,

    /// System turn then user turn
    pub messages: Vec<Message>,

    /// Zero for extraction work
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    pub response_format: ResponseFormat,
}

impl StructuredRequest {
    /// Create a structured request whose user turn carries an instruction and one image.
    pub fn with_image(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
        image_url: impl Into<String>,
        schema: serde_json::Value,
    ) -> Self {
        let user = Message::user_parts(vec![
            ContentPart::text(prompt),
            ContentPart::image(image_url),
        ]);
        Self {
            model: model.into(),
            messages: vec![Message::system(system), user],
            temperature: Some(0.0),
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: "structured_response".to_string(),
                    strict: true,
                    schema,
                },
            },
        }
    }

    /// Override the schema name reported to the API.
    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.response_format.json_schema.name = name.into();
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

// =============================================================================
// Utilities
// =============================================================================

/// Remove a markdown fence some models wrap JSON replies in.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_serializes_as_string() {
        let value = serde_json::to_value(Message::system("Be precise")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "Be precise"}));
    }

    #[test]
    fn test_image_request_shape() {
        let req = StructuredRequest::with_image(
            "gpt-4o",
            "system prompt",
            "read this",
            "data:image/png;base64,iVBORw0KGgo=",
            json!({"type": "object"}),
        )
        .schema_name("passport");

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "passport");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);

        let parts = &value["messages"][1]["content"];
        assert_eq!(parts[0], json!({"type": "text", "text": "read this"}));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(parts[1]["image_url"]["detail"], "high");
    }

    #[test]
    fn test_response_content_may_be_null() {
        let raw: ChatResponseRaw = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null, "refusal": "I can't help"}}]
        }))
        .unwrap();
        assert!(raw.usage.is_none());
        assert_eq!(raw.choices[0].message.content, None);
        assert_eq!(raw.choices[0].message.refusal.as_deref(), Some("I can't help"));
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }
}
