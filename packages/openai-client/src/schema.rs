//! Strict JSON schemas for structured outputs, derived from Rust types.
//!
//! OpenAI strict mode rejects schemas unless every object schema has
//! `additionalProperties: false` and lists every property in `required`.
//! `$schema` and `definitions` are dropped; nested types are not supported
//! by [`StructuredOutput`] and should be flattened by the caller.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can be requested as structured output.
///
/// Blanket-implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for this type.
    fn openai_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        strictify(&mut value);
        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }
        value
    }

    /// Top-level property names, sorted.
    fn property_names() -> Vec<String> {
        match Self::openai_schema().get("properties") {
            Some(Value::Object(props)) => props.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn strictify(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                let keys = map.get("properties").and_then(Value::as_object).map(|props| {
                    props
                        .keys()
                        .map(|k| Value::String(k.clone()))
                        .collect::<Vec<_>>()
                });
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }
            map.values_mut().for_each(strictify);
        }
        Value::Array(items) => items.iter_mut().for_each(strictify),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Visa {
        holder_name: String,
        visa_number: Option<String>,
        entries: String,
    }

    #[test]
    fn test_all_properties_required() {
        let schema = Visa::openai_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert_eq!(required.len(), 3);
        assert!(required.contains(&"visaNumber"), "optional fields are still required");
    }

    #[test]
    fn test_strict_markers() {
        let schema = Visa::openai_schema();
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("definitions").is_none());
    }

    #[test]
    fn test_property_names() {
        assert_eq!(
            Visa::property_names(),
            vec!["entries", "holderName", "visaNumber"]
        );
    }
}
