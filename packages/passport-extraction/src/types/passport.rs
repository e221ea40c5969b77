//! The passport record and its validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Fields read from a passport data page.
///
/// Schema-complete: every key is always present. A field the service could
/// not read is an empty string, never absent and never `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PassportData {
    /// Full name of the holder as printed (surname and given names)
    pub name: String,
    /// Passport document number
    pub passport_number: String,
    /// Nationality of the holder
    pub nationality: String,
    /// Date of birth as printed on the page
    pub date_of_birth: String,
    /// Place of birth
    pub place_of_birth: String,
    /// Sex marker (M, F or X)
    pub sex: String,
    /// Date the passport was issued
    pub date_of_issue: String,
    /// Date the passport expires
    pub date_of_expiry: String,
    /// Country or authority that issued the passport
    pub issuing_country: String,
}

impl PassportData {
    /// Validate an untrusted service payload against the passport schema.
    ///
    /// Missing keys, `null` or non-string values, extra keys and non-object
    /// payloads are all rejected; nothing partial gets through.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ExtractionError> {
        if !value.is_object() {
            return Err(ExtractionError::Schema(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| ExtractionError::Schema(e.to_string()))
    }

    /// `(label, value)` pairs in display order.
    pub fn fields(&self) -> [(&'static str, &str); 9] {
        [
            ("Full Name", self.name.as_str()),
            ("Passport Number", self.passport_number.as_str()),
            ("Nationality", self.nationality.as_str()),
            ("Date of Birth", self.date_of_birth.as_str()),
            ("Place of Birth", self.place_of_birth.as_str()),
            ("Sex", self.sex.as_str()),
            ("Date of Issue", self.date_of_issue.as_str()),
            ("Date of Expiry", self.date_of_expiry.as_str()),
            ("Issuing Country", self.issuing_country.as_str()),
        ]
    }

    /// Number of fields the service could not read.
    pub fn blank_count(&self) -> usize {
        self.fields()
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .count()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
