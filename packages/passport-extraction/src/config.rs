//! Service configuration loaded from the environment.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for the remote extraction service.
pub struct ServiceConfig {
    api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from the process environment.
    ///
    /// - `OPENAI_API_KEY` (required)
    /// - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `PASSPORT_MODEL` (default `gpt-4o`)
    /// - `PASSPORT_TIMEOUT_SECS` (default 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(model) = get("PASSPORT_MODEL") {
            config.model = model.trim().to_string();
        }
        if let Some(secs) = get("PASSPORT_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&secs)?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expose the API key. Only call this when building a request.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: "PASSPORT_TIMEOUT_SECS",
        reason: reason.to_string(),
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(env(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "https://generativelanguage.googleapis.com/v1beta/openai"),
            ("PASSPORT_MODEL", "gemini-2.5-flash"),
            ("PASSPORT_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.base_url.contains("googleapis"));
    }

    #[test]
    fn test_missing_or_blank_key() {
        let err = ServiceConfig::from_lookup(env(&[])).unwrap_err();
        assert_eq!(err.to_string(), "OPENAI_API_KEY must be set");

        let err = ServiceConfig::from_lookup(env(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
    }

    #[test]
    fn test_invalid_timeout() {
        for raw in ["soon", "0", "-5"] {
            let err = ServiceConfig::from_lookup(env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("PASSPORT_TIMEOUT_SECS", raw),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "PASSPORT_TIMEOUT_SECS", .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ServiceConfig::new("sk-live-123");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-live-123"));
    }
}
