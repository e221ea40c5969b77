//! Typed errors for the passport extraction workflow.
//!
//! Ingestion and extraction failures are recovered by the orchestrator and
//! turned into a `Failed` state. Precondition errors are returned to the
//! caller because a correctly wired UI never triggers them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::state::StateKind;

/// Reading or validating the selected file failed.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Declared media type is not `image/*`
    #[error("unsupported media type: {media_type} (expected an image)")]
    UnsupportedMediaType { media_type: String },

    /// File had no content
    #[error("image file is empty")]
    Empty,

    /// I/O failure on the underlying handle
    #[error("failed to read image{}: {source}", display_path(.path))]
    Read {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

/// Broad category of a remote service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection failed, timed out, or the body could not be read
    Network,
    /// The service is throttling requests
    RateLimited,
    /// The service rejected the image or request
    InvalidInput,
    /// Credentials missing or rejected
    Unauthorized,
    /// Server-side failure or an unexpected reply
    Internal,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceErrorKind::Network => "network",
            ServiceErrorKind::RateLimited => "rate limited",
            ServiceErrorKind::InvalidInput => "invalid input",
            ServiceErrorKind::Unauthorized => "unauthorized",
            ServiceErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

fn display_message(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// The extraction call failed or returned something we cannot trust.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Remote call failed (network, rate limit, server-side failure)
    #[error("{kind} service error{}", display_message(.message))]
    Service {
        kind: ServiceErrorKind,
        message: Option<String>,
    },

    /// Call succeeded but the payload violates the passport schema
    #[error("response does not match the passport schema: {0}")]
    Schema(String),
}

impl ExtractionError {
    pub fn service(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        ExtractionError::Service {
            kind,
            message: Some(message.into()),
        }
    }

    /// Human-readable detail, if the failure carries one.
    pub fn message(&self) -> Option<&str> {
        let message = match self {
            ExtractionError::Service { message, .. } => message.as_deref(),
            ExtractionError::Schema(detail) => Some(detail.as_str()),
        };
        message.map(str::trim).filter(|m| !m.is_empty())
    }
}

/// `extract()` was called without a ready image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no image available")]
    NoImage,

    #[error("extraction requires a ready image (current state: {state})")]
    NotReady { state: StateKind },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
