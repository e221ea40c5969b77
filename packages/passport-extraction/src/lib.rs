//! Passport Data Extraction
//!
//! Turns a passport image into structured fields using a remote multimodal
//! service, and reduces the asynchronous outcome to one workflow state the UI
//! can render: idle, ready, extracting, succeeded or failed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use passport_extraction::{ExtractionOrchestrator, RawImage, ServiceConfig};
//! use passport_extraction::ai::OpenAiExtractionService;
//!
//! let config = ServiceConfig::from_env()?;
//! let service = OpenAiExtractionService::from_config(&config)?;
//! let orchestrator = ExtractionOrchestrator::new(service);
//!
//! orchestrator.on_image_selected(RawImage::from_path("passport.jpg")).await;
//! orchestrator.extract().await?;
//!
//! if let Some(record) = orchestrator.state().record() {
//!     println!("{}", record.passport_number);
//! }
//! ```
//!
//! # Modules
//!
//! - [`ingestion`] - Raw file to data URL
//! - [`orchestrator`] - The workflow state machine
//! - [`traits`] - The `ExtractionService` seam
//! - [`types`] - Images, the passport record, workflow state
//! - [`ai`] - OpenAI-compatible service (feature `openai`)
//! - [`config`] - Environment configuration
//! - [`testing`] - Mock service for tests

pub mod config;
pub mod error;
pub mod ingestion;
pub mod orchestrator;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

pub use config::ServiceConfig;
pub use error::{ConfigError, ExtractionError, IngestionError, PreconditionError, ServiceErrorKind};
pub use ingestion::ingest;
pub use orchestrator::{ExtractOutcome, ExtractionOrchestrator, FAILURE_PREFIX};
pub use traits::ExtractionService;
pub use types::{
    EncodedImage, Generation, PassportData, RawImage, Snapshot, StateKind, WorkflowState,
};
