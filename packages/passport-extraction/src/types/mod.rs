//! Data types shared by ingestion, the orchestrator and the presentation layer.

pub mod image;
pub mod passport;
pub mod state;

pub use image::{EncodedImage, RawImage};
pub use passport::PassportData;
pub use state::{Generation, Snapshot, StateKind, WorkflowState};
