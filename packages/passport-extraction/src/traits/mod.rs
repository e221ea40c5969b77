//! Trait seams for external collaborators.

pub mod service;

pub use service::ExtractionService;
