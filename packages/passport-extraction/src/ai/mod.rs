//! Provider-backed extraction services.

pub mod openai;

pub use openai::OpenAiExtractionService;
