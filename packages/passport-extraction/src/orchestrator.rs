//! The extraction workflow state machine.
//!
//! ```text
//! Idle --image ok--> Ready --extract--> Extracting --ok--> Succeeded
//!   \--image err--> Failed                    \--err--> Failed
//! any --clear--> Idle        Ready|Succeeded|Failed --image--> Ready|Failed
//! ```
//!
//! State lives in a `watch` channel. Every change is a read-modify-write
//! under the channel lock and no lock is held across an await. Extraction
//! results carry the generation they were issued under and are dropped if
//! the workflow has moved on by the time they arrive.

use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, PreconditionError};
use crate::ingestion::ingest;
use crate::traits::ExtractionService;
use crate::types::{
    EncodedImage, Generation, PassportData, RawImage, Snapshot, StateKind, WorkflowState,
};

/// Prefix of every extraction failure message.
pub const FAILURE_PREFIX: &str = "extraction failed";

/// Used when the underlying error carries no message.
pub const UNKNOWN_ERROR: &str = "an unknown error occurred";

/// How a call to [`ExtractionOrchestrator::extract`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// State moved to `Succeeded`
    Succeeded,
    /// State moved to `Failed`
    Failed,
    /// Another extraction was already in flight; nothing was sent
    AlreadyInFlight,
    /// The result arrived after a clear or a new image and was dropped
    Superseded,
}

/// Owns the workflow state and drives it from user actions.
pub struct ExtractionOrchestrator<S> {
    service: S,
    snapshot: watch::Sender<Snapshot>,
}

impl<S: ExtractionService> ExtractionOrchestrator<S> {
    /// Start a session in `Idle`.
    pub fn new(service: S) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self { service, snapshot }
    }

    /// Ingest a newly selected file.
    ///
    /// Replaces whatever was there before: a new image always supersedes a
    /// previous record, error, or in-flight extraction.
    pub async fn on_image_selected(&self, file: RawImage) -> StateKind {
        let media_type = file.media_type().to_string();

        match ingest(file).await {
            Ok(image) => {
                let generation = self.replace(WorkflowState::Ready { image });
                info!(generation = %generation, media_type = %media_type, "Image ready");
                StateKind::Ready
            }
            Err(e) => {
                warn!(error = %e, media_type = %media_type, "Image ingestion failed");
                self.replace(WorkflowState::Failed {
                    message: e.to_string(),
                });
                StateKind::Failed
            }
        }
    }

    /// Reset to `Idle`, discarding image, record and error.
    ///
    /// An extraction still in flight is not aborted; its result is dropped.
    pub fn clear(&self) {
        let mut cleared = None;
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.state == WorkflowState::Idle {
                return false;
            }
            snapshot.generation = snapshot.generation.next();
            snapshot.state = WorkflowState::Idle;
            cleared = Some(snapshot.generation);
            true
        });

        if let Some(generation) = cleared {
            debug!(generation = %generation, "Workflow cleared");
        }
    }

    /// Send the current image to the extraction service, once.
    ///
    /// Only valid in `Ready`. While `Extracting` the call is ignored. In any
    /// other state nothing is sent and the state is left alone.
    pub async fn extract(&self) -> Result<ExtractOutcome, PreconditionError> {
        let Some((generation, image)) = self.begin_extraction()? else {
            debug!("Extraction already in flight, ignoring");
            return Ok(ExtractOutcome::AlreadyInFlight);
        };

        info!(
            generation = %generation,
            media_type = %image.media_type(),
            encoded_len = image.len(),
            "Extraction started"
        );
        let start = Instant::now();

        let result = self
            .service
            .extract(&image)
            .await
            .and_then(PassportData::from_value);

        let duration_ms = start.elapsed().as_millis();
        let next = match result {
            Ok(record) => WorkflowState::Succeeded { image, record },
            Err(e) => {
                warn!(generation = %generation, error = %e, duration_ms, "Extraction failed");
                WorkflowState::Failed {
                    message: failure_message(&e),
                }
            }
        };

        let kind = next.kind();
        if !self.settle(generation, next) {
            debug!(
                generation = %generation,
                current = %self.generation(),
                "Discarding superseded extraction result"
            );
            return Ok(ExtractOutcome::Superseded);
        }

        info!(generation = %generation, state = %kind, duration_ms, "Extraction finished");
        Ok(match kind {
            StateKind::Succeeded => ExtractOutcome::Succeeded,
            _ => ExtractOutcome::Failed,
        })
    }

    /// Current state.
    pub fn state(&self) -> WorkflowState {
        self.snapshot.borrow().state.clone()
    }

    /// Current state and its generation.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn generation(&self) -> Generation {
        self.snapshot.borrow().generation
    }

    /// Watch state changes. Receivers can only read.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn replace(&self, state: WorkflowState) -> Generation {
        let mut generation = Generation::default();
        self.snapshot.send_modify(|snapshot| {
            snapshot.generation = snapshot.generation.next();
            snapshot.state = state;
            generation = snapshot.generation;
        });
        generation
    }

    /// `Ready` → `Extracting` under a fresh generation.
    ///
    /// `Ok(None)` means an extraction is already in flight.
    fn begin_extraction(&self) -> Result<Option<(Generation, EncodedImage)>, PreconditionError> {
        let mut ticket = Ok(None);
        self.snapshot.send_if_modified(|snapshot| match &snapshot.state {
            WorkflowState::Ready { image } => {
                let image = image.clone();
                snapshot.generation = snapshot.generation.next();
                ticket = Ok(Some((snapshot.generation, image.clone())));
                snapshot.state = WorkflowState::Extracting { image };
                true
            }
            WorkflowState::Extracting { .. } => false,
            WorkflowState::Idle | WorkflowState::Failed { .. } => {
                ticket = Err(PreconditionError::NoImage);
                false
            }
            WorkflowState::Succeeded { .. } => {
                ticket = Err(PreconditionError::NotReady {
                    state: StateKind::Succeeded,
                });
                false
            }
        });
        ticket
    }

    /// Apply an extraction result if its generation is still current.
    fn settle(&self, generation: Generation, next: WorkflowState) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.generation != generation || !snapshot.state.is_extracting() {
                return false;
            }
            snapshot.state = next;
            true
        })
    }
}

/// `"extraction failed: <detail>"`, with a generic detail when there is none.
pub fn failure_message(err: &ExtractionError) -> String {
    format!(
        "{}: {}",
        FAILURE_PREFIX,
        err.message().unwrap_or(UNKNOWN_ERROR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceErrorKind;
    use crate::testing::{sample_record, MockExtractionService};

    fn png() -> RawImage {
        RawImage::from_bytes(b"\x89PNG\r\n\x1a\n".to_vec(), "image/png")
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let orchestrator = ExtractionOrchestrator::new(MockExtractionService::new());
        assert_eq!(orchestrator.state(), WorkflowState::Idle);
        assert_eq!(orchestrator.generation().value(), 0);
    }

    #[tokio::test]
    async fn test_select_then_extract_succeeds() {
        let service = MockExtractionService::new().with_record(&sample_record());
        let orchestrator = ExtractionOrchestrator::new(service.clone());

        assert_eq!(orchestrator.on_image_selected(png()).await, StateKind::Ready);
        assert_eq!(orchestrator.extract().await, Ok(ExtractOutcome::Succeeded));

        assert_eq!(orchestrator.state().record(), Some(&sample_record()));
        assert_eq!(service.call_count(), 1);
        assert!(service.calls()[0].as_str().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_extract_without_image_is_precondition_error() {
        let service = MockExtractionService::new();
        let orchestrator = ExtractionOrchestrator::new(service.clone());

        assert_eq!(orchestrator.extract().await, Err(PreconditionError::NoImage));
        assert_eq!(orchestrator.snapshot(), Snapshot::default());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_after_success_requires_new_image() {
        let service = MockExtractionService::new();
        let orchestrator = ExtractionOrchestrator::new(service.clone());
        orchestrator.on_image_selected(png()).await;
        orchestrator.extract().await.unwrap();
        let before = orchestrator.snapshot();

        assert_eq!(
            orchestrator.extract().await,
            Err(PreconditionError::NotReady {
                state: StateKind::Succeeded
            })
        );
        assert_eq!(orchestrator.snapshot(), before);
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extract_after_failure_has_no_image() {
        let service = MockExtractionService::new()
            .with_error(ExtractionError::service(ServiceErrorKind::Internal, "boom"));
        let orchestrator = ExtractionOrchestrator::new(service.clone());
        orchestrator.on_image_selected(png()).await;
        assert_eq!(orchestrator.extract().await, Ok(ExtractOutcome::Failed));

        assert_eq!(orchestrator.extract().await, Err(PreconditionError::NoImage));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_on_idle_is_noop() {
        let orchestrator = ExtractionOrchestrator::new(MockExtractionService::new());
        orchestrator.clear();
        orchestrator.clear();
        assert_eq!(orchestrator.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn test_ingestion_failure_becomes_failed_state() {
        let orchestrator = ExtractionOrchestrator::new(MockExtractionService::new());
        let state = orchestrator
            .on_image_selected(RawImage::from_bytes(b"%PDF-1.7".to_vec(), "application/pdf"))
            .await;

        assert_eq!(state, StateKind::Failed);
        let message = orchestrator.state().error().map(str::to_string).unwrap();
        assert!(message.contains("application/pdf"), "got {message}");
    }

    #[tokio::test]
    async fn test_read_error_becomes_failed_state() {
        let service = MockExtractionService::new();
        let orchestrator = ExtractionOrchestrator::new(service.clone());
        let reader = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "upload aborted",
            ))
            .build();

        let state = orchestrator
            .on_image_selected(RawImage::from_reader(reader, "image/jpeg"))
            .await;

        assert_eq!(state, StateKind::Failed);
        let message = orchestrator.state().error().map(str::to_string).unwrap();
        assert!(message.contains("failed to read image"), "got {message}");
        assert!(message.contains("upload aborted"), "got {message}");
        assert_eq!(orchestrator.extract().await, Err(PreconditionError::NoImage));
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn test_failure_message() {
        let err = ExtractionError::service(ServiceErrorKind::RateLimited, "rate limit exceeded");
        assert_eq!(failure_message(&err), "extraction failed: rate limit exceeded");

        let err = ExtractionError::Service {
            kind: ServiceErrorKind::Network,
            message: None,
        };
        assert_eq!(
            failure_message(&err),
            "extraction failed: an unknown error occurred"
        );
    }
}
