//! Testing utilities including a mock extraction service.
//!
//! Useful for exercising the workflow without network calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::ExtractionError;
use crate::traits::ExtractionService;
use crate::types::{EncodedImage, PassportData};

/// A fully populated record for tests and demos.
pub fn sample_record() -> PassportData {
    PassportData {
        name: "JANE DOE".to_string(),
        passport_number: "X1234567".to_string(),
        nationality: "CANADIAN".to_string(),
        date_of_birth: "01 JAN 1990".to_string(),
        place_of_birth: "TORONTO".to_string(),
        sex: "F".to_string(),
        date_of_issue: "15 MAR 2020".to_string(),
        date_of_expiry: "15 MAR 2030".to_string(),
        issuing_country: "CAN".to_string(),
    }
}

/// A mock [`ExtractionService`].
///
/// Returns queued responses in order, then [`sample_record`] once the queue
/// is empty. Clones share the queue and the call log, so a test can keep a
/// handle after moving one into the orchestrator.
#[derive(Clone, Default)]
pub struct MockExtractionService {
    responses: Arc<Mutex<VecDeque<Result<Value, ExtractionError>>>>,
    calls: Arc<Mutex<Vec<EncodedImage>>>,
    gate: Option<Arc<Notify>>,
}

/// Releases calls held by a gated [`MockExtractionService`], one per `release`.
#[derive(Clone)]
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

impl MockExtractionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw payload (valid or not).
    pub fn with_payload(self, payload: Value) -> Self {
        lock(&self.responses).push_back(Ok(payload));
        self
    }

    /// Queue a well-formed record.
    pub fn with_record(self, record: &PassportData) -> Self {
        let payload = serde_json::to_value(record).unwrap_or_default();
        self.with_payload(payload)
    }

    /// Queue a failure.
    pub fn with_error(self, error: ExtractionError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Hold every call until the returned gate is released.
    pub fn gated(mut self) -> (Self, Gate) {
        let notify = Arc::new(Notify::new());
        self.gate = Some(notify.clone());
        (self, Gate(notify))
    }

    /// Images the service was called with, in order.
    pub fn calls(&self) -> Vec<EncodedImage> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl ExtractionService for MockExtractionService {
    async fn extract(&self, image: &EncodedImage) -> Result<Value, ExtractionError> {
        lock(&self.calls).push(image.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let queued = lock(&self.responses).pop_front();
        queued.unwrap_or_else(|| {
            serde_json::to_value(sample_record())
                .map_err(|e| ExtractionError::Schema(e.to_string()))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
