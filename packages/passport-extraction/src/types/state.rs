//! Workflow state observed by the presentation layer.

use std::fmt;

use super::{image::EncodedImage, passport::PassportData};

/// Tag identifying which state instance an operation was issued under.
///
/// Advanced by every image selection, clear, and extraction start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exactly one of these holds at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    /// No image selected
    #[default]
    Idle,
    /// Image selected, not yet extracted
    Ready { image: EncodedImage },
    /// Request in flight
    Extracting { image: EncodedImage },
    /// Record received and validated
    Succeeded {
        image: EncodedImage,
        record: PassportData,
    },
    /// Ingestion or extraction failed
    Failed { message: String },
}

impl WorkflowState {
    pub fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Idle => StateKind::Idle,
            WorkflowState::Ready { .. } => StateKind::Ready,
            WorkflowState::Extracting { .. } => StateKind::Extracting,
            WorkflowState::Succeeded { .. } => StateKind::Succeeded,
            WorkflowState::Failed { .. } => StateKind::Failed,
        }
    }

    /// Image to preview, if any.
    pub fn image(&self) -> Option<&EncodedImage> {
        match self {
            WorkflowState::Ready { image }
            | WorkflowState::Extracting { image }
            | WorkflowState::Succeeded { image, .. } => Some(image),
            WorkflowState::Idle | WorkflowState::Failed { .. } => None,
        }
    }

    pub fn record(&self) -> Option<&PassportData> {
        match self {
            WorkflowState::Succeeded { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkflowState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_extracting(&self) -> bool {
        matches!(self, WorkflowState::Extracting { .. })
    }
}

/// Payload-free discriminant of [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Ready,
    Extracting,
    Succeeded,
    Failed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Idle => "idle",
            StateKind::Ready => "ready",
            StateKind::Extracting => "extracting",
            StateKind::Succeeded => "succeeded",
            StateKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What observers receive: the state plus the generation it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: Generation,
    pub state: WorkflowState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_follow_variant() {
        let image = EncodedImage::encode("image/png", b"png");

        let ready = WorkflowState::Ready { image: image.clone() };
        assert_eq!(ready.kind(), StateKind::Ready);
        assert_eq!(ready.image(), Some(&image));
        assert!(ready.record().is_none());

        let failed = WorkflowState::Failed {
            message: "extraction failed: boom".into(),
        };
        assert!(failed.image().is_none());
        assert_eq!(failed.error(), Some("extraction failed: boom"));

        let done = WorkflowState::Succeeded {
            image,
            record: PassportData::default(),
        };
        assert!(done.record().is_some());
        assert!(!done.is_extracting());
    }

    #[test]
    fn test_generation_advances() {
        let g = Generation::default();
        assert_eq!(g.value(), 0);
        assert!(g.next() > g);
        assert_eq!(g.next().next().to_string(), "2");
    }

    #[test]
    fn test_default_snapshot_is_idle() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.state, WorkflowState::Idle);
        assert_eq!(snapshot.generation.value(), 0);
    }
}
