//! Lifecycle statuses delivered to listeners.

use strata_core::{BlobKind, Version};

/// Terminal outcome of a lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The step completed.
    Success,
    /// The step failed.
    Fail,
}

/// Outcome of a cycle or one of its phases.
#[derive(Debug, Clone)]
pub struct ProducerStatus {
    /// The version the cycle is producing.
    pub version: Version,
    /// Terminal outcome.
    pub status: Status,
    /// Failure rendering, when failed.
    pub error: Option<String>,
}

impl ProducerStatus {
    pub(crate) fn success(version: Version) -> Self {
        Self {
            version,
            status: Status::Success,
            error: None,
        }
    }

    pub(crate) fn fail(version: Version, error: &dyn std::fmt::Display) -> Self {
        Self {
            version,
            status: Status::Fail,
            error: Some(error.to_string()),
        }
    }

    /// Whether the step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Outcome of publishing one blob artifact.
#[derive(Debug, Clone)]
pub struct PublishStatus {
    /// The artifact's kind.
    pub kind: BlobKind,
    /// Source version of the artifact.
    pub from_version: Version,
    /// Destination version of the artifact.
    pub to_version: Version,
    /// Terminal outcome.
    pub status: Status,
    /// Failure rendering, when failed.
    pub error: Option<String>,
}

impl PublishStatus {
    pub(crate) fn success(kind: BlobKind, from_version: Version, to_version: Version) -> Self {
        Self {
            kind,
            from_version,
            to_version,
            status: Status::Success,
            error: None,
        }
    }

    pub(crate) fn fail(
        kind: BlobKind,
        from_version: Version,
        to_version: Version,
        error: &dyn std::fmt::Display,
    ) -> Self {
        Self {
            kind,
            from_version,
            to_version,
            status: Status::Fail,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of a restore attempt.
#[derive(Debug, Clone)]
pub struct RestoreStatus {
    /// The version the caller asked for.
    pub desired: Version,
    /// The version actually reached.
    pub reached: Version,
    /// Terminal outcome.
    pub status: Status,
    /// Failure rendering, when failed.
    pub error: Option<String>,
}

impl RestoreStatus {
    pub(crate) fn success(desired: Version, reached: Version) -> Self {
        Self {
            desired,
            reached,
            status: Status::Success,
            error: None,
        }
    }

    pub(crate) fn fail(
        desired: Version,
        reached: Version,
        error: &dyn std::fmt::Display,
    ) -> Self {
        Self {
            desired,
            reached,
            status: Status::Fail,
            error: Some(error.to_string()),
        }
    }
}
