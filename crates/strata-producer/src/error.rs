//! Error types for the producer.

use strata_consumer::ConsumerError;
use strata_core::{BlobKind, CoreError, Version};

use crate::validation::ValidationError;

/// Failures that abort a cycle.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    /// The user populator raised.
    #[error("populator failed: {0}")]
    Populate(#[source] anyhow::Error),

    /// Staging or publishing a blob failed.
    #[error("blob staging or publication failed: {0}")]
    Publish(#[source] anyhow::Error),

    /// Reading staged artifacts back during the integrity check failed.
    #[error("integrity round trip failed: {0}")]
    Integrity(#[from] CoreError),

    /// A staged delta did not reproduce the adjacent state's checksum.
    #[error("{kind} checksum invalid")]
    ChecksumValidation {
        /// The artifact whose round trip failed.
        kind: BlobKind,
    },

    /// One or more validators rejected the pending state.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The announcer raised; consumers never saw the version.
    #[error("announcement failed: {0}")]
    Announce(#[source] anyhow::Error),
}

/// Failures of the restore procedure.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The blob store could not reach the requested version.
    #[error("restore reached version {reached}, requested {desired}")]
    VersionMismatch {
        /// The version the caller asked for.
        desired: Version,
        /// The version the transient consumer actually reached.
        reached: Version,
    },

    /// The transient consumer refresh failed.
    #[error("restore refresh failed: {0}")]
    Refresh(#[from] ConsumerError),

    /// Rehydrating the fresh write engine failed.
    #[error("write engine rehydration failed: {0}")]
    Rehydrate(#[from] CoreError),
}
