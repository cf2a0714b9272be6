//! Dataset refresh to a desired version.

use std::sync::Arc;

use strata_core::{BlobReader, CoreError, ReadStateEngine, Version, NO_VERSION};
use tracing::{debug, info};

use crate::retriever::BlobRetriever;

/// Errors from consumer refresh.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// No snapshot exists at or before the desired version.
    #[error("no snapshot available at or before version {0}")]
    NoSnapshot(Version),

    /// Blob decoding failed.
    #[error("blob decode failed: {0}")]
    Blob(#[from] CoreError),
}

/// Materializes a dataset and advances it through the version chain.
pub struct Consumer {
    retriever: Arc<dyn BlobRetriever>,
    current_version: Version,
    engine: ReadStateEngine,
}

impl Consumer {
    /// Creates a cold consumer over the given retriever.
    #[must_use]
    pub fn with_blob_retriever(retriever: Arc<dyn BlobRetriever>) -> Self {
        Self {
            retriever,
            current_version: NO_VERSION,
            engine: ReadStateEngine::new(),
        }
    }

    /// The version currently materialized; [`NO_VERSION`] when cold.
    #[must_use]
    pub fn current_version(&self) -> Version {
        self.current_version
    }

    /// The materialized read engine.
    #[must_use]
    pub fn engine(&self) -> &ReadStateEngine {
        &self.engine
    }

    /// Consumes the consumer, returning its version and engine.
    #[must_use]
    pub fn into_parts(self) -> (Version, ReadStateEngine) {
        (self.current_version, self.engine)
    }

    /// Refreshes toward `desired`: a cold consumer loads the nearest
    /// snapshot first, then forward deltas are applied while they advance
    /// the state toward `desired`.
    ///
    /// Stops cleanly at the head of the published chain; the caller checks
    /// [`current_version`](Self::current_version) to see how far the refresh
    /// got.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::NoSnapshot`] when cold with no reachable
    /// snapshot, or [`ConsumerError::Blob`] on a decode failure.
    pub fn refresh_to(&mut self, desired: Version) -> Result<(), ConsumerError> {
        if self.current_version == NO_VERSION {
            let blob = self
                .retriever
                .retrieve_snapshot(desired)
                .ok_or(ConsumerError::NoSnapshot(desired))?;
            let mut engine = ReadStateEngine::new();
            BlobReader::new(&mut engine).read_snapshot(&mut blob.bytes.as_slice())?;
            debug!(version = blob.to_version, "snapshot materialized");
            self.engine = engine;
            self.current_version = blob.to_version;
        }

        while self.current_version < desired {
            let Some(delta) = self.retriever.retrieve_delta(self.current_version) else {
                break;
            };
            // A delta that does not advance the version would loop forever.
            if delta.to_version <= self.current_version {
                tracing::warn!(
                    from = delta.from_version,
                    to = delta.to_version,
                    "retriever returned a non-advancing delta; stopping refresh"
                );
                break;
            }
            BlobReader::new(&mut self.engine).apply_delta(&mut delta.bytes.as_slice())?;
            debug!(
                from = delta.from_version,
                to = delta.to_version,
                "delta applied"
            );
            self.current_version = delta.to_version;
        }

        info!(
            desired,
            reached = self.current_version,
            "consumer refresh complete"
        );
        Ok(())
    }
}
