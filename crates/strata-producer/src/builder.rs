//! Fluent builder for [`Producer`] construction.

use std::path::PathBuf;
use std::sync::Arc;

use strata_core::write::DEFAULT_TARGET_MAX_TYPE_SHARD_SIZE;

use crate::blob::{BlobCompressor, BlobStager, FilesystemBlobStager, NoCompression};
use crate::executor::{InlineSnapshotExecutor, SnapshotExecutor};
use crate::listener::{ListenerSupport, ProducerListener};
use crate::producer::{Announcer, Producer, ProducerParts, Publisher};
use crate::validation::Validator;
use crate::version::{VersionMinter, WallClockVersionMinter};

/// Construction-time configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No publisher was supplied.
    #[error("a publisher is required")]
    MissingPublisher,

    /// No announcer was supplied.
    #[error("an announcer is required")]
    MissingAnnouncer,

    /// A custom stager conflicts with compressor/staging-dir options.
    #[error("supply either a blob stager or compressor/staging-dir options, not both")]
    ConflictingStagerOptions,
}

/// Fluent builder for a [`Producer`].
///
/// # Example
///
/// ```rust,ignore
/// let producer = Producer::builder()
///     .publisher(publisher)
///     .announcer(announcer)
///     .validator(count_validator)
///     .num_states_between_snapshots(4)
///     .build()?;
/// ```
pub struct ProducerBuilder {
    stager: Option<Box<dyn BlobStager>>,
    compressor: Option<Arc<dyn BlobCompressor>>,
    staging_dir: Option<PathBuf>,
    publisher: Option<Arc<dyn Publisher>>,
    announcer: Option<Box<dyn Announcer>>,
    validators: Vec<Box<dyn Validator>>,
    listeners: Vec<Arc<dyn ProducerListener>>,
    version_minter: Option<Box<dyn VersionMinter>>,
    snapshot_executor: Option<Arc<dyn SnapshotExecutor>>,
    num_states_between_snapshots: u32,
    target_max_type_shard_size: u64,
}

impl ProducerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stager: None,
            compressor: None,
            staging_dir: None,
            publisher: None,
            announcer: None,
            validators: Vec::new(),
            listeners: Vec::new(),
            version_minter: None,
            snapshot_executor: None,
            num_states_between_snapshots: 0,
            target_max_type_shard_size: DEFAULT_TARGET_MAX_TYPE_SHARD_SIZE,
        }
    }

    /// Sets the blob publisher (required).
    #[must_use]
    pub fn publisher(mut self, publisher: impl Publisher + 'static) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    /// Sets the version announcer (required).
    #[must_use]
    pub fn announcer(mut self, announcer: impl Announcer + 'static) -> Self {
        self.announcer = Some(Box::new(announcer));
        self
    }

    /// Adds a validator; validators run in registration order.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Adds a lifecycle listener.
    #[must_use]
    pub fn listener(mut self, listener: impl ProducerListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Supplies a custom blob stager.
    ///
    /// Mutually exclusive with [`blob_compressor`](Self::blob_compressor)
    /// and [`blob_staging_dir`](Self::blob_staging_dir).
    #[must_use]
    pub fn blob_stager(mut self, stager: impl BlobStager + 'static) -> Self {
        self.stager = Some(Box::new(stager));
        self
    }

    /// Sets the compressor the default filesystem stager wraps streams with.
    #[must_use]
    pub fn blob_compressor(mut self, compressor: impl BlobCompressor + 'static) -> Self {
        self.compressor = Some(Arc::new(compressor));
        self
    }

    /// Sets the staging directory of the default filesystem stager.
    #[must_use]
    pub fn blob_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Sets the version minter; defaults to [`WallClockVersionMinter`].
    #[must_use]
    pub fn version_minter(mut self, minter: impl VersionMinter + 'static) -> Self {
        self.version_minter = Some(Box::new(minter));
        self
    }

    /// Sets the executor for deferred snapshot publication; defaults to
    /// inline.
    #[must_use]
    pub fn snapshot_publish_executor(
        mut self,
        executor: impl SnapshotExecutor + 'static,
    ) -> Self {
        self.snapshot_executor = Some(Arc::new(executor));
        self
    }

    /// Sets the snapshot cadence: `0` publishes a snapshot synchronously
    /// every cycle; `k ≥ 1` defers publication to the snapshot executor
    /// every `k + 1` producing cycles.
    #[must_use]
    pub fn num_states_between_snapshots(mut self, count: u32) -> Self {
        self.num_states_between_snapshots = count;
        self
    }

    /// Sets the write engine's type-shard sizing hint in bytes.
    #[must_use]
    pub fn target_max_type_shard_size(mut self, bytes: u64) -> Self {
        self.target_max_type_shard_size = bytes;
        self
    }

    /// Builds the producer.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when required options are missing or the
    /// stager options conflict.
    pub fn build(self) -> Result<Producer, BuildError> {
        let publisher = self.publisher.ok_or(BuildError::MissingPublisher)?;
        let announcer = self.announcer.ok_or(BuildError::MissingAnnouncer)?;

        if self.stager.is_some() && (self.compressor.is_some() || self.staging_dir.is_some()) {
            return Err(BuildError::ConflictingStagerOptions);
        }
        let stager = match self.stager {
            Some(stager) => stager,
            None => {
                let compressor = self
                    .compressor
                    .unwrap_or_else(|| Arc::new(NoCompression));
                let staging_dir = self.staging_dir.unwrap_or_else(std::env::temp_dir);
                Box::new(FilesystemBlobStager::new(staging_dir, compressor))
            }
        };

        let listeners = Arc::new(ListenerSupport::new());
        for listener in self.listeners {
            listeners.add(listener);
        }

        Ok(Producer::from_parts(ProducerParts {
            stager,
            publisher,
            announcer,
            validators: self.validators,
            listeners,
            version_minter: self
                .version_minter
                .unwrap_or_else(|| Box::new(WallClockVersionMinter::new())),
            snapshot_executor: self
                .snapshot_executor
                .unwrap_or_else(|| Arc::new(InlineSnapshotExecutor)),
            num_states_between_snapshots: self.num_states_between_snapshots,
            target_max_type_shard_size: self.target_max_type_shard_size,
        }))
    }
}

impl Default for ProducerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProducerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerBuilder")
            .field("validators", &self.validators.len())
            .field("listeners", &self.listeners.len())
            .field(
                "num_states_between_snapshots",
                &self.num_states_between_snapshots,
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Blob;
    use strata_core::Version;

    struct NullPublisher;
    impl Publisher for NullPublisher {
        fn publish(&self, _blob: &Blob) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NullAnnouncer;
    impl Announcer for NullAnnouncer {
        fn announce(&self, _version: Version) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_publisher_is_an_error() {
        let result = ProducerBuilder::new().announcer(NullAnnouncer).build();
        assert!(matches!(result, Err(BuildError::MissingPublisher)));
    }

    #[test]
    fn test_missing_announcer_is_an_error() {
        let result = ProducerBuilder::new().publisher(NullPublisher).build();
        assert!(matches!(result, Err(BuildError::MissingAnnouncer)));
    }

    #[test]
    fn test_stager_conflicts_with_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stager = FilesystemBlobStager::new(dir.path(), Arc::new(NoCompression));
        let result = ProducerBuilder::new()
            .publisher(NullPublisher)
            .announcer(NullAnnouncer)
            .blob_stager(stager)
            .blob_staging_dir(dir.path())
            .build();
        assert!(matches!(result, Err(BuildError::ConflictingStagerOptions)));
    }

    #[test]
    fn test_minimal_build_succeeds() {
        let producer = ProducerBuilder::new()
            .publisher(NullPublisher)
            .announcer(NullAnnouncer)
            .build()
            .unwrap();
        assert_eq!(producer.current_version(), strata_core::NO_VERSION);
    }
}
