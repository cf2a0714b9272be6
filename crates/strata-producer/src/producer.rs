//! The producer cycle engine.
//!
//! ## Cycle
//!
//! 1. Mint — obtain `to_version`; a cold producer announces a new delta chain
//! 2. Prepare — rotate the write engine, bind a [`WriteState`]
//! 3. Populate — user code fills the write state
//! 4. Diff test — an unchanged engine short-circuits to a no-delta outcome
//! 5. Publish — stage snapshot (+ delta / reverse delta), publish deltas
//!    synchronously, snapshot per cadence
//! 6. Integrity — round-trip the staged deltas through private read-engine
//!    copies and compare common-schema checksums
//! 7. Validate — run every validator, aggregate failures
//! 8. Announce — expose the version to consumers
//! 9. Commit — rotate the read-state holder
//!
//! Any failure from step 2 on resets the write engine, leaves the committed
//! read-state holder untouched, and releases staged blobs.

use std::sync::Arc;
use std::time::Instant;

use strata_consumer::{BlobRetriever, Consumer};
use strata_core::{
    BlobKind, BlobReader, CoreError, DataRecord, EngineChecksum, ObjectMapper, Record,
    RecordSchema, Version, NO_VERSION,
};
use tracing::{debug, error, info, warn};

use crate::artifacts::Artifacts;
use crate::blob::{Blob, BlobStager};
use crate::error::{ProducerError, RestoreError};
use crate::executor::SnapshotExecutor;
use crate::listener::{ListenerSupport, ProducerListener};
use crate::read_states::{ReadState, ReadStateHolder, Transition};
use crate::status::{ProducerStatus, PublishStatus, RestoreStatus};
use crate::validation::{ValidationError, Validator};
use crate::version::VersionMinter;

/// Persists a staged blob to the durable blob store.
pub trait Publisher: Send + Sync {
    /// Publishes the blob.
    ///
    /// # Errors
    ///
    /// Returns the publication failure; the cycle rolls back.
    fn publish(&self, blob: &Blob) -> anyhow::Result<()>;
}

/// Announces a newly published version so consumers refresh.
pub trait Announcer: Send {
    /// Announces the version.
    ///
    /// # Errors
    ///
    /// Returns the announcement failure; the cycle rolls back and consumers
    /// never see the version.
    fn announce(&self, version: Version) -> anyhow::Result<()>;
}

/// User code that fills the write state each cycle.
///
/// The populator re-adds the full dataset; records identical to the prior
/// cycle's keep their ordinals and produce no delta.
pub trait Populator {
    /// Populates the next state.
    ///
    /// # Errors
    ///
    /// Returns the population failure; the cycle rolls back.
    fn populate(&mut self, state: &mut WriteState<'_>) -> anyhow::Result<()>;
}

impl<F> Populator for F
where
    F: FnMut(&mut WriteState<'_>) -> anyhow::Result<()>,
{
    fn populate(&mut self, state: &mut WriteState<'_>) -> anyhow::Result<()> {
        self(state)
    }
}

/// The populator's mutable view of the next state.
pub struct WriteState<'a> {
    version: Version,
    mapper: &'a mut ObjectMapper,
    prior_state: Option<&'a ReadState>,
}

impl<'a> WriteState<'a> {
    /// The version being produced.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// The prior announced state, if any.
    #[must_use]
    pub fn prior_state(&self) -> Option<&ReadState> {
        self.prior_state
    }

    /// The object mapper backing this state.
    pub fn object_mapper(&mut self) -> &mut ObjectMapper {
        self.mapper
    }

    /// Adds a typed value; returns its ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on schema conflicts or encoding failure.
    pub fn add<T: DataRecord>(&mut self, value: &T) -> Result<u64, CoreError> {
        self.mapper.add(value)
    }

    /// Adds a raw record; returns its ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the type is unknown or the record does not
    /// conform.
    pub fn add_record(&mut self, type_name: &str, record: &Record) -> Result<u64, CoreError> {
        self.mapper.add_record(type_name, record)
    }
}

/// Terminal outcome of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A new version was announced and is now current.
    Produced(Version),
    /// The populator ran but nothing changed; no version was announced.
    NoChanges,
    /// The cycle failed and rolled back; the prior state remains current.
    Failed(ProducerError),
}

impl CycleOutcome {
    /// Whether the cycle announced a new version.
    #[must_use]
    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced(_))
    }
}

/// The staged blob handles one cycle works with.
struct StagedArtifacts {
    snapshot: Blob,
    deltas: Option<DeltaPair>,
}

/// Forward and reverse delta, staged together whenever a prior state exists.
struct DeltaPair {
    delta: Blob,
    reverse_delta: Blob,
}

pub(crate) struct ProducerParts {
    pub stager: Box<dyn BlobStager>,
    pub publisher: Arc<dyn Publisher>,
    pub announcer: Box<dyn Announcer>,
    pub validators: Vec<Box<dyn Validator>>,
    pub listeners: Arc<ListenerSupport>,
    pub version_minter: Box<dyn VersionMinter>,
    pub snapshot_executor: Arc<dyn SnapshotExecutor>,
    pub num_states_between_snapshots: u32,
    pub target_max_type_shard_size: u64,
}

/// The producer cycle engine.
///
/// `run_cycle` is not reentrant; callers serialize cycles externally.
pub struct Producer {
    stager: Box<dyn BlobStager>,
    publisher: Arc<dyn Publisher>,
    announcer: Box<dyn Announcer>,
    validators: Vec<Box<dyn Validator>>,
    listeners: Arc<ListenerSupport>,
    version_minter: Box<dyn VersionMinter>,
    snapshot_executor: Arc<dyn SnapshotExecutor>,
    num_states_between_snapshots: u32,
    num_states_until_next_snapshot: i64,
    mapper: ObjectMapper,
    read_states: ReadStateHolder,
    last_minted: Version,
}

impl Producer {
    /// Starts building a producer.
    #[must_use]
    pub fn builder() -> crate::builder::ProducerBuilder {
        crate::builder::ProducerBuilder::new()
    }

    pub(crate) fn from_parts(parts: ProducerParts) -> Self {
        let mut mapper = ObjectMapper::default();
        mapper
            .engine_mut()
            .set_target_max_type_shard_size(parts.target_max_type_shard_size);
        Self {
            stager: parts.stager,
            publisher: parts.publisher,
            announcer: parts.announcer,
            validators: parts.validators,
            listeners: parts.listeners,
            version_minter: parts.version_minter,
            snapshot_executor: parts.snapshot_executor,
            num_states_between_snapshots: parts.num_states_between_snapshots,
            num_states_until_next_snapshot: i64::from(parts.num_states_between_snapshots),
            mapper,
            read_states: ReadStateHolder::Empty,
            last_minted: NO_VERSION,
        }
    }

    /// Registers the dataset's record types up front.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] on a clashing registration.
    pub fn initialize_data_model(
        &mut self,
        schemas: impl IntoIterator<Item = RecordSchema>,
    ) -> Result<(), CoreError> {
        let started = Instant::now();
        for schema in schemas {
            self.mapper.engine_mut().register_type(schema)?;
        }
        let elapsed = started.elapsed();
        self.listeners.each(|l| l.on_producer_init(elapsed));
        Ok(())
    }

    /// Registers one typed record type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] on a clashing registration.
    pub fn initialize_type<T: DataRecord>(&mut self) -> Result<(), CoreError> {
        self.initialize_data_model([T::schema()])
    }

    /// Registers a lifecycle listener.
    pub fn add_listener(&self, listener: Arc<dyn ProducerListener>) {
        self.listeners.add(listener);
    }

    /// Removes a lifecycle listener.
    pub fn remove_listener(&self, listener: &Arc<dyn ProducerListener>) {
        self.listeners.remove(listener);
    }

    /// The currently announced read state, if any.
    #[must_use]
    pub fn current_read_state(&self) -> Option<&ReadState> {
        self.read_states.current()
    }

    /// The currently announced version, or [`NO_VERSION`].
    #[must_use]
    pub fn current_version(&self) -> Version {
        self.read_states
            .current()
            .map_or(NO_VERSION, ReadState::version)
    }

    /// The object mapper backing the write state.
    #[must_use]
    pub fn object_mapper(&self) -> &ObjectMapper {
        &self.mapper
    }

    /// Runs one cycle: prepares a write state, lets `populator` fill it, and
    /// publishes, proves, validates, announces, and commits the result.
    ///
    /// Returns the cycle outcome; non-validation failures are reported
    /// through the outcome and listeners rather than raised.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when one or more validators rejected the
    /// pending state.
    ///
    /// # Panics
    ///
    /// Panics if the configured version minter is not strictly ascending.
    pub fn run_cycle<P>(&mut self, populator: &mut P) -> Result<CycleOutcome, ValidationError>
    where
        P: Populator + ?Sized,
    {
        let to_version = self.version_minter.mint();
        assert!(
            to_version > self.last_minted,
            "version minter must be strictly ascending: minted {to_version} after {}",
            self.last_minted,
        );
        self.last_minted = to_version;

        if !self.read_states.has_current() {
            self.listeners.each(|l| l.on_new_delta_chain(to_version));
        }
        info!(version = to_version, "cycle start");
        let started = Instant::now();
        self.listeners.each(|l| l.on_cycle_start(to_version));

        let artifacts = Arc::new(Artifacts::new());
        let result = self.run_phases(populator, to_version, &artifacts);
        if result.is_err() {
            self.mapper
                .engine_mut()
                .reset_to_last_prepare_for_next_cycle();
        }
        artifacts.cleanup();

        let elapsed = started.elapsed();
        match result {
            Ok(outcome) => {
                let version = match &outcome {
                    CycleOutcome::Produced(v) => *v,
                    _ => to_version,
                };
                let status = ProducerStatus::success(version);
                self.listeners.each(|l| l.on_cycle_complete(&status, elapsed));
                info!(version, ?elapsed, "cycle complete");
                Ok(outcome)
            }
            Err(ProducerError::Validation(validation)) => {
                let status = ProducerStatus::fail(to_version, &validation);
                self.listeners.each(|l| l.on_cycle_complete(&status, elapsed));
                error!(version = to_version, error = %validation, "cycle failed");
                Err(validation)
            }
            Err(e) => {
                let status = ProducerStatus::fail(to_version, &e);
                self.listeners.each(|l| l.on_cycle_complete(&status, elapsed));
                error!(version = to_version, error = %e, "cycle failed");
                Ok(CycleOutcome::Failed(e))
            }
        }
    }

    fn run_phases<P>(
        &mut self,
        populator: &mut P,
        to_version: Version,
        artifacts: &Arc<Artifacts>,
    ) -> Result<CycleOutcome, ProducerError>
    where
        P: Populator + ?Sized,
    {
        self.mapper.engine_mut().prepare_for_next_cycle();
        self.populate(populator, to_version)?;

        if !self.mapper.engine().has_changed_since_last_cycle() {
            self.mapper
                .engine_mut()
                .reset_to_last_prepare_for_next_cycle();
            self.listeners.each(|l| l.on_no_delta(to_version));
            info!(version = to_version, "no changes since last cycle");
            return Ok(CycleOutcome::NoChanges);
        }

        let staged = self.publish(to_version, artifacts)?;
        let candidate = self.read_states.roundtrip(to_version);
        let candidate = self.check_integrity(candidate, &staged)?;
        self.validate(candidate.pending())?;
        self.announce(candidate.pending().version())?;
        self.read_states = candidate.commit();
        Ok(CycleOutcome::Produced(to_version))
    }

    fn populate<P>(&mut self, populator: &mut P, to_version: Version) -> Result<(), ProducerError>
    where
        P: Populator + ?Sized,
    {
        self.listeners.each(|l| l.on_populate_start(to_version));
        let started = Instant::now();
        let result = {
            let mut write_state = WriteState {
                version: to_version,
                mapper: &mut self.mapper,
                prior_state: self.read_states.current(),
            };
            populator.populate(&mut write_state)
        };
        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                let status = ProducerStatus::success(to_version);
                self.listeners
                    .each(|l| l.on_populate_complete(&status, elapsed));
                Ok(())
            }
            Err(e) => {
                let status = ProducerStatus::fail(to_version, &e);
                self.listeners
                    .each(|l| l.on_populate_complete(&status, elapsed));
                Err(ProducerError::Populate(e))
            }
        }
    }

    fn publish(
        &mut self,
        to_version: Version,
        artifacts: &Arc<Artifacts>,
    ) -> Result<StagedArtifacts, ProducerError> {
        self.listeners.each(|l| l.on_publish_start(to_version));
        let started = Instant::now();
        let result = self.publish_artifacts(to_version, artifacts);
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => {
                let status = ProducerStatus::success(to_version);
                self.listeners
                    .each(|l| l.on_publish_complete(&status, elapsed));
            }
            Err(e) => {
                let status = ProducerStatus::fail(to_version, e);
                self.listeners
                    .each(|l| l.on_publish_complete(&status, elapsed));
            }
        }
        result
    }

    fn publish_artifacts(
        &mut self,
        to_version: Version,
        artifacts: &Arc<Artifacts>,
    ) -> Result<StagedArtifacts, ProducerError> {
        let snapshot = self
            .stager
            .open_snapshot(to_version)
            .map_err(|e| ProducerError::Publish(e.into()))?;
        artifacts.set_snapshot(snapshot.clone());
        snapshot
            .stage(self.mapper.engine())
            .map_err(|e| ProducerError::Publish(e.into()))?;

        let current_version = self.read_states.current().map(ReadState::version);
        if let Some(from_version) = current_version {
            let delta = self
                .stager
                .open_delta(from_version, to_version)
                .map_err(|e| ProducerError::Publish(e.into()))?;
            artifacts.set_delta(delta.clone());
            delta
                .stage(self.mapper.engine())
                .map_err(|e| ProducerError::Publish(e.into()))?;

            let reverse_delta = self
                .stager
                .open_reverse_delta(to_version, from_version)
                .map_err(|e| ProducerError::Publish(e.into()))?;
            artifacts.set_reverse_delta(reverse_delta.clone());
            reverse_delta
                .stage(self.mapper.engine())
                .map_err(|e| ProducerError::Publish(e.into()))?;

            self.publish_blob(&delta)?;
            self.publish_blob(&reverse_delta)?;

            self.num_states_until_next_snapshot -= 1;
            if self.num_states_until_next_snapshot < 0 {
                self.schedule_snapshot_publish(&snapshot, artifacts);
                self.num_states_until_next_snapshot =
                    i64::from(self.num_states_between_snapshots);
            } else {
                artifacts.mark_snapshot_publish_complete();
            }

            Ok(StagedArtifacts {
                snapshot,
                deltas: Some(DeltaPair {
                    delta,
                    reverse_delta,
                }),
            })
        } else {
            // First state of a delta chain: the snapshot is the only entry
            // point, publish it synchronously.
            self.publish_blob(&snapshot)?;
            artifacts.mark_snapshot_publish_complete();
            self.num_states_until_next_snapshot = i64::from(self.num_states_between_snapshots);
            Ok(StagedArtifacts {
                snapshot,
                deltas: None,
            })
        }
    }

    fn publish_blob(&self, blob: &Blob) -> Result<(), ProducerError> {
        let started = Instant::now();
        let result = self.publisher.publish(blob);
        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                let status =
                    PublishStatus::success(blob.kind(), blob.from_version(), blob.to_version());
                self.listeners
                    .each(|l| l.on_artifact_publish(&status, elapsed));
                debug!(kind = %blob.kind(), to_version = blob.to_version(), "artifact published");
                Ok(())
            }
            Err(e) => {
                let status = PublishStatus::fail(
                    blob.kind(),
                    blob.from_version(),
                    blob.to_version(),
                    &e,
                );
                self.listeners
                    .each(|l| l.on_artifact_publish(&status, elapsed));
                Err(ProducerError::Publish(e))
            }
        }
    }

    fn schedule_snapshot_publish(&self, snapshot: &Blob, artifacts: &Arc<Artifacts>) {
        let publisher = Arc::clone(&self.publisher);
        let listeners = Arc::clone(&self.listeners);
        let artifacts = Arc::clone(artifacts);
        let blob = snapshot.clone();
        debug!(to_version = blob.to_version(), "snapshot publish deferred");
        self.snapshot_executor.execute(Box::new(move || {
            let started = Instant::now();
            let result = publisher.publish(&blob);
            let elapsed = started.elapsed();
            let status = match result {
                Ok(()) => {
                    PublishStatus::success(blob.kind(), blob.from_version(), blob.to_version())
                }
                Err(e) => {
                    warn!(
                        to_version = blob.to_version(),
                        error = %e,
                        "deferred snapshot publish failed; delta chain remains valid"
                    );
                    PublishStatus::fail(blob.kind(), blob.from_version(), blob.to_version(), &e)
                }
            };
            listeners.each(|l| l.on_artifact_publish(&status, elapsed));
            // Success or not, release the staged copy once cycle cleanup
            // has also been requested.
            artifacts.mark_snapshot_publish_complete();
        }));
    }

    /// Proves the staged artifacts connect the current and pending states:
    ///
    /// ```text
    /// S_cur.apply(delta).checksum(common)        == S_pnd.checksum(common)
    /// S_pnd.apply(reverseDelta).checksum(common) == S_cur.checksum(common)
    /// ```
    fn check_integrity(
        &self,
        mut candidate: Transition,
        staged: &StagedArtifacts,
    ) -> Result<Transition, ProducerError> {
        let pending_version = candidate.pending().version();
        self.listeners
            .each(|l| l.on_integrity_check_start(pending_version));
        let started = Instant::now();
        let result = Self::roundtrip_artifacts(&mut candidate, staged);
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => {
                let status = ProducerStatus::success(pending_version);
                self.listeners
                    .each(|l| l.on_integrity_check_complete(&status, elapsed));
            }
            Err(e) => {
                let status = ProducerStatus::fail(pending_version, e);
                self.listeners
                    .each(|l| l.on_integrity_check_complete(&status, elapsed));
            }
        }
        result.map(|swapped| if swapped { candidate.swap() } else { candidate })
    }

    /// Returns whether the engines were delta-applied and the candidate
    /// should adopt them via `swap`.
    fn roundtrip_artifacts(
        candidate: &mut Transition,
        staged: &StagedArtifacts,
    ) -> Result<bool, ProducerError> {
        let mut snapshot_reader = staged.snapshot.new_reader().map_err(CoreError::from)?;
        BlobReader::new(candidate.pending_mut().engine_mut())
            .read_snapshot(&mut snapshot_reader)?;
        drop(snapshot_reader);

        let (current, pending) = candidate.parts_mut();
        let Some(current) = current else {
            // First state of the chain: the snapshot is the whole proof.
            return Ok(false);
        };
        let Some(pair) = staged.deltas.as_ref() else {
            // Both deltas are staged whenever a prior state exists.
            debug_assert!(false, "prior state exists but no deltas were staged");
            return Err(ProducerError::ChecksumValidation {
                kind: BlobKind::Delta,
            });
        };

        // Fix the checksum scope once: types common to both versions.
        let scope = current.engine().common_type_names(pending.engine());
        let current_checksum = EngineChecksum::restricted_to(current.engine(), &scope);
        let pending_checksum = EngineChecksum::restricted_to(pending.engine(), &scope);
        debug!(%current_checksum, %pending_checksum, "integrity checksums");

        let mut delta_reader = pair.delta.new_reader().map_err(CoreError::from)?;
        BlobReader::new(current.engine_mut()).apply_delta(&mut delta_reader)?;
        let forward_checksum = EngineChecksum::restricted_to(current.engine(), &scope);
        if forward_checksum != pending_checksum {
            return Err(ProducerError::ChecksumValidation {
                kind: BlobKind::Delta,
            });
        }

        let mut reverse_reader = pair.reverse_delta.new_reader().map_err(CoreError::from)?;
        BlobReader::new(pending.engine_mut()).apply_delta(&mut reverse_reader)?;
        let reverse_checksum = EngineChecksum::restricted_to(pending.engine(), &scope);
        if reverse_checksum != current_checksum {
            return Err(ProducerError::ChecksumValidation {
                kind: BlobKind::ReverseDelta,
            });
        }

        Ok(true)
    }

    fn validate(&self, pending: &ReadState) -> Result<(), ProducerError> {
        let version = pending.version();
        self.listeners.each(|l| l.on_validation_start(version));
        let started = Instant::now();

        // Every validator runs, even after one fails.
        let mut failures = Vec::new();
        for validator in &self.validators {
            if let Err(e) = validator.validate(pending) {
                failures.push(e);
            }
        }

        let elapsed = started.elapsed();
        if failures.is_empty() {
            let status = ProducerStatus::success(version);
            self.listeners
                .each(|l| l.on_validation_complete(&status, elapsed));
            Ok(())
        } else {
            let validation = ValidationError::new(failures);
            let status = ProducerStatus::fail(version, &validation);
            self.listeners
                .each(|l| l.on_validation_complete(&status, elapsed));
            Err(ProducerError::Validation(validation))
        }
    }

    fn announce(&self, version: Version) -> Result<(), ProducerError> {
        self.listeners.each(|l| l.on_announcement_start(version));
        let started = Instant::now();
        let result = self.announcer.announce(version);
        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                let status = ProducerStatus::success(version);
                self.listeners
                    .each(|l| l.on_announcement_complete(&status, elapsed));
                info!(version, "version announced");
                Ok(())
            }
            Err(e) => {
                let status = ProducerStatus::fail(version, &e);
                self.listeners
                    .each(|l| l.on_announcement_complete(&status, elapsed));
                Err(ProducerError::Announce(e))
            }
        }
    }

    /// Boots producer state from a previously published version so the next
    /// cycle produces a delta continuous with history.
    ///
    /// A sentinel `desired` of [`NO_VERSION`] is a no-op. On success the
    /// restored state is installed as current and a fresh, rehydrated write
    /// engine replaces the old one; on any failure both are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::VersionMismatch`] when the blob store cannot
    /// reach `desired`, or the underlying refresh/rehydration failure.
    pub fn restore(
        &mut self,
        desired: Version,
        retriever: Arc<dyn BlobRetriever>,
    ) -> Result<Option<&ReadState>, RestoreError> {
        if desired == NO_VERSION {
            return Ok(None);
        }
        self.listeners.each(|l| l.on_restore_start(desired));
        let started = Instant::now();
        let result = self.restore_state(desired, retriever);
        let elapsed = started.elapsed();
        match &result {
            Ok(reached) => {
                let status = RestoreStatus::success(desired, *reached);
                self.listeners
                    .each(|l| l.on_restore_complete(&status, elapsed));
                info!(desired, reached, "restore complete");
            }
            Err(e) => {
                let reached = match e {
                    RestoreError::VersionMismatch { reached, .. } => *reached,
                    _ => NO_VERSION,
                };
                let status = RestoreStatus::fail(desired, reached, e);
                self.listeners
                    .each(|l| l.on_restore_complete(&status, elapsed));
                error!(desired, error = %e, "restore failed");
            }
        }
        result.map(|_| self.read_states.current())
    }

    fn restore_state(
        &mut self,
        desired: Version,
        retriever: Arc<dyn BlobRetriever>,
    ) -> Result<Version, RestoreError> {
        let mut consumer = Consumer::with_blob_retriever(retriever);
        consumer.refresh_to(desired)?;
        let (reached, engine) = consumer.into_parts();
        if reached != desired {
            return Err(RestoreError::VersionMismatch { desired, reached });
        }

        // Restoring into a populated write engine is undefined; rehydrate a
        // fresh one and swap it in only once everything succeeded.
        let state = ReadState::new(reached, engine);
        let mut mapper = ObjectMapper::with_schemas_of(&self.mapper)?;
        mapper.engine_mut().restore_from(state.engine())?;

        self.read_states = ReadStateHolder::restored(state);
        self.mapper = mapper;
        self.last_minted = self.last_minted.max(reached);
        Ok(reached)
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("current_version", &self.current_version())
            .field("validators", &self.validators.len())
            .field(
                "num_states_between_snapshots",
                &self.num_states_between_snapshots,
            )
            .finish_non_exhaustive()
    }
}
