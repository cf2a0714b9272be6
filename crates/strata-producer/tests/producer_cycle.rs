//! End-to-end producer cycle scenarios.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_consumer::{BlobRetriever, Consumer, MemoryBlobStore};
use strata_core::{
    BlobKind, BlobWriter, DataRecord, FieldKind, FieldValue, Record, RecordSchema, SchemaField,
    Version, WriteStateEngine, NO_VERSION,
};
use strata_producer::{
    Announcer, Blob, CycleOutcome, Producer, ProducerError, ProducerListener, Publisher,
    RestoreError, SnapshotExecutor, ValidationError, VersionMinter, WriteState,
};

struct Movie {
    title: String,
    year: i64,
}

impl Movie {
    fn new(title: &str, year: i64) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }
}

impl DataRecord for Movie {
    fn schema() -> RecordSchema {
        RecordSchema::new(
            "Movie",
            vec![
                SchemaField::new("title", FieldKind::String),
                SchemaField::new("year", FieldKind::Int),
            ],
        )
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            FieldValue::String(self.title.clone()),
            FieldValue::Int(self.year),
        ])
    }
}

/// Counter minter starting just above 1000, so the first cycle mints 1001.
struct CountingMinter {
    next: AtomicI64,
}

impl CountingMinter {
    fn new() -> Self {
        Self::starting_at(1001)
    }

    fn starting_at(first: Version) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl VersionMinter for CountingMinter {
    fn mint(&self) -> Version {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

/// Publishes staged blobs into a [`MemoryBlobStore`] and records the order.
#[derive(Clone)]
struct StorePublisher {
    store: MemoryBlobStore,
    log: Arc<Mutex<Vec<(BlobKind, Version, Version)>>>,
}

impl StorePublisher {
    fn new(store: MemoryBlobStore) -> Self {
        Self {
            store,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn published(&self) -> Vec<(BlobKind, Version, Version)> {
        self.log.lock().clone()
    }

    fn published_of_kind(&self, kind: BlobKind) -> usize {
        self.log.lock().iter().filter(|(k, _, _)| *k == kind).count()
    }
}

impl Publisher for StorePublisher {
    fn publish(&self, blob: &Blob) -> anyhow::Result<()> {
        let bytes = std::fs::read(blob.path())?;
        match blob.kind() {
            BlobKind::Snapshot => self.store.store_snapshot(blob.to_version(), bytes),
            BlobKind::Delta => {
                self.store
                    .store_delta(blob.from_version(), blob.to_version(), bytes);
            }
            BlobKind::ReverseDelta => {}
        }
        self.log
            .lock()
            .push((blob.kind(), blob.from_version(), blob.to_version()));
        Ok(())
    }
}

/// Records announced versions; can be told to fail.
#[derive(Clone, Default)]
struct RecordingAnnouncer {
    announced: Arc<Mutex<Vec<Version>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingAnnouncer {
    fn announced(&self) -> Vec<Version> {
        self.announced.lock().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, version: Version) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("announcement endpoint unavailable");
        }
        self.announced.lock().push(version);
        Ok(())
    }
}

/// Queues deferred snapshot jobs so tests control when they run.
#[derive(Clone, Default)]
struct QueueExecutor {
    jobs: Arc<Mutex<Vec<Box<dyn FnOnce() + Send>>>>,
}

impl QueueExecutor {
    fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    fn run_all(&self) {
        let jobs: Vec<_> = std::mem::take(&mut *self.jobs.lock());
        for job in jobs {
            job();
        }
    }
}

impl SnapshotExecutor for QueueExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        self.jobs.lock().push(job);
    }
}

/// Collects lifecycle event names.
#[derive(Clone, Default)]
struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    fn names(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn push(&self, name: &str) {
        self.events.lock().push(name.to_string());
    }
}

impl ProducerListener for EventLog {
    fn on_new_delta_chain(&self, _version: Version) {
        self.push("new_delta_chain");
    }
    fn on_cycle_start(&self, _version: Version) {
        self.push("cycle_start");
    }
    fn on_cycle_complete(&self, _status: &strata_producer::ProducerStatus, _e: std::time::Duration) {
        self.push("cycle_complete");
    }
    fn on_no_delta(&self, _version: Version) {
        self.push("no_delta");
    }
    fn on_populate_start(&self, _version: Version) {
        self.push("populate_start");
    }
    fn on_populate_complete(
        &self,
        _status: &strata_producer::ProducerStatus,
        _e: std::time::Duration,
    ) {
        self.push("populate_complete");
    }
    fn on_publish_start(&self, _version: Version) {
        self.push("publish_start");
    }
    fn on_publish_complete(
        &self,
        _status: &strata_producer::ProducerStatus,
        _e: std::time::Duration,
    ) {
        self.push("publish_complete");
    }
    fn on_integrity_check_start(&self, _version: Version) {
        self.push("integrity_start");
    }
    fn on_integrity_check_complete(
        &self,
        _status: &strata_producer::ProducerStatus,
        _e: std::time::Duration,
    ) {
        self.push("integrity_complete");
    }
    fn on_announcement_start(&self, _version: Version) {
        self.push("announcement_start");
    }
    fn on_announcement_complete(
        &self,
        _status: &strata_producer::ProducerStatus,
        _e: std::time::Duration,
    ) {
        self.push("announcement_complete");
    }
}

struct TestRig {
    producer: Producer,
    store: MemoryBlobStore,
    publisher: StorePublisher,
    announcer: RecordingAnnouncer,
    _staging: tempfile::TempDir,
}

fn rig_with(
    configure: impl FnOnce(strata_producer::ProducerBuilder) -> strata_producer::ProducerBuilder,
) -> TestRig {
    let staging = tempfile::tempdir().unwrap();
    let store = MemoryBlobStore::new();
    let publisher = StorePublisher::new(store.clone());
    let announcer = RecordingAnnouncer::default();
    let builder = Producer::builder()
        .publisher(publisher.clone())
        .announcer(announcer.clone())
        .version_minter(CountingMinter::new())
        .blob_staging_dir(staging.path());
    let producer = configure(builder).build().unwrap();
    TestRig {
        producer,
        store,
        publisher,
        announcer,
        _staging: staging,
    }
}

fn rig() -> TestRig {
    rig_with(|b| b)
}

fn populate_movies(movies: Vec<Movie>) -> impl FnMut(&mut WriteState<'_>) -> anyhow::Result<()> {
    move |state: &mut WriteState<'_>| {
        for movie in &movies {
            state.add(movie)?;
        }
        Ok(())
    }
}

fn catalog_v1() -> Vec<Movie> {
    vec![Movie::new("Heat", 1995), Movie::new("Ronin", 1998)]
}

fn catalog_v2() -> Vec<Movie> {
    vec![Movie::new("Heat", 1995), Movie::new("Collateral", 2004)]
}

#[test]
fn first_cycle_publishes_snapshot_only_and_announces() {
    let mut rig = rig();
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    assert!(matches!(outcome, CycleOutcome::Produced(1001)));
    assert_eq!(rig.producer.current_version(), 1001);
    assert_eq!(rig.announcer.announced(), vec![1001]);
    assert_eq!(
        rig.publisher.published(),
        vec![(BlobKind::Snapshot, NO_VERSION, 1001)]
    );
    assert_eq!(rig.store.snapshot_count(), 1);
    assert_eq!(rig.store.delta_count(), 0);
}

#[test]
fn second_cycle_publishes_delta_chain_and_checksums_hold() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();

    assert!(matches!(outcome, CycleOutcome::Produced(1002)));
    assert_eq!(rig.announcer.announced(), vec![1001, 1002]);
    // Deltas publish synchronously before the snapshot, in order.
    assert_eq!(
        rig.publisher.published()[1..],
        [
            (BlobKind::Delta, 1001, 1002),
            (BlobKind::ReverseDelta, 1002, 1001),
            (BlobKind::Snapshot, NO_VERSION, 1002),
        ]
    );
}

#[test]
fn no_change_cycle_announces_nothing() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    let published_before = rig.publisher.published().len();

    // Identical population: mints 1003 but produces nothing.
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();

    assert!(matches!(outcome, CycleOutcome::NoChanges));
    assert_eq!(rig.producer.current_version(), 1002);
    assert_eq!(rig.announcer.announced(), vec![1001, 1002]);
    assert_eq!(rig.publisher.published().len(), published_before);

    // The next changed cycle proceeds cleanly from 1002.
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1004)));
}

#[test]
fn consumer_follows_published_chain_via_deltas() {
    // Large cadence: only the initial snapshot reaches the store, so the
    // consumer must chase deltas.
    let mut rig = rig_with(|b| {
        b.num_states_between_snapshots(10)
            .snapshot_publish_executor(QueueExecutor::default())
    });
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    rig.producer
        .run_cycle(&mut populate_movies(vec![Movie::new("Heat", 1995)]))
        .unwrap();

    assert_eq!(rig.store.snapshot_count(), 1);
    assert_eq!(rig.store.delta_count(), 2);

    let mut consumer = Consumer::with_blob_retriever(Arc::new(rig.store.clone()));
    consumer.refresh_to(1003).unwrap();
    assert_eq!(consumer.current_version(), 1003);
    assert_eq!(consumer.engine().record_count("Movie"), 1);
    assert!(consumer
        .engine()
        .find_ordinal("Movie", &Movie::new("Heat", 1995).to_record())
        .unwrap()
        .is_some());
}

#[test]
fn snapshot_cadence_defers_publication_until_counter_fires() {
    let executor = QueueExecutor::default();
    let mut rig = rig_with(|b| {
        b.num_states_between_snapshots(2)
            .snapshot_publish_executor(executor.clone())
    });

    // First cycle: snapshot publishes synchronously.
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert_eq!(rig.publisher.published_of_kind(BlobKind::Snapshot), 1);

    // Two producing cycles: counter counts down, no snapshot publication.
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert_eq!(rig.publisher.published_of_kind(BlobKind::Snapshot), 1);
    assert_eq!(executor.pending(), 0);

    // Third producing cycle: the counter fires, publication is deferred.
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    assert_eq!(executor.pending(), 1);
    assert_eq!(rig.publisher.published_of_kind(BlobKind::Snapshot), 1);
    // Deltas still published synchronously every producing cycle.
    assert_eq!(rig.publisher.published_of_kind(BlobKind::Delta), 3);

    executor.run_all();
    assert_eq!(rig.publisher.published_of_kind(BlobKind::Snapshot), 2);
    assert_eq!(rig.store.snapshot_count(), 2);
}

/// Wraps [`StorePublisher`] and garbles the first staged delta before the
/// integrity check reads it back.
#[derive(Clone)]
struct DeltaTamperingPublisher {
    inner: StorePublisher,
    tampered: Arc<AtomicBool>,
}

impl Publisher for DeltaTamperingPublisher {
    fn publish(&self, blob: &Blob) -> anyhow::Result<()> {
        self.inner.publish(blob)?;
        if blob.kind() == BlobKind::Delta && !self.tampered.swap(true, Ordering::SeqCst) {
            // Replace the staged file with a well-formed but empty delta;
            // the forward round trip then reproduces the wrong state.
            let empty = WriteStateEngine::new();
            let mut bytes = Vec::new();
            BlobWriter::new(&empty)
                .write_delta(blob.from_version(), blob.to_version(), &mut bytes)
                .unwrap();
            std::fs::write(blob.path(), bytes)?;
        }
        Ok(())
    }
}

#[test]
fn corrupt_delta_fails_integrity_and_rolls_back() {
    let staging = tempfile::tempdir().unwrap();
    let store = MemoryBlobStore::new();
    let publisher = DeltaTamperingPublisher {
        inner: StorePublisher::new(store),
        tampered: Arc::new(AtomicBool::new(false)),
    };
    let announcer = RecordingAnnouncer::default();
    let mut producer = Producer::builder()
        .publisher(publisher.clone())
        .announcer(announcer.clone())
        .version_minter(CountingMinter::new())
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();

    producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    let outcome = producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    match outcome {
        CycleOutcome::Failed(ProducerError::ChecksumValidation { kind }) => {
            assert_eq!(kind, BlobKind::Delta);
        }
        other => panic!("expected checksum failure, got {other:?}"),
    }
    assert_eq!(producer.current_version(), 1001);
    assert_eq!(announcer.announced(), vec![1001]);

    // The next cycle proceeds cleanly from 1001.
    let outcome = producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1003)));
    assert_eq!(announcer.announced(), vec![1001, 1003]);
}

#[test]
fn all_validators_run_and_failures_aggregate_in_order() {
    let second_ran = Arc::new(AtomicBool::new(false));
    let second_flag = second_ran.clone();
    let mut rig = rig_with(move |b| {
        b.validator(|_state: &strata_producer::ReadState| -> anyhow::Result<()> {
            anyhow::bail!("first validator failed")
        })
        .validator(move |_state: &strata_producer::ReadState| -> anyhow::Result<()> {
            second_flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .validator(|_state: &strata_producer::ReadState| -> anyhow::Result<()> {
            anyhow::bail!("third validator failed")
        })
    });

    let err: ValidationError = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap_err();

    assert_eq!(err.failures.len(), 2);
    assert!(err.failures[0].to_string().contains("first"));
    assert!(err.failures[1].to_string().contains("third"));
    assert!(second_ran.load(Ordering::SeqCst));

    // Rolled back: nothing announced, holder still empty.
    assert_eq!(rig.producer.current_version(), NO_VERSION);
    assert!(rig.announcer.announced().is_empty());
}

#[test]
fn populator_failure_rolls_back_and_next_cycle_recovers() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    let mut failing = |_state: &mut WriteState<'_>| -> anyhow::Result<()> {
        anyhow::bail!("upstream source unavailable")
    };
    let outcome = rig.producer.run_cycle(&mut failing).unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Failed(ProducerError::Populate(_))
    ));
    assert_eq!(rig.producer.current_version(), 1001);

    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1003)));
}

#[test]
fn announcer_failure_keeps_version_invisible() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    rig.announcer.fail_next.store(true, Ordering::SeqCst);
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Failed(ProducerError::Announce(_))
    ));
    assert_eq!(rig.producer.current_version(), 1001);
    assert_eq!(rig.announcer.announced(), vec![1001]);
}

#[test]
fn restore_rehydrates_and_empty_populator_produces_no_delta() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();

    // A second producer boots from the published chain; its minter resumes
    // above the restored version.
    let staging = tempfile::tempdir().unwrap();
    let mut restored = Producer::builder()
        .publisher(StorePublisher::new(rig.store.clone()))
        .announcer(RecordingAnnouncer::default())
        .version_minter(CountingMinter::starting_at(1003))
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();
    restored.initialize_type::<Movie>().unwrap();

    let state = restored
        .restore(1002, Arc::new(rig.store.clone()))
        .unwrap()
        .expect("restore installs a read state");
    assert_eq!(state.version(), 1002);
    assert_eq!(restored.current_version(), 1002);

    // An empty populator right after restore is a no-delta cycle.
    let mut empty = |_state: &mut WriteState<'_>| -> anyhow::Result<()> { Ok(()) };
    let outcome = restored.run_cycle(&mut empty).unwrap();
    assert!(matches!(outcome, CycleOutcome::NoChanges));
    assert_eq!(restored.current_version(), 1002);

    // A changed population produces a delta continuous with history.
    let outcome = restored
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(_)));
    assert!(rig.store.retrieve_delta(1002).is_some());
}

#[test]
fn restore_version_mismatch_leaves_producer_untouched() {
    let mut rig = rig();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    let staging = tempfile::tempdir().unwrap();
    let mut fresh = Producer::builder()
        .publisher(StorePublisher::new(rig.store.clone()))
        .announcer(RecordingAnnouncer::default())
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();
    fresh.initialize_type::<Movie>().unwrap();

    // The chain head is 1001; 1005 is unreachable.
    let err = fresh.restore(1005, Arc::new(rig.store.clone())).unwrap_err();
    match err {
        RestoreError::VersionMismatch { desired, reached } => {
            assert_eq!(desired, 1005);
            assert_eq!(reached, 1001);
        }
        other => panic!("expected version mismatch, got {other:?}"),
    }
    assert_eq!(fresh.current_version(), NO_VERSION);
}

#[test]
fn restore_of_sentinel_version_is_a_noop() {
    let rig = rig();
    let staging = tempfile::tempdir().unwrap();
    let mut fresh = Producer::builder()
        .publisher(StorePublisher::new(rig.store.clone()))
        .announcer(RecordingAnnouncer::default())
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();
    let result = fresh.restore(NO_VERSION, Arc::new(rig.store)).unwrap();
    assert!(result.is_none());
}

#[test]
fn lifecycle_events_fire_in_order() {
    let events = EventLog::default();
    let mut rig = rig_with(|b| b.listener(events.clone()));
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();

    let names = events.names();
    assert_eq!(
        names,
        vec![
            "new_delta_chain",
            "cycle_start",
            "populate_start",
            "populate_complete",
            "publish_start",
            "publish_complete",
            "integrity_start",
            "integrity_complete",
            "announcement_start",
            "announcement_complete",
            "cycle_complete",
        ]
    );

    // No-delta cycle: populate then no_delta, nothing else.
    let before = events.names().len();
    rig.producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    let tail = &events.names()[before..];
    assert_eq!(
        tail,
        [
            "cycle_start",
            "populate_start",
            "populate_complete",
            "no_delta",
            "cycle_complete",
        ]
    );
}

#[test]
fn panicking_listener_does_not_fail_the_cycle() {
    struct PanickingListener;
    impl ProducerListener for PanickingListener {
        fn on_cycle_start(&self, _version: Version) {
            panic!("listener bug");
        }
    }

    let mut rig = rig_with(|b| b.listener(PanickingListener));
    let outcome = rig
        .producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1001)));
}

#[test]
#[should_panic(expected = "strictly ascending")]
fn non_monotonic_minter_is_rejected() {
    struct StuckMinter;
    impl VersionMinter for StuckMinter {
        fn mint(&self) -> Version {
            42
        }
    }

    let staging = tempfile::tempdir().unwrap();
    let mut producer = Producer::builder()
        .publisher(StorePublisher::new(MemoryBlobStore::new()))
        .announcer(RecordingAnnouncer::default())
        .version_minter(StuckMinter)
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();

    let mut populator = populate_movies(catalog_v1());
    producer.run_cycle(&mut populator).unwrap();
    producer.run_cycle(&mut populator).unwrap();
}

#[test]
fn deferred_snapshot_publish_failure_does_not_fail_the_cycle() {
    /// Fails every snapshot publish, succeeds for deltas.
    #[derive(Clone)]
    struct SnapshotFailingPublisher(StorePublisher);
    impl Publisher for SnapshotFailingPublisher {
        fn publish(&self, blob: &Blob) -> anyhow::Result<()> {
            if blob.kind() == BlobKind::Snapshot && blob.to_version() > 1001 {
                anyhow::bail!("blob store rejected the snapshot");
            }
            self.0.publish(blob)
        }
    }

    let executor = QueueExecutor::default();
    let staging = tempfile::tempdir().unwrap();
    let store = MemoryBlobStore::new();
    let announcer = RecordingAnnouncer::default();
    let mut producer = Producer::builder()
        .publisher(SnapshotFailingPublisher(StorePublisher::new(store)))
        .announcer(announcer.clone())
        .version_minter(CountingMinter::new())
        .snapshot_publish_executor(executor.clone())
        .num_states_between_snapshots(0)
        .blob_staging_dir(staging.path())
        .build()
        .unwrap();

    producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    let outcome = producer
        .run_cycle(&mut populate_movies(catalog_v2()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1002)));
    assert_eq!(announcer.announced(), vec![1001, 1002]);

    // The deferred publish fails quietly; the delta chain remains valid.
    executor.run_all();
    let outcome = producer
        .run_cycle(&mut populate_movies(catalog_v1()))
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::Produced(1003)));
}
