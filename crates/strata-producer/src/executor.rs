//! Snapshot publish executors.
//!
//! Snapshot publication is I/O-expensive and consumers can always catch up
//! via deltas, so the engine can hand the publish off to an executor and
//! keep the cycle on the hot path. The default runs inline on the cycle
//! thread.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// Runs deferred snapshot publish jobs.
///
/// Implementations must run every job exactly once, eventually: the job
/// carries the publish-complete signal that releases the staged snapshot,
/// so a dropped job leaks the staged copy.
pub trait SnapshotExecutor: Send + Sync {
    /// Runs the job, now or later.
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Runs jobs inline on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSnapshotExecutor;

impl SnapshotExecutor for InlineSnapshotExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        job();
    }
}

/// Runs each job on its own detached thread, falling back to the calling
/// thread if no thread can be spawned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSnapshotExecutor;

impl SnapshotExecutor for ThreadSnapshotExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        // `spawn` consumes its closure even on failure, so the job lives in
        // a shared slot that exactly one of the two paths takes.
        let slot = Arc::new(Mutex::new(Some(job)));
        let thread_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name("strata-snapshot-publish".into())
            .spawn(move || {
                if let Some(job) = thread_slot.lock().take() {
                    job();
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "snapshot publish thread failed to spawn; publishing inline");
            if let Some(job) = slot.lock().take() {
                job();
            }
        }
    }
}
