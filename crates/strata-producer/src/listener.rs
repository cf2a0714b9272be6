//! Lifecycle listeners and their broadcast support.
//!
//! Every lifecycle point of the cycle engine fans out to the registered
//! listeners. A listener can never fail a cycle: panics are caught,
//! logged, and swallowed. Start events precede their matched complete
//! events; per-artifact publish events nest inside publish start/complete,
//! and those of a deferred snapshot fire on the snapshot executor's thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use strata_core::Version;
use tracing::warn;

use crate::status::{ProducerStatus, PublishStatus, RestoreStatus};

/// Receives producer lifecycle events. All hooks default to no-ops.
pub trait ProducerListener: Send + Sync {
    /// The producer's data model was initialized.
    fn on_producer_init(&self, _elapsed: Duration) {}

    /// A restore attempt began.
    fn on_restore_start(&self, _desired: Version) {}

    /// A restore attempt finished.
    fn on_restore_complete(&self, _status: &RestoreStatus, _elapsed: Duration) {}

    /// The producer is starting a new delta chain at this version.
    fn on_new_delta_chain(&self, _version: Version) {}

    /// A cycle began.
    fn on_cycle_start(&self, _version: Version) {}

    /// A cycle finished.
    fn on_cycle_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}

    /// The populator ran but produced no changes; no version was announced.
    fn on_no_delta(&self, _version: Version) {}

    /// The populate phase began.
    fn on_populate_start(&self, _version: Version) {}

    /// The populate phase finished.
    fn on_populate_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}

    /// The publish phase began.
    fn on_publish_start(&self, _version: Version) {}

    /// The publish phase finished.
    fn on_publish_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}

    /// One blob artifact finished publishing.
    fn on_artifact_publish(&self, _status: &PublishStatus, _elapsed: Duration) {}

    /// The integrity check began.
    fn on_integrity_check_start(&self, _version: Version) {}

    /// The integrity check finished.
    fn on_integrity_check_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}

    /// Validation began.
    fn on_validation_start(&self, _version: Version) {}

    /// Validation finished.
    fn on_validation_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}

    /// Announcement began.
    fn on_announcement_start(&self, _version: Version) {}

    /// Announcement finished.
    fn on_announcement_complete(&self, _status: &ProducerStatus, _elapsed: Duration) {}
}

/// Fan-out registry for [`ProducerListener`]s.
#[derive(Default)]
pub struct ListenerSupport {
    listeners: RwLock<Vec<Arc<dyn ProducerListener>>>,
}

impl ListenerSupport {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn add(&self, listener: Arc<dyn ProducerListener>) {
        self.listeners.write().push(listener);
    }

    /// Removes a previously registered listener.
    pub fn remove(&self, listener: &Arc<dyn ProducerListener>) {
        self.listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Broadcasts one event to every listener, swallowing panics.
    pub(crate) fn each(&self, f: impl Fn(&dyn ProducerListener)) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))).is_err() {
                warn!("producer listener panicked; event dropped for that listener");
            }
        }
    }
}

impl std::fmt::Debug for ListenerSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSupport")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
