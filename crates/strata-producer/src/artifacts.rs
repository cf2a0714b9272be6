//! The cycle's artifacts bag.
//!
//! Holds the up-to-three blobs staged during one cycle and coordinates
//! their release. Delta and reverse delta are released as soon as cycle
//! cleanup is requested; the snapshot may still be publishing on the
//! snapshot executor's thread, so it is released only once both
//! cleanup-requested and publish-complete have been signaled, in either
//! order.

use parking_lot::Mutex;

use crate::blob::Blob;

#[derive(Debug, Default)]
struct Inner {
    snapshot: Option<Blob>,
    delta: Option<Blob>,
    reverse_delta: Option<Blob>,
    cleanup_requested: bool,
    snapshot_publish_complete: bool,
}

impl Inner {
    fn release_snapshot_if_done(&mut self) {
        if self.cleanup_requested && self.snapshot_publish_complete {
            if let Some(snapshot) = self.snapshot.take() {
                snapshot.cleanup();
            }
        }
    }
}

/// The blobs produced during one cycle.
#[derive(Debug, Default)]
pub struct Artifacts {
    inner: Mutex<Inner>,
}

impl Artifacts {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_snapshot(&self, blob: Blob) {
        self.inner.lock().snapshot = Some(blob);
    }

    pub(crate) fn set_delta(&self, blob: Blob) {
        self.inner.lock().delta = Some(blob);
    }

    pub(crate) fn set_reverse_delta(&self, blob: Blob) {
        self.inner.lock().reverse_delta = Some(blob);
    }

    /// Whether a snapshot is still held.
    #[must_use]
    pub fn holds_snapshot(&self) -> bool {
        self.inner.lock().snapshot.is_some()
    }

    /// Releases the cycle's blobs.
    ///
    /// Delta and reverse delta are released immediately. The snapshot is
    /// released only once its (possibly deferred) publication has also
    /// reported complete. Idempotent: each blob is released exactly once.
    pub fn cleanup(&self) {
        let mut inner = self.inner.lock();
        inner.cleanup_requested = true;
        if let Some(delta) = inner.delta.take() {
            delta.cleanup();
        }
        if let Some(reverse_delta) = inner.reverse_delta.take() {
            reverse_delta.cleanup();
        }
        inner.release_snapshot_if_done();
    }

    /// Signals that snapshot publication finished (successfully or not).
    pub fn mark_snapshot_publish_complete(&self) {
        let mut inner = self.inner.lock();
        inner.snapshot_publish_complete = true;
        inner.release_snapshot_if_done();
    }
}
