//! In-memory blob store.
//!
//! A shared, thread-safe blob map used in tests, demos, and anywhere a
//! durable blob store is not required. Producer-side publishers write into
//! it; consumers retrieve from it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{Version, NO_VERSION};

use crate::retriever::{BlobRetriever, RetrievedBlob};

#[derive(Debug, Default)]
struct Inner {
    /// Snapshots by destination version.
    snapshots: BTreeMap<Version, Vec<u8>>,
    /// Forward deltas by source version.
    deltas: HashMap<Version, (Version, Vec<u8>)>,
}

/// Shared in-memory blob store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot blob for `to_version`.
    pub fn store_snapshot(&self, to_version: Version, bytes: Vec<u8>) {
        self.inner.lock().snapshots.insert(to_version, bytes);
    }

    /// Stores a forward delta blob for the `from` to `to` transition.
    pub fn store_delta(&self, from_version: Version, to_version: Version, bytes: Vec<u8>) {
        self.inner
            .lock()
            .deltas
            .insert(from_version, (to_version, bytes));
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.inner.lock().snapshots.len()
    }

    /// Number of stored forward deltas.
    #[must_use]
    pub fn delta_count(&self) -> usize {
        self.inner.lock().deltas.len()
    }
}

impl BlobRetriever for MemoryBlobStore {
    fn retrieve_snapshot(&self, desired: Version) -> Option<RetrievedBlob> {
        let inner = self.inner.lock();
        let (&to_version, bytes) = inner.snapshots.range(..=desired).next_back()?;
        Some(RetrievedBlob {
            from_version: NO_VERSION,
            to_version,
            bytes: bytes.clone(),
        })
    }

    fn retrieve_delta(&self, from: Version) -> Option<RetrievedBlob> {
        let inner = self.inner.lock();
        let (to_version, bytes) = inner.deltas.get(&from)?;
        Some(RetrievedBlob {
            from_version: from,
            to_version: *to_version,
            bytes: bytes.clone(),
        })
    }
}
