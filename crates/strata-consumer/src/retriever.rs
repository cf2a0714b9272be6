//! The blob retrieval contract.

use strata_core::Version;

/// A blob fetched from a blob store.
#[derive(Debug, Clone)]
pub struct RetrievedBlob {
    /// Source version; [`strata_core::NO_VERSION`] for snapshots.
    pub from_version: Version,
    /// Destination version.
    pub to_version: Version,
    /// The blob stream's bytes.
    pub bytes: Vec<u8>,
}

/// Fetches published blobs from a blob store.
///
/// Implementations index snapshots by destination version and forward
/// deltas by source version, mirroring how the producer publishes them.
pub trait BlobRetriever: Send + Sync {
    /// Returns the snapshot with the greatest `to_version` at or before
    /// `desired`, if any.
    fn retrieve_snapshot(&self, desired: Version) -> Option<RetrievedBlob>;

    /// Returns the forward delta leaving `from`, if any.
    fn retrieve_delta(&self, from: Version) -> Option<RetrievedBlob>;
}
