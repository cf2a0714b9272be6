//! Staged blobs, the stager contract, and stream compression.
//!
//! A [`Blob`] is a staged artifact on the local filesystem: the engine
//! serializes into it, the publisher persists it to the durable blob store,
//! and the artifacts bag deletes it once the cycle is done with it. Staged
//! streams pass through a [`BlobCompressor`] in both directions; the
//! default is the identity.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::{BlobKind, BlobWriter, CoreError, Version, WriteStateEngine};
use tracing::debug;

/// Wraps blob streams, e.g. with gzip. The default is the identity.
pub trait BlobCompressor: Send + Sync {
    /// Wraps the staged output stream.
    fn compress(&self, out: Box<dyn Write>) -> Box<dyn Write>;

    /// Wraps the staged input stream.
    fn decompress(&self, input: Box<dyn Read>) -> Box<dyn Read>;
}

/// Identity compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl BlobCompressor for NoCompression {
    fn compress(&self, out: Box<dyn Write>) -> Box<dyn Write> {
        out
    }

    fn decompress(&self, input: Box<dyn Read>) -> Box<dyn Read> {
        input
    }
}

/// A staged blob artifact.
///
/// Cheap to clone; clones refer to the same staged file.
#[derive(Clone)]
pub struct Blob {
    kind: BlobKind,
    from_version: Version,
    to_version: Version,
    path: PathBuf,
    compressor: Arc<dyn BlobCompressor>,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("kind", &self.kind)
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Blob {
    /// Creates a blob handle staging at `path` through `compressor`.
    #[must_use]
    pub fn new(
        kind: BlobKind,
        from_version: Version,
        to_version: Version,
        path: PathBuf,
        compressor: Arc<dyn BlobCompressor>,
    ) -> Self {
        Self {
            kind,
            from_version,
            to_version,
            path,
            compressor,
        }
    }

    /// The artifact kind.
    #[must_use]
    pub fn kind(&self) -> BlobKind {
        self.kind
    }

    /// Source version; [`strata_core::NO_VERSION`] for snapshots.
    #[must_use]
    pub fn from_version(&self) -> Version {
        self.from_version
    }

    /// Destination version.
    #[must_use]
    pub fn to_version(&self) -> Version {
        self.to_version
    }

    /// Path of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the engine's state into the staged file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on I/O or serialization failure.
    pub fn stage(&self, engine: &WriteStateEngine) -> Result<(), CoreError> {
        let file = File::create(&self.path)?;
        let mut out = self
            .compressor
            .compress(Box::new(BufWriter::new(file)));
        let writer = BlobWriter::new(engine);
        match self.kind {
            BlobKind::Snapshot => writer.write_snapshot(self.to_version, &mut out)?,
            BlobKind::Delta => {
                writer.write_delta(self.from_version, self.to_version, &mut out)?;
            }
            BlobKind::ReverseDelta => {
                writer.write_reverse_delta(self.from_version, self.to_version, &mut out)?;
            }
        }
        out.flush()?;
        drop(out);
        debug!(kind = %self.kind, path = %self.path.display(), "blob staged");
        Ok(())
    }

    /// Opens the staged file for reading, decompressing.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file cannot be opened.
    pub fn new_reader(&self) -> Result<Box<dyn Read>, std::io::Error> {
        let file = File::open(&self.path)?;
        Ok(self
            .compressor
            .decompress(Box::new(BufReader::new(file))))
    }

    /// Deletes the staged file. Idempotent; a missing file is not an error.
    pub fn cleanup(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "staged blob released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "staged blob cleanup failed");
            }
        }
    }
}

/// Opens writable blobs for staging.
pub trait BlobStager: Send {
    /// Opens a snapshot blob for the given version.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging location cannot be prepared.
    fn open_snapshot(&self, version: Version) -> Result<Blob, std::io::Error>;

    /// Opens a forward-delta blob for the `from` to `to` transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging location cannot be prepared.
    fn open_delta(&self, from_version: Version, to_version: Version)
        -> Result<Blob, std::io::Error>;

    /// Opens a reverse-delta blob for the `from` back to `to` transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging location cannot be prepared.
    fn open_reverse_delta(
        &self,
        from_version: Version,
        to_version: Version,
    ) -> Result<Blob, std::io::Error>;
}

/// Stages blobs as files under a staging directory.
pub struct FilesystemBlobStager {
    staging_dir: PathBuf,
    compressor: Arc<dyn BlobCompressor>,
}

impl FilesystemBlobStager {
    /// Creates a stager over the given directory and compressor.
    #[must_use]
    pub fn new(staging_dir: impl Into<PathBuf>, compressor: Arc<dyn BlobCompressor>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            compressor,
        }
    }

    fn open(
        &self,
        kind: BlobKind,
        from_version: Version,
        to_version: Version,
        name: String,
    ) -> Result<Blob, std::io::Error> {
        std::fs::create_dir_all(&self.staging_dir)?;
        Ok(Blob::new(
            kind,
            from_version,
            to_version,
            self.staging_dir.join(name),
            Arc::clone(&self.compressor),
        ))
    }
}

impl BlobStager for FilesystemBlobStager {
    fn open_snapshot(&self, version: Version) -> Result<Blob, std::io::Error> {
        let name = format!("{}-{version}", BlobKind::Snapshot.prefix());
        self.open(BlobKind::Snapshot, strata_core::NO_VERSION, version, name)
    }

    fn open_delta(
        &self,
        from_version: Version,
        to_version: Version,
    ) -> Result<Blob, std::io::Error> {
        let name = format!("{}-{from_version}-{to_version}", BlobKind::Delta.prefix());
        self.open(BlobKind::Delta, from_version, to_version, name)
    }

    fn open_reverse_delta(
        &self,
        from_version: Version,
        to_version: Version,
    ) -> Result<Blob, std::io::Error> {
        let name = format!(
            "{}-{from_version}-{to_version}",
            BlobKind::ReverseDelta.prefix()
        );
        self.open(BlobKind::ReverseDelta, from_version, to_version, name)
    }
}
