//! Error types for the core data plane.

use crate::blob::BlobKind;

/// Errors from schema, engine, and blob codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// I/O error while reading or writing a blob stream.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error when encoding records or blob sections.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error when decoding records or blob sections.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// A blob frame failed its CRC32C check.
    #[error("corrupt blob frame at index {frame}")]
    CorruptFrame {
        /// Zero-based index of the offending frame in the stream.
        frame: usize,
    },

    /// A blob stream ended mid-frame.
    #[error("truncated blob stream at frame {frame}")]
    TruncatedStream {
        /// Zero-based index of the incomplete frame.
        frame: usize,
    },

    /// The blob being read is not of the expected kind.
    #[error("expected a {expected} blob, found {actual}")]
    UnexpectedBlobKind {
        /// The kind the caller asked for.
        expected: BlobKind,
        /// The kind found in the blob header.
        actual: BlobKind,
    },

    /// A record type is not registered with the engine.
    #[error("unknown record type '{0}'")]
    UnknownType(String),

    /// A record does not conform to its type's schema.
    #[error("schema mismatch for type '{type_name}': {detail}")]
    SchemaMismatch {
        /// The record type being added.
        type_name: String,
        /// What did not line up.
        detail: String,
    },

    /// A type was re-registered with a different schema.
    #[error("conflicting schema registration for type '{0}'")]
    SchemaConflict(String),

    /// `restore_from` was called on an engine that already holds records.
    #[error("cannot restore into a write engine that holds records")]
    NonEmptyRestoreTarget,
}
