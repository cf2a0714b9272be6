//! # Strata Core
//!
//! The in-memory data plane for Strata: record schemas, the mutable
//! write-state engine a producer populates, the immutable read-state
//! engine consumers materialize, and the framed binary blob codec that
//! moves state between them as snapshots and deltas.
//!
//! A dataset version is identified by a [`Version`]; blobs carry the
//! `(from_version, to_version)` pair that places them in the delta chain.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Blob framing and the snapshot/delta codec.
pub mod blob;

/// Content checksums over read-state engines.
pub mod checksum;

/// Error types for the core data plane.
pub mod error;

/// Object-to-record mapping for strongly-typed values.
pub mod mapper;

/// Field-value match queries over a read-state engine.
pub mod query;

/// Immutable read-state engine.
pub mod read;

/// Record values and their canonical encoding.
pub mod record;

/// Record schemas.
pub mod schema;

/// Mutable write-state engine.
pub mod write;

pub use blob::{BlobHeader, BlobKind, BlobReader, BlobWriter};
pub use checksum::EngineChecksum;
pub use error::CoreError;
pub use mapper::{DataRecord, ObjectMapper};
pub use query::{FieldMatch, FieldMatchQuery};
pub use read::ReadStateEngine;
pub use record::{FieldValue, Record};
pub use schema::{FieldKind, RecordSchema, SchemaField};
pub use write::WriteStateEngine;

/// A dataset version identifier.
///
/// Versions minted by a producer are strictly ascending over its lifetime.
pub type Version = i64;

/// Sentinel meaning "no version".
///
/// Used as the `from_version` of snapshot blobs and as the pre-restore
/// version of an empty consumer.
pub const NO_VERSION: Version = i64::MIN;
