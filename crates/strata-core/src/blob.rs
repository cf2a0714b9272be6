//! Blob framing and the snapshot/delta codec.
//!
//! A blob is a sequential stream of CRC32C-checked frames, each
//! `[length: 4][crc32: 4][data: length]` little-endian. Frame zero holds the
//! JSON-encoded [`BlobHeader`]; every following frame holds one rkyv-encoded
//! [`TypeSection`]. The codec never seeks, so blobs can be produced into and
//! consumed from plain byte streams.
//!
//! Snapshot sections carry the full record set of a type (split into
//! multiple sections when the encoded size exceeds the write engine's shard
//! hint). Delta sections carry the ordinals removed and the records added
//! relative to the source state.

use std::io::{Read, Write};

use rkyv::rancor::Error as RkyvError;

use crate::error::CoreError;
use crate::read::ReadStateEngine;
use crate::schema::RecordSchema;
use crate::write::WriteStateEngine;
use crate::{Version, NO_VERSION};

/// Current blob format version.
pub const BLOB_FORMAT_VERSION: u32 = 1;

/// The kind of artifact a blob holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BlobKind {
    /// Full serialized dataset at a version.
    Snapshot,
    /// Edit script from a version to its successor.
    Delta,
    /// Edit script from a version back to its predecessor.
    ReverseDelta,
}

impl BlobKind {
    /// Stable lowercase prefix used in staged file names.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Delta => "delta",
            Self::ReverseDelta => "reversedelta",
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snapshot => write!(f, "snapshot"),
            Self::Delta => write!(f, "delta"),
            Self::ReverseDelta => write!(f, "reverse delta"),
        }
    }
}

/// Header frame of a blob stream.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobHeader {
    /// Blob format version, for future evolution.
    pub format_version: u32,
    /// The artifact kind.
    pub kind: BlobKind,
    /// Source version; [`NO_VERSION`] for snapshots.
    pub from_version: Version,
    /// Destination version.
    pub to_version: Version,
    /// Schemas of every type carried by this blob.
    pub schemas: Vec<RecordSchema>,
}

// Module to contain types that use derive macros with generated code.
mod section_types {
    #![allow(missing_docs)] // Allow for derive-generated code

    use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

    use crate::schema::RecordSchema;

    /// One type's contribution to a blob.
    #[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
    pub struct TypeSection {
        /// Schema of the carried type.
        pub schema: RecordSchema,
        /// Ordinals removed from the source state (empty in snapshots).
        pub removed_ordinals: Vec<u64>,
        /// Records added, as `(ordinal, canonical bytes)` pairs.
        pub records: Vec<(u64, Vec<u8>)>,
    }
}

pub use section_types::TypeSection;

/// Per-record overhead assumed when splitting snapshot sections.
const RECORD_SHARD_OVERHEAD: u64 = 16;

fn write_frame(w: &mut dyn Write, data: &[u8]) -> Result<(), CoreError> {
    #[allow(clippy::cast_possible_truncation)] // frame payloads stay far below u32::MAX
    let len = data.len() as u32;
    let crc = crc32c::crc32c(data);
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&crc.to_le_bytes())?;
    w.write_all(data)?;
    Ok(())
}

/// Reads one frame, returning `None` on a clean end of stream.
fn read_frame(r: &mut dyn Read, frame: usize) -> Result<Option<Vec<u8>>, CoreError> {
    let mut len_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < len_bytes.len() {
        let n = r.read(&mut len_bytes[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(CoreError::TruncatedStream { frame });
        }
        filled += n;
    }
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut crc_bytes = [0u8; 4];
    r.read_exact(&mut crc_bytes)
        .map_err(|_| CoreError::TruncatedStream { frame })?;
    let expected_crc = u32::from_le_bytes(crc_bytes);

    let mut data = vec![0u8; len];
    r.read_exact(&mut data)
        .map_err(|_| CoreError::TruncatedStream { frame })?;

    if crc32c::crc32c(&data) != expected_crc {
        return Err(CoreError::CorruptFrame { frame });
    }
    Ok(Some(data))
}

fn write_header(w: &mut dyn Write, header: &BlobHeader) -> Result<(), CoreError> {
    let json =
        serde_json::to_vec(header).map_err(|e| CoreError::Serialization(e.to_string()))?;
    write_frame(w, &json)
}

fn write_section(w: &mut dyn Write, section: &TypeSection) -> Result<(), CoreError> {
    let bytes = rkyv::to_bytes::<RkyvError>(section)
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    write_frame(w, &bytes)
}

/// Serializes a write engine's state into blob streams.
pub struct BlobWriter<'a> {
    engine: &'a WriteStateEngine,
}

impl<'a> BlobWriter<'a> {
    /// Creates a writer over the given engine.
    #[must_use]
    pub fn new(engine: &'a WriteStateEngine) -> Self {
        Self { engine }
    }

    /// Writes a snapshot of the populated state at `to_version`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on serialization or I/O failure.
    pub fn write_snapshot(&self, to_version: Version, w: &mut dyn Write) -> Result<(), CoreError> {
        let header = BlobHeader {
            format_version: BLOB_FORMAT_VERSION,
            kind: BlobKind::Snapshot,
            from_version: NO_VERSION,
            to_version,
            schemas: self.engine.schemas().into_iter().cloned().collect(),
        };
        write_header(w, &header)?;

        let shard_limit = self.engine.target_max_type_shard_size();
        for (_, type_state) in self.engine.type_states() {
            let mut records: Vec<(u64, Vec<u8>)> = Vec::new();
            let mut section_size = 0u64;
            for (&ordinal, bytes) in &type_state.current {
                let record_size = bytes.len() as u64 + RECORD_SHARD_OVERHEAD;
                if !records.is_empty() && section_size + record_size > shard_limit {
                    write_section(
                        w,
                        &TypeSection {
                            schema: type_state.schema.clone(),
                            removed_ordinals: Vec::new(),
                            records: std::mem::take(&mut records),
                        },
                    )?;
                    section_size = 0;
                }
                records.push((ordinal, bytes.clone()));
                section_size += record_size;
            }
            // Empty types still contribute a section so readers learn the schema.
            write_section(
                w,
                &TypeSection {
                    schema: type_state.schema.clone(),
                    removed_ordinals: Vec::new(),
                    records,
                },
            )?;
        }
        Ok(())
    }

    /// Writes the forward delta from the previous cycle's state to the
    /// populated state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on serialization or I/O failure.
    pub fn write_delta(
        &self,
        from_version: Version,
        to_version: Version,
        w: &mut dyn Write,
    ) -> Result<(), CoreError> {
        self.write_delta_stream(from_version, to_version, BlobKind::Delta, w)
    }

    /// Writes the reverse delta from the populated state back to the
    /// previous cycle's state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on serialization or I/O failure.
    pub fn write_reverse_delta(
        &self,
        from_version: Version,
        to_version: Version,
        w: &mut dyn Write,
    ) -> Result<(), CoreError> {
        self.write_delta_stream(from_version, to_version, BlobKind::ReverseDelta, w)
    }

    fn write_delta_stream(
        &self,
        from_version: Version,
        to_version: Version,
        kind: BlobKind,
        w: &mut dyn Write,
    ) -> Result<(), CoreError> {
        let header = BlobHeader {
            format_version: BLOB_FORMAT_VERSION,
            kind,
            from_version,
            to_version,
            schemas: self.engine.schemas().into_iter().cloned().collect(),
        };
        write_header(w, &header)?;

        for (_, type_state) in self.engine.type_states() {
            // Forward deltas transition previous -> current; reverse deltas
            // swap the roles. Identical ordinals imply identical bytes, so a
            // key diff is a content diff.
            let (source, target) = match kind {
                BlobKind::Delta => (&type_state.previous, &type_state.current),
                BlobKind::ReverseDelta => (&type_state.current, &type_state.previous),
                BlobKind::Snapshot => unreachable!("snapshots take the snapshot path"),
            };
            let removed_ordinals: Vec<u64> = source
                .keys()
                .filter(|ordinal| !target.contains_key(ordinal))
                .copied()
                .collect();
            let records: Vec<(u64, Vec<u8>)> = target
                .iter()
                .filter(|(ordinal, _)| !source.contains_key(ordinal))
                .map(|(&ordinal, bytes)| (ordinal, bytes.clone()))
                .collect();
            if removed_ordinals.is_empty() && records.is_empty() {
                continue;
            }
            write_section(
                w,
                &TypeSection {
                    schema: type_state.schema.clone(),
                    removed_ordinals,
                    records,
                },
            )?;
        }
        Ok(())
    }
}

/// Materializes blob streams into a read engine.
pub struct BlobReader<'a> {
    engine: &'a mut ReadStateEngine,
}

impl<'a> BlobReader<'a> {
    /// Creates a reader materializing into the given engine.
    pub fn new(engine: &'a mut ReadStateEngine) -> Self {
        Self { engine }
    }

    /// Loads a snapshot blob.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnexpectedBlobKind`] if the stream is not a
    /// snapshot, or a codec error on corruption.
    pub fn read_snapshot(&mut self, r: &mut dyn Read) -> Result<BlobHeader, CoreError> {
        self.read_stream(r, BlobKind::Snapshot)
    }

    /// Applies a forward or reverse delta blob.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnexpectedBlobKind`] if the stream is a
    /// snapshot, or a codec error on corruption.
    pub fn apply_delta(&mut self, r: &mut dyn Read) -> Result<BlobHeader, CoreError> {
        self.read_stream(r, BlobKind::Delta)
    }

    fn read_stream(
        &mut self,
        r: &mut dyn Read,
        expected: BlobKind,
    ) -> Result<BlobHeader, CoreError> {
        let header_bytes =
            read_frame(r, 0)?.ok_or(CoreError::TruncatedStream { frame: 0 })?;
        let header: BlobHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| CoreError::Deserialization(e.to_string()))?;

        let kind_matches = match expected {
            BlobKind::Snapshot => header.kind == BlobKind::Snapshot,
            // Forward and reverse deltas share the apply path.
            BlobKind::Delta | BlobKind::ReverseDelta => header.kind != BlobKind::Snapshot,
        };
        if !kind_matches {
            return Err(CoreError::UnexpectedBlobKind {
                expected,
                actual: header.kind,
            });
        }

        let mut frame = 1;
        while let Some(data) = read_frame(r, frame)? {
            let section = rkyv::from_bytes::<TypeSection, RkyvError>(&data)
                .map_err(|e| CoreError::Deserialization(e.to_string()))?;
            self.engine
                .apply_section(&section.schema, &section.removed_ordinals, &section.records)?;
            frame += 1;
        }
        Ok(header)
    }
}
