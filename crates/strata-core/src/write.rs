//! Mutable write-state engine.
//!
//! The write engine is the producer's staging area for the next dataset
//! version. Each cycle the populator re-adds the full dataset; records whose
//! canonical bytes match a record from the previous cycle keep their ordinal,
//! so unchanged data produces no delta. Ordinals are never reused.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::CoreError;
use crate::read::ReadStateEngine;
use crate::record::Record;
use crate::schema::RecordSchema;

/// Default sizing hint for snapshot type sections: 16 MiB.
pub const DEFAULT_TARGET_MAX_TYPE_SHARD_SIZE: u64 = 16 * 1024 * 1024;

/// Per-type staging state.
#[derive(Debug)]
pub(crate) struct TypeWriteState {
    pub(crate) schema: RecordSchema,
    /// Records of the last prepared-from state (the last announced data).
    pub(crate) previous: BTreeMap<u64, Vec<u8>>,
    /// Records populated for the next state.
    pub(crate) current: BTreeMap<u64, Vec<u8>>,
    /// Canonical bytes to ordinal, covering `previous` plus this cycle's adds.
    by_value: HashMap<Vec<u8>, u64>,
    next_ordinal: u64,
}

impl TypeWriteState {
    fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            previous: BTreeMap::new(),
            current: BTreeMap::new(),
            by_value: HashMap::new(),
            next_ordinal: 0,
        }
    }

    fn add(&mut self, bytes: Vec<u8>) -> u64 {
        if let Some(&ordinal) = self.by_value.get(&bytes) {
            self.current.insert(ordinal, bytes);
            return ordinal;
        }
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        self.by_value.insert(bytes.clone(), ordinal);
        self.current.insert(ordinal, bytes);
        ordinal
    }

    fn rebuild_index_from_previous(&mut self) {
        self.by_value = self
            .previous
            .iter()
            .map(|(&ordinal, bytes)| (bytes.clone(), ordinal))
            .collect();
    }
}

/// Mutable staging for the next dataset version.
#[derive(Debug)]
pub struct WriteStateEngine {
    types: BTreeMap<String, TypeWriteState>,
    target_max_type_shard_size: u64,
    /// Whether any record was added since the last prepare/reset. A cycle
    /// with no write activity is a no-change cycle even though nothing was
    /// re-added.
    writes_this_cycle: bool,
}

impl Default for WriteStateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteStateEngine {
    /// Creates an empty write engine with the default shard-size hint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
            target_max_type_shard_size: DEFAULT_TARGET_MAX_TYPE_SHARD_SIZE,
            writes_this_cycle: false,
        }
    }

    /// Sets the target maximum encoded size of a snapshot type section.
    pub fn set_target_max_type_shard_size(&mut self, bytes: u64) {
        self.target_max_type_shard_size = bytes.max(1);
    }

    /// Returns the snapshot section sizing hint.
    #[must_use]
    pub fn target_max_type_shard_size(&self) -> u64 {
        self.target_max_type_shard_size
    }

    /// Registers a record type.
    ///
    /// Registering an identical schema again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] if the type is already
    /// registered with a different schema.
    pub fn register_type(&mut self, schema: RecordSchema) -> Result<(), CoreError> {
        match self.types.get(&schema.type_name) {
            Some(existing) if existing.schema == schema => Ok(()),
            Some(_) => Err(CoreError::SchemaConflict(schema.type_name)),
            None => {
                debug!(type_name = %schema.type_name, "registered record type");
                self.types
                    .insert(schema.type_name.clone(), TypeWriteState::new(schema));
                Ok(())
            }
        }
    }

    /// Returns the registered schemas in type-name order.
    #[must_use]
    pub fn schemas(&self) -> Vec<&RecordSchema> {
        self.types.values().map(|t| &t.schema).collect()
    }

    /// Whether the named type is registered.
    #[must_use]
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Adds a record to the next state, deduplicating by value.
    ///
    /// Returns the record's ordinal. A record value-equal to one from the
    /// previous cycle keeps its ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownType`] for an unregistered type and
    /// [`CoreError::SchemaMismatch`] if the record does not conform.
    pub fn add_record(&mut self, type_name: &str, record: &Record) -> Result<u64, CoreError> {
        let type_state = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| CoreError::UnknownType(type_name.to_string()))?;
        record.conforms_to(&type_state.schema)?;
        let bytes = record.encode()?;
        self.writes_this_cycle = true;
        Ok(type_state.add(bytes))
    }

    /// Rotates the populated state into the comparison baseline for the
    /// next cycle.
    ///
    /// After this call the engine's current state is empty and deltas are
    /// computed against the rotated-out records.
    pub fn prepare_for_next_cycle(&mut self) {
        for type_state in self.types.values_mut() {
            type_state.previous = std::mem::take(&mut type_state.current);
            type_state.rebuild_index_from_previous();
        }
        self.writes_this_cycle = false;
    }

    /// Whether the populated state differs from the previous cycle's.
    ///
    /// A cycle that performed no writes at all reports no change, so a
    /// freshly restored producer running an empty populator stays on its
    /// restored version.
    #[must_use]
    pub fn has_changed_since_last_cycle(&self) -> bool {
        self.writes_this_cycle && self.types.values().any(|t| t.current != t.previous)
    }

    /// Discards populated edits, restoring the state to what it held
    /// immediately after the last [`prepare_for_next_cycle`] call followed
    /// by a full re-add of the previous data.
    ///
    /// [`prepare_for_next_cycle`]: Self::prepare_for_next_cycle
    pub fn reset_to_last_prepare_for_next_cycle(&mut self) {
        for type_state in self.types.values_mut() {
            type_state.current = type_state.previous.clone();
            type_state.rebuild_index_from_previous();
        }
        self.writes_this_cycle = false;
    }

    /// Whether any type holds populated or baseline records.
    #[must_use]
    pub fn has_records(&self) -> bool {
        self.types
            .values()
            .any(|t| !t.current.is_empty() || !t.previous.is_empty())
    }

    /// Rehydrates this engine from a materialized read state, preserving
    /// ordinal continuity so the next cycle produces a delta against the
    /// restored version.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonEmptyRestoreTarget`] if this engine already
    /// holds records, or [`CoreError::SchemaConflict`] if a restored type
    /// clashes with a registered schema.
    pub fn restore_from(&mut self, read_engine: &ReadStateEngine) -> Result<(), CoreError> {
        if self.has_records() {
            return Err(CoreError::NonEmptyRestoreTarget);
        }
        for schema in read_engine.schemas() {
            self.register_type(schema.clone())?;
        }
        for (type_name, records) in read_engine.all_records() {
            // Registered above, lookup cannot miss.
            if let Some(type_state) = self.types.get_mut(type_name) {
                type_state.current = records.clone();
                type_state.next_ordinal =
                    records.keys().next_back().map_or(0, |&max| max + 1);
                type_state.by_value = records
                    .iter()
                    .map(|(&ordinal, bytes)| (bytes.clone(), ordinal))
                    .collect();
            }
        }
        debug!(types = self.types.len(), "write engine restored from read state");
        Ok(())
    }

    pub(crate) fn type_states(&self) -> impl Iterator<Item = (&String, &TypeWriteState)> {
        self.types.iter()
    }
}
