//! Immutable read-state engine.
//!
//! A read engine materializes one published dataset version: per type, an
//! ordinal-ordered record map plus a value index for equality lookups.
//! Engines are built by loading a snapshot blob and advanced by applying
//! delta blobs; both paths go through [`crate::blob::BlobReader`].

use std::collections::{BTreeMap, HashMap};

use crate::error::CoreError;
use crate::record::Record;
use crate::schema::RecordSchema;

/// Per-type materialized state.
#[derive(Debug, Clone)]
pub(crate) struct TypeReadState {
    pub(crate) schema: RecordSchema,
    pub(crate) records: BTreeMap<u64, Vec<u8>>,
    by_value: HashMap<Vec<u8>, u64>,
}

/// Immutable materialization of one dataset version.
#[derive(Debug, Clone, Default)]
pub struct ReadStateEngine {
    types: BTreeMap<String, TypeReadState>,
}

impl ReadStateEngine {
    /// Creates an empty read engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the materialized schemas in type-name order.
    #[must_use]
    pub fn schemas(&self) -> Vec<&RecordSchema> {
        self.types.values().map(|t| &t.schema).collect()
    }

    /// Returns the type names present in both this engine and `other`,
    /// in sorted order.
    #[must_use]
    pub fn common_type_names(&self, other: &Self) -> Vec<String> {
        self.types
            .keys()
            .filter(|name| other.types.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Whether the named type is materialized.
    #[must_use]
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Number of records materialized for the named type.
    #[must_use]
    pub fn record_count(&self, type_name: &str) -> usize {
        self.types.get(type_name).map_or(0, |t| t.records.len())
    }

    /// Returns the canonical bytes of a record, if present.
    #[must_use]
    pub fn record_bytes(&self, type_name: &str, ordinal: u64) -> Option<&[u8]> {
        self.types
            .get(type_name)?
            .records
            .get(&ordinal)
            .map(Vec::as_slice)
    }

    /// Decodes a record by ordinal.
    ///
    /// Returns `Ok(None)` if the type or ordinal is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Deserialization`] if the stored bytes do not
    /// decode.
    pub fn record(&self, type_name: &str, ordinal: u64) -> Result<Option<Record>, CoreError> {
        match self.record_bytes(type_name, ordinal) {
            Some(bytes) => Ok(Some(Record::decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Looks up the ordinal of a value-equal record, without scanning.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the probe record cannot be
    /// encoded.
    pub fn find_ordinal(
        &self,
        type_name: &str,
        record: &Record,
    ) -> Result<Option<u64>, CoreError> {
        let Some(type_state) = self.types.get(type_name) else {
            return Ok(None);
        };
        let bytes = record.encode()?;
        Ok(type_state.by_value.get(&bytes).copied())
    }

    /// Ordinals materialized for the named type, in ascending order.
    #[must_use]
    pub fn ordinals(&self, type_name: &str) -> Vec<u64> {
        self.types
            .get(type_name)
            .map(|t| t.records.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Adopts a type section: registers the schema if the type is new, then
    /// removes and inserts records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] if the section's schema clashes
    /// with the materialized one.
    pub(crate) fn apply_section(
        &mut self,
        schema: &RecordSchema,
        removed_ordinals: &[u64],
        records: &[(u64, Vec<u8>)],
    ) -> Result<(), CoreError> {
        let type_state = match self.types.entry(schema.type_name.clone()) {
            std::collections::btree_map::Entry::Occupied(entry) => {
                let state = entry.into_mut();
                if state.schema != *schema {
                    return Err(CoreError::SchemaConflict(schema.type_name.clone()));
                }
                state
            }
            std::collections::btree_map::Entry::Vacant(entry) => entry.insert(TypeReadState {
                schema: schema.clone(),
                records: BTreeMap::new(),
                by_value: HashMap::new(),
            }),
        };
        for ordinal in removed_ordinals {
            if let Some(bytes) = type_state.records.remove(ordinal) {
                type_state.by_value.remove(&bytes);
            }
        }
        for (ordinal, bytes) in records {
            type_state.by_value.insert(bytes.clone(), *ordinal);
            type_state.records.insert(*ordinal, bytes.clone());
        }
        Ok(())
    }

    /// All materialized records, per type, for write-engine rehydration.
    pub(crate) fn all_records(&self) -> impl Iterator<Item = (&String, &BTreeMap<u64, Vec<u8>>)> {
        self.types.iter().map(|(name, t)| (name, &t.records))
    }

    pub(crate) fn type_state(&self, type_name: &str) -> Option<&TypeReadState> {
        self.types.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use crate::schema::{FieldKind, SchemaField};

    fn movie_schema() -> RecordSchema {
        RecordSchema::new(
            "Movie",
            vec![
                SchemaField::new("title", FieldKind::String),
                SchemaField::new("year", FieldKind::Int),
            ],
        )
    }

    fn movie(title: &str, year: i64) -> Record {
        Record::new(vec![
            FieldValue::String(title.into()),
            FieldValue::Int(year),
        ])
    }

    fn engine_with(records: &[(u64, Record)]) -> ReadStateEngine {
        let mut engine = ReadStateEngine::new();
        let encoded: Vec<(u64, Vec<u8>)> = records
            .iter()
            .map(|(ordinal, r)| (*ordinal, r.encode().unwrap()))
            .collect();
        engine
            .apply_section(&movie_schema(), &[], &encoded)
            .unwrap();
        engine
    }

    #[test]
    fn test_record_access_by_ordinal() {
        let engine = engine_with(&[(0, movie("Heat", 1995)), (1, movie("Ronin", 1998))]);
        assert_eq!(engine.record("Movie", 1).unwrap(), Some(movie("Ronin", 1998)));
        assert_eq!(engine.record("Movie", 9).unwrap(), None);
        assert_eq!(engine.record("Actor", 0).unwrap(), None);
    }

    #[test]
    fn test_find_ordinal_by_value() {
        let engine = engine_with(&[(0, movie("Heat", 1995)), (1, movie("Ronin", 1998))]);
        assert_eq!(
            engine.find_ordinal("Movie", &movie("Heat", 1995)).unwrap(),
            Some(0)
        );
        assert_eq!(
            engine.find_ordinal("Movie", &movie("Heat", 1996)).unwrap(),
            None
        );
    }

    #[test]
    fn test_apply_section_removals() {
        let mut engine = engine_with(&[(0, movie("Heat", 1995)), (1, movie("Ronin", 1998))]);
        engine.apply_section(&movie_schema(), &[0], &[]).unwrap();
        assert_eq!(engine.record_count("Movie"), 1);
        assert_eq!(
            engine.find_ordinal("Movie", &movie("Heat", 1995)).unwrap(),
            None
        );
        assert_eq!(engine.ordinals("Movie"), vec![1]);
    }

    #[test]
    fn test_common_type_names() {
        let movies = engine_with(&[(0, movie("Heat", 1995))]);
        let mut both = engine_with(&[(0, movie("Heat", 1995))]);
        both.apply_section(
            &RecordSchema::new("Actor", vec![SchemaField::new("name", FieldKind::String)]),
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(both.common_type_names(&movies), vec!["Movie".to_string()]);
    }
}
