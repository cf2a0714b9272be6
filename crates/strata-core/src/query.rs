//! Field-value match queries over a read-state engine.
//!
//! Finds every record holding a given value in a same-named field. A query
//! against a reference field traverses one level: when the referenced type
//! holds single-field records (a common shape for interned strings and
//! numbers), the probe is matched against that field and the referencing
//! records are returned.

use crate::error::CoreError;
use crate::read::ReadStateEngine;
use crate::record::FieldValue;
use crate::schema::FieldKind;

/// One matched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    /// The matched record's type.
    pub type_name: String,
    /// The matched record's ordinal.
    pub ordinal: u64,
}

/// Field-value matcher over one read engine.
pub struct FieldMatchQuery<'a> {
    engine: &'a ReadStateEngine,
}

impl<'a> FieldMatchQuery<'a> {
    /// Creates a query over the given engine.
    #[must_use]
    pub fn new(engine: &'a ReadStateEngine) -> Self {
        Self { engine }
    }

    /// Finds matching records across every materialized type.
    ///
    /// Results are ordered by type name, then ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Deserialization`] if a materialized record does
    /// not decode.
    pub fn find_matching_records(
        &self,
        field_name: &str,
        value: &FieldValue,
    ) -> Result<Vec<FieldMatch>, CoreError> {
        let mut matches = Vec::new();
        for schema in self.engine.schemas() {
            let type_name = schema.type_name.clone();
            self.augment_matches(&type_name, field_name, value, &mut matches)?;
        }
        Ok(matches)
    }

    /// Finds matching records within one type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Deserialization`] if a materialized record does
    /// not decode.
    pub fn find_matching_records_in_type(
        &self,
        type_name: &str,
        field_name: &str,
        value: &FieldValue,
    ) -> Result<Vec<FieldMatch>, CoreError> {
        let mut matches = Vec::new();
        if self.engine.has_type(type_name) {
            self.augment_matches(type_name, field_name, value, &mut matches)?;
        }
        Ok(matches)
    }

    fn augment_matches(
        &self,
        type_name: &str,
        field_name: &str,
        value: &FieldValue,
        matches: &mut Vec<FieldMatch>,
    ) -> Result<(), CoreError> {
        let Some(type_state) = self.engine.type_state(type_name) else {
            return Ok(());
        };
        for (position, field) in type_state.schema.fields.iter().enumerate() {
            if field.name != field_name {
                continue;
            }
            let ordinals = if let FieldKind::Reference(target) = &field.kind {
                let referenced = self.reference_traversal(target, value)?;
                match referenced {
                    Some(referenced) => {
                        self.ordinals_referencing(type_name, position, target, &referenced)?
                    }
                    None => Vec::new(),
                }
            } else if value.matches_kind(&field.kind) {
                self.ordinals_with_value(type_name, position, value)?
            } else {
                Vec::new()
            };
            matches.extend(ordinals.into_iter().map(|ordinal| FieldMatch {
                type_name: type_name.to_string(),
                ordinal,
            }));
        }
        Ok(())
    }

    /// Matches the probe against a referenced type holding single-field
    /// records, following single-field reference chains.
    fn reference_traversal(
        &self,
        type_name: &str,
        value: &FieldValue,
    ) -> Result<Option<Vec<u64>>, CoreError> {
        let Some(type_state) = self.engine.type_state(type_name) else {
            return Ok(None);
        };
        if type_state.schema.fields.len() != 1 {
            return Ok(None);
        }
        match &type_state.schema.fields[0].kind {
            FieldKind::Reference(next) => {
                let Some(referenced) = self.reference_traversal(next, value)? else {
                    return Ok(None);
                };
                Ok(Some(self.ordinals_referencing(
                    type_name, 0, next, &referenced,
                )?))
            }
            kind if value.matches_kind(kind) => {
                Ok(Some(self.ordinals_with_value(type_name, 0, value)?))
            }
            _ => Ok(None),
        }
    }

    fn ordinals_with_value(
        &self,
        type_name: &str,
        position: usize,
        value: &FieldValue,
    ) -> Result<Vec<u64>, CoreError> {
        let mut ordinals = Vec::new();
        for ordinal in self.engine.ordinals(type_name) {
            if let Some(record) = self.engine.record(type_name, ordinal)? {
                if record.values.get(position) == Some(value) {
                    ordinals.push(ordinal);
                }
            }
        }
        Ok(ordinals)
    }

    fn ordinals_referencing(
        &self,
        type_name: &str,
        position: usize,
        target_type: &str,
        referenced: &[u64],
    ) -> Result<Vec<u64>, CoreError> {
        let mut ordinals = Vec::new();
        for ordinal in self.engine.ordinals(type_name) {
            if let Some(record) = self.engine.record(type_name, ordinal)? {
                if let Some(FieldValue::Reference {
                    type_name: ref_type,
                    ordinal: ref_ordinal,
                }) = record.values.get(position)
                {
                    if ref_type == target_type && referenced.contains(ref_ordinal) {
                        ordinals.push(ordinal);
                    }
                }
            }
        }
        Ok(ordinals)
    }
}
