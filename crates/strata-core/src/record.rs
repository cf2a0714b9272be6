//! Record values and their canonical encoding.
//!
//! A [`Record`] is an ordered list of [`FieldValue`]s matching its schema
//! positionally. The canonical byte form of a record is its rkyv encoding;
//! two records are value-equal exactly when their canonical bytes are equal,
//! which is what the engines' dedup indexes rely on.

use rkyv::rancor::Error as RkyvError;

use crate::error::CoreError;
use crate::schema::{FieldKind, RecordSchema};

// Module to contain types that use derive macros with generated code.
mod record_types {
    #![allow(missing_docs)] // Allow for derive-generated code

    use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

    /// A single field value of a record.
    #[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
    pub enum FieldValue {
        /// Absent value; conforms to any field kind.
        Null,
        /// A boolean.
        Bool(bool),
        /// A signed 64-bit integer.
        Int(i64),
        /// A 64-bit float.
        Float(f64),
        /// A UTF-8 string.
        String(String),
        /// An opaque byte sequence.
        Bytes(Vec<u8>),
        /// A reference to a record of another type, held by ordinal.
        Reference {
            /// The referenced record type.
            type_name: String,
            /// Ordinal of the referenced record within that type.
            ordinal: u64,
        },
    }

    /// An ordered list of field values matching a schema positionally.
    #[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
    pub struct Record {
        /// The field values, one per schema field.
        pub values: Vec<FieldValue>,
    }
}

pub use record_types::{FieldValue, Record};

impl FieldValue {
    /// Whether this value conforms to the given field kind.
    #[must_use]
    pub fn matches_kind(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Self::Null, _)
            | (Self::Bool(_), FieldKind::Bool)
            | (Self::Int(_), FieldKind::Int)
            | (Self::Float(_), FieldKind::Float)
            | (Self::String(_), FieldKind::String)
            | (Self::Bytes(_), FieldKind::Bytes) => true,
            (Self::Reference { type_name, .. }, FieldKind::Reference(target)) => {
                type_name == target
            }
            _ => false,
        }
    }
}

impl Record {
    /// Creates a record from its field values.
    #[must_use]
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    /// Encodes the record into its canonical byte form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let bytes = rkyv::to_bytes::<RkyvError>(self)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Decodes a record from its canonical byte form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Deserialization`] if the bytes are not a valid
    /// record encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        rkyv::from_bytes::<Self, RkyvError>(bytes)
            .map_err(|e| CoreError::Deserialization(e.to_string()))
    }

    /// Checks that this record conforms to the given schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaMismatch`] on an arity or field-kind
    /// mismatch.
    pub fn conforms_to(&self, schema: &RecordSchema) -> Result<(), CoreError> {
        if self.values.len() != schema.fields.len() {
            return Err(CoreError::SchemaMismatch {
                type_name: schema.type_name.clone(),
                detail: format!(
                    "expected {} fields, record has {}",
                    schema.fields.len(),
                    self.values.len()
                ),
            });
        }
        for (value, field) in self.values.iter().zip(&schema.fields) {
            if !value.matches_kind(&field.kind) {
                return Err(CoreError::SchemaMismatch {
                    type_name: schema.type_name.clone(),
                    detail: format!("field '{}' holds a value of the wrong kind", field.name),
                });
            }
        }
        Ok(())
    }
}
