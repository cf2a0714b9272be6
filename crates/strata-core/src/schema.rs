//! Record schemas.
//!
//! A [`RecordSchema`] names a record type and lists its fields in order.
//! Schemas travel in blob headers (JSON) and inside type sections (rkyv),
//! so they carry both derive families.

// Module to contain types that use derive macros with generated code.
mod schema_types {
    #![allow(missing_docs)] // Allow for derive-generated code

    use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

    /// The kind of value a schema field holds.
    #[derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        serde::Serialize,
        serde::Deserialize,
        Archive,
        RkyvSerialize,
        RkyvDeserialize,
    )]
    pub enum FieldKind {
        /// A boolean.
        Bool,
        /// A signed 64-bit integer.
        Int,
        /// A 64-bit float.
        Float,
        /// A UTF-8 string.
        String,
        /// An opaque byte sequence.
        Bytes,
        /// A reference to a record of the named type, held by ordinal.
        Reference(std::string::String),
    }

    /// A single named field of a record schema.
    #[derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        serde::Serialize,
        serde::Deserialize,
        Archive,
        RkyvSerialize,
        RkyvDeserialize,
    )]
    pub struct SchemaField {
        /// Field name, unique within its schema.
        pub name: String,
        /// The kind of value the field holds.
        pub kind: FieldKind,
    }

    /// The schema of one record type.
    #[derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        serde::Serialize,
        serde::Deserialize,
        Archive,
        RkyvSerialize,
        RkyvDeserialize,
    )]
    pub struct RecordSchema {
        /// The record type name, unique within a dataset.
        pub type_name: String,
        /// Ordered fields; records hold values positionally.
        pub fields: Vec<SchemaField>,
    }
}

pub use schema_types::{FieldKind, RecordSchema, SchemaField};

impl SchemaField {
    /// Creates a field with the given name and kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl RecordSchema {
    /// Creates a schema from a type name and its fields.
    pub fn new(type_name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Returns the position of the named field, if present.
    #[must_use]
    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
