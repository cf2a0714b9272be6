//! Object-to-record mapping for strongly-typed values.
//!
//! The [`ObjectMapper`] owns the write engine and converts user types into
//! engine records through the [`DataRecord`] trait.

use crate::error::CoreError;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::write::WriteStateEngine;

/// A strongly-typed value that maps onto one engine record type.
pub trait DataRecord {
    /// The schema of this type's records.
    fn schema() -> RecordSchema;

    /// Converts this value into its record form.
    fn to_record(&self) -> Record;
}

/// Binds a write engine to strongly-typed values.
#[derive(Debug, Default)]
pub struct ObjectMapper {
    engine: WriteStateEngine,
}

impl ObjectMapper {
    /// Creates a mapper over the given engine.
    #[must_use]
    pub fn new(engine: WriteStateEngine) -> Self {
        Self { engine }
    }

    /// Creates a fresh mapper whose empty engine carries the same schemas
    /// and sizing hint as `other`'s.
    ///
    /// Used by the restore path, which must rehydrate into an engine that
    /// holds no records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] if `other`'s schemas clash,
    /// which cannot happen for a well-formed mapper.
    pub fn with_schemas_of(other: &Self) -> Result<Self, CoreError> {
        let mut engine = WriteStateEngine::new();
        engine.set_target_max_type_shard_size(other.engine.target_max_type_shard_size());
        for schema in other.engine.schemas() {
            engine.register_type(schema.clone())?;
        }
        Ok(Self { engine })
    }

    /// Registers `T`'s record type with the engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaConflict`] on a clashing registration.
    pub fn initialize_type<T: DataRecord>(&mut self) -> Result<(), CoreError> {
        self.engine.register_type(T::schema())
    }

    /// Adds a typed value to the next state, registering its type on first
    /// use.
    ///
    /// Returns the record's ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] on schema conflicts or encoding failure.
    pub fn add<T: DataRecord>(&mut self, value: &T) -> Result<u64, CoreError> {
        let schema = T::schema();
        if !self.engine.has_type(&schema.type_name) {
            self.engine.register_type(schema.clone())?;
        }
        self.engine.add_record(&schema.type_name, &value.to_record())
    }

    /// Adds a raw record to the next state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the type is unknown or the record does not
    /// conform.
    pub fn add_record(&mut self, type_name: &str, record: &Record) -> Result<u64, CoreError> {
        self.engine.add_record(type_name, record)
    }

    /// The underlying write engine.
    #[must_use]
    pub fn engine(&self) -> &WriteStateEngine {
        &self.engine
    }

    /// The underlying write engine, mutably.
    pub fn engine_mut(&mut self) -> &mut WriteStateEngine {
        &mut self.engine
    }
}
