//! Content checksums over read-state engines.
//!
//! Two engines materialize the same data exactly when their checksums over a
//! shared set of types are equal. The restriction to a shared type set is
//! what makes the checksum usable across adjacent versions whose schema sets
//! differ: callers fix the scope once (the intersection of both engines'
//! types) and compare every checksum under that same scope.

use crate::read::ReadStateEngine;

/// A CRC32C digest over an engine's canonical record iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineChecksum(u32);

impl EngineChecksum {
    /// Computes the checksum of `engine` restricted to the types present in
    /// both `engine` and `other`.
    #[must_use]
    pub fn with_common_schemas(engine: &ReadStateEngine, other: &ReadStateEngine) -> Self {
        let scope = engine.common_type_names(other);
        Self::restricted_to(engine, &scope)
    }

    /// Computes the checksum of `engine` restricted to the named types.
    ///
    /// Types absent from the engine contribute nothing. Iteration order is
    /// the caller's `scope` order, so compare checksums only under an
    /// identical scope.
    #[must_use]
    pub fn restricted_to(engine: &ReadStateEngine, scope: &[String]) -> Self {
        let mut crc = 0u32;
        for type_name in scope {
            let Some(type_state) = engine.type_state(type_name) else {
                continue;
            };
            crc = crc32c::crc32c_append(crc, type_name.as_bytes());
            for (ordinal, bytes) in &type_state.records {
                crc = crc32c::crc32c_append(crc, &ordinal.to_le_bytes());
                crc = crc32c::crc32c_append(crc, bytes);
            }
        }
        Self(crc)
    }

    /// The raw digest value.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EngineChecksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
