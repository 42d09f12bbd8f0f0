//! Per-type schema cache.

use super::descriptor::Schema;
use crate::error::MapperResult;
use crate::types::RecordType;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Derives each type's schema once and shares it afterwards.
///
/// Derivation runs outside the lock; when two callers race on the same type
/// the first one to insert wins and both receive that schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema of `record_type`, deriving it on first use.
    ///
    /// # Errors
    ///
    /// Returns the schema error if derivation fails. Failures are not cached.
    pub fn get(&self, record_type: &RecordType) -> MapperResult<Arc<Schema>> {
        if let Some(schema) = self.schemas.read().get(&record_type.id()) {
            return Ok(Arc::clone(schema));
        }

        let derived = Arc::new(record_type.describe()?);
        debug!(
            type_name = record_type.name(),
            kind = derived.kind(),
            fields = derived.fields().len(),
            "derived schema"
        );

        let mut schemas = self.schemas.write();
        Ok(Arc::clone(schemas.entry(record_type.id()).or_insert(derived)))
    }

    /// Returns `true` if the schema of `record_type` is already derived.
    #[must_use]
    pub fn contains(&self, record_type: &RecordType) -> bool {
        self.schemas.read().contains_key(&record_type.id())
    }

    /// Number of cached schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
