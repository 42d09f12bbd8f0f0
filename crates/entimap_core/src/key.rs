//! Key and ancestor path construction.

use crate::config::MapperConfig;
use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::record::Record;
use crate::schema::{FieldRole, Schema};
use entimap_value::{Ancestor, DocumentKey, Key, KeyKind, Namespace};
use std::collections::BTreeMap;
use tracing::trace;
use uuid::Uuid;

/// Builds document keys from a record's key and ancestor fields, and writes
/// stored keys back into records.
#[derive(Debug, Clone, Copy)]
pub struct KeyBuilder<'a> {
    config: &'a MapperConfig,
}

impl<'a> KeyBuilder<'a> {
    /// Creates a builder using `config` for the default project.
    pub fn new(config: &'a MapperConfig) -> Self {
        Self { config }
    }

    /// Builds the key for `record`.
    ///
    /// The record's own ancestors are placed by their declared order; `extra`
    /// ancestors occupy the lowest positions when `prepend` is set and the
    /// highest otherwise. A non-zero `Long` key or non-empty `String` key is
    /// used as is. An empty `String` key gets a random UUID. Anything else
    /// leaves the key incomplete for the store to fill in.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MissingAncestor`] if an ancestor field is null,
    /// zero or empty.
    pub fn create_key(
        &self,
        schema: &Schema,
        namespace: &Namespace,
        record: &dyn Record,
        extra: &[Ancestor],
        prepend: bool,
    ) -> MapperResult<DocumentKey> {
        let own = Self::own_ancestors(schema, record)?;
        let own_count = own.len();
        let extra_count = extra.len();

        let mut ordered = BTreeMap::new();
        for (order, ancestor) in own {
            let position = order + if prepend { extra_count } else { 0 };
            ordered.insert(position, ancestor);
        }
        for (index, ancestor) in extra.iter().enumerate() {
            let position = index + 1 + if prepend { 0 } else { own_count };
            ordered.insert(position, ancestor.clone());
        }

        let namespace = self.config.scope(namespace);
        let mut key = DocumentKey::new(&namespace, schema.kind())
            .with_ancestors(ordered.into_values().collect());
        if let Some(id) = Self::identifier(schema, record)? {
            key = key.with_id(id);
        }
        trace!(type_name = schema.name(), key = %key, "created key");
        Ok(key)
    }

    fn own_ancestors(schema: &Schema, record: &dyn Record) -> MapperResult<Vec<(usize, Ancestor)>> {
        schema
            .ancestor_fields()
            .filter_map(|field| match field.role() {
                FieldRole::Ancestor { kind, order, .. } => Some((field.name(), kind, *order)),
                _ => None,
            })
            .map(|(name, kind, order)| {
                let missing = || MapperError::missing_ancestor(schema.name(), name);
                let key = match record.get_field(name) {
                    Some(Dynamic::Long(id)) if id != 0 => Key::Id(id),
                    Some(Dynamic::String(s)) if !s.is_empty() => Key::Name(s),
                    _ => return Err(missing()),
                };
                let position = usize::try_from(order).map_err(|_| missing())?;
                Ok((position, Ancestor::new(kind.clone(), key)))
            })
            .collect()
    }

    fn identifier(schema: &Schema, record: &dyn Record) -> MapperResult<Option<Key>> {
        let Some(field) = schema.key_field() else {
            return Ok(None);
        };
        let FieldRole::Key(key_kind) = field.role() else {
            return Ok(None);
        };
        let value = record
            .get_field(field.name())
            .ok_or_else(|| MapperError::unknown_field(schema.name(), field.name()))?;

        Ok(match (key_kind, value) {
            (KeyKind::Long, Dynamic::Long(id)) if id != 0 => Some(Key::Id(id)),
            (KeyKind::Long, _) => None,
            (KeyKind::String, Dynamic::String(name)) if !name.is_empty() => Some(Key::Name(name)),
            (KeyKind::String, _) => Some(Key::Name(Uuid::new_v4().to_string())),
        })
    }

    /// Copies `key` into the record's ancestor and key fields.
    ///
    /// Ancestor elements are matched to fields by kind; elements without a
    /// matching field are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::KeyMismatch`] if an element's representation
    /// differs from what its field declares.
    pub fn write_key_fields(&self, schema: &Schema, record: &mut dyn Record, key: &DocumentKey) -> MapperResult<()> {
        for ancestor in &key.ancestors {
            let target = schema.ancestor_fields().find_map(|field| match field.role() {
                FieldRole::Ancestor { kind, key_kind, .. } if *kind == ancestor.kind => {
                    Some((field.name(), *key_kind))
                }
                _ => None,
            });
            if let Some((field, key_kind)) = target {
                Self::write_one(record, field, &ancestor.kind, key_kind, &ancestor.key)?;
            }
        }

        if let (Some(field), Some(id)) = (schema.key_field(), &key.id) {
            if let FieldRole::Key(key_kind) = field.role() {
                Self::write_one(record, field.name(), &key.kind, *key_kind, id)?;
            }
        }
        Ok(())
    }

    fn write_one(record: &mut dyn Record, field: &str, kind: &str, expected: KeyKind, key: &Key) -> MapperResult<()> {
        if key.kind() != expected {
            return Err(MapperError::KeyMismatch {
                field: field.to_string(),
                kind: kind.to_string(),
                expected,
                actual: key.kind(),
            });
        }
        let value = match key {
            Key::Id(id) => Dynamic::Long(*id),
            Key::Name(name) => Dynamic::String(name.clone()),
        };
        record.set_field(field, value)
    }
}
