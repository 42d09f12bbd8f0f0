//! Documents: a key plus named property values.

use crate::error::{ValueError, ValueResult};
use crate::key::DocumentKey;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The record exchanged with the document store.
///
/// Nested documents inside [`Value::entity`] usually carry no key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Key of the document, if it has one.
    pub key: Option<DocumentKey>,
    /// Properties by name.
    pub properties: BTreeMap<String, Value>,
}

impl Document {
    /// Creates an empty document without a key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document with the given key.
    pub fn with_key(key: DocumentKey) -> Self {
        Self {
            key: Some(key),
            properties: BTreeMap::new(),
        }
    }

    /// Returns the property with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Returns the property with the given name or a [`ValueError::MissingProperty`].
    pub fn require(&self, name: &str) -> ValueResult<&Value> {
        self.get(name)
            .ok_or_else(|| ValueError::missing_property(name))
    }

    /// Returns `true` if a property with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Sets a property, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(name.into(), value.into())
    }

    /// Builder-style [`Document::set`].
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Removes a property.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// Copies every property of `other` into this document, overwriting on
    /// name clashes. The key of `other` is ignored.
    pub fn extend(&mut self, other: Document) {
        self.properties.extend(other.properties);
    }

    /// Iterates over properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
