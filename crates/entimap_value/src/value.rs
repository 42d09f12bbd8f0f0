//! Tagged property values.

use crate::document::Document;
use crate::error::{ValueError, ValueResult};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of a [`Value`], used for codec matching and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Null.
    Null,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// Microsecond timestamp.
    Timestamp,
    /// Ordered list of values.
    List,
    /// Nested document.
    Entity,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Timestamp => "timestamp",
            ValueType::List => "list",
            ValueType::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Payload of a property value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ValueData {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Double-precision float.
    Double(f64),
    /// Text string.
    String(String),
    /// Timestamp with microsecond resolution.
    Timestamp(Timestamp),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested document.
    Entity(Document),
}

/// A property value as the document store sees it.
///
/// Every value carries its own `exclude_from_index` flag; for lists the flag
/// applies to each element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Value {
    /// The payload.
    pub data: ValueData,
    /// Whether the store should leave this value out of its indexes.
    #[serde(default)]
    pub exclude_from_index: bool,
}

impl Value {
    /// Creates an indexed value from a payload.
    pub fn new(data: ValueData) -> Self {
        Self {
            data,
            exclude_from_index: false,
        }
    }

    /// Null value.
    pub fn null() -> Self {
        Self::new(ValueData::Null)
    }

    /// Boolean value.
    pub fn bool(b: bool) -> Self {
        Self::new(ValueData::Bool(b))
    }

    /// Integer value.
    pub fn integer(n: i64) -> Self {
        Self::new(ValueData::Integer(n))
    }

    /// Double value.
    pub fn double(d: f64) -> Self {
        Self::new(ValueData::Double(d))
    }

    /// String value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ValueData::String(s.into()))
    }

    /// Timestamp value.
    pub fn timestamp(ts: Timestamp) -> Self {
        Self::new(ValueData::Timestamp(ts))
    }

    /// List value.
    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueData::List(values))
    }

    /// Nested document value.
    pub fn entity(document: Document) -> Self {
        Self::new(ValueData::Entity(document))
    }

    /// Sets the exclude-from-index flag.
    #[must_use]
    pub fn excluded(mut self, exclude: bool) -> Self {
        self.exclude_from_index = exclude;
        self
    }

    /// Returns the tag of this value.
    pub fn value_type(&self) -> ValueType {
        match &self.data {
            ValueData::Null => ValueType::Null,
            ValueData::Bool(_) => ValueType::Bool,
            ValueData::Integer(_) => ValueType::Integer,
            ValueData::Double(_) => ValueType::Double,
            ValueData::String(_) => ValueType::String,
            ValueData::Timestamp(_) => ValueType::Timestamp,
            ValueData::List(_) => ValueType::List,
            ValueData::Entity(_) => ValueType::Entity,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            ValueData::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self.data {
            ValueData::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Get this value as a double, if it is one.
    pub fn as_double(&self) -> Option<f64> {
        match self.data {
            ValueData::Double(d) => Some(d),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a timestamp, if it is one.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self.data {
            ValueData::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.data {
            ValueData::List(values) => Some(values),
            _ => None,
        }
    }

    /// Get this value as a nested document, if it is one.
    pub fn as_entity(&self) -> Option<&Document> {
        match &self.data {
            ValueData::Entity(document) => Some(document),
            _ => None,
        }
    }

    /// Like [`Value::as_bool`], but reports the actual tag on mismatch.
    pub fn expect_bool(&self) -> ValueResult<bool> {
        self.as_bool().ok_or_else(|| self.mismatch(ValueType::Bool))
    }

    /// Like [`Value::as_integer`], but reports the actual tag on mismatch.
    pub fn expect_integer(&self) -> ValueResult<i64> {
        self.as_integer()
            .ok_or_else(|| self.mismatch(ValueType::Integer))
    }

    /// Like [`Value::as_double`], but reports the actual tag on mismatch.
    pub fn expect_double(&self) -> ValueResult<f64> {
        self.as_double().ok_or_else(|| self.mismatch(ValueType::Double))
    }

    /// Like [`Value::as_str`], but reports the actual tag on mismatch.
    pub fn expect_str(&self) -> ValueResult<&str> {
        self.as_str().ok_or_else(|| self.mismatch(ValueType::String))
    }

    /// Like [`Value::as_timestamp`], but reports the actual tag on mismatch.
    pub fn expect_timestamp(&self) -> ValueResult<Timestamp> {
        self.as_timestamp()
            .ok_or_else(|| self.mismatch(ValueType::Timestamp))
    }

    /// Like [`Value::as_list`], but reports the actual tag on mismatch.
    pub fn expect_list(&self) -> ValueResult<&[Value]> {
        self.as_list().ok_or_else(|| self.mismatch(ValueType::List))
    }

    /// Like [`Value::as_entity`], but reports the actual tag on mismatch.
    pub fn expect_entity(&self) -> ValueResult<&Document> {
        self.as_entity().ok_or_else(|| self.mismatch(ValueType::Entity))
    }

    fn mismatch(&self, expected: ValueType) -> ValueError {
        ValueError::type_mismatch(expected, self.value_type())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::timestamp(ts)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::entity(document)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::null()
    }
}
