//! Error types for the document model.

use crate::value::ValueType;
use thiserror::Error;

/// Result type for document model operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised when reading typed data out of documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A value carried a different tag than the caller required.
    #[error("expected {expected} value, found {actual}")]
    TypeMismatch {
        /// Tag the caller required.
        expected: ValueType,
        /// Tag the value actually carries.
        actual: ValueType,
    },

    /// A document had no property under the requested name.
    #[error("missing property: {name}")]
    MissingProperty {
        /// Name of the missing property.
        name: String,
    },
}

impl ValueError {
    /// Create a type mismatch error.
    pub fn type_mismatch(expected: ValueType, actual: ValueType) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    /// Create a missing property error.
    pub fn missing_property(name: impl Into<String>) -> Self {
        Self::MissingProperty { name: name.into() }
    }
}
