//! Error types for document store operations.

use thiserror::Error;

/// Result type for document store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A document was put without a key.
    #[error("document has no key")]
    MissingKey,

    /// An operation required a complete key.
    #[error("key is incomplete: {key}")]
    IncompleteKey {
        /// Rendered form of the offending key.
        key: String,
    },

    /// The backing store failed.
    #[error("store error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StorageError {
    /// Create an incomplete key error.
    pub fn incomplete_key(key: impl ToString) -> Self {
        Self::IncompleteKey {
            key: key.to_string(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
