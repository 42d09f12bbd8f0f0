//! Document store trait definition.

use crate::error::StorageResult;
use crate::query::Query;
use entimap_value::{Document, DocumentKey};

/// Iterator over the documents a query produced.
pub type DocumentIter<'a> = Box<dyn Iterator<Item = Document> + Send + 'a>;

/// The remote document store the mapper talks to.
///
/// The store owns transport, query execution and id assignment. The mapping
/// engine only ever hands it complete documents and reads documents back.
///
/// # Invariants
///
/// - `put` assigns an identifier when the document's key is incomplete and
///   returns exactly what was stored
/// - `run_query` yields documents matching the query's namespace, kind and
///   ancestor filter
/// - `delete` of a key that is not stored succeeds
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral use
pub trait DocumentStore: Send + Sync {
    /// Stores a document, inserting or replacing by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no key or the store fails.
    fn put(&self, document: Document) -> StorageResult<Document>;

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn run_query(&self, query: &Query) -> StorageResult<DocumentIter<'_>>;

    /// Deletes the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is incomplete or the store fails.
    fn delete(&self, key: &DocumentKey) -> StorageResult<()>;
}
