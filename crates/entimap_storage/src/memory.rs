//! In-memory document store for testing.

use crate::backend::{DocumentIter, DocumentStore};
use crate::error::{StorageError, StorageResult};
use crate::query::Query;
use entimap_value::{Document, DocumentKey, Key};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;

/// An in-memory document store.
///
/// Documents are kept in key order. Incomplete keys receive sequential
/// numeric identifiers starting at 1, shared across all kinds.
///
/// This store is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral use where nothing has to survive the process
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use entimap_storage::{DocumentStore, InMemoryStore, Query};
/// use entimap_value::{Document, DocumentKey, Key, Namespace};
///
/// let store = InMemoryStore::new();
/// let ns = Namespace::new("tenant-a");
/// let stored = store
///     .put(Document::with_key(DocumentKey::new(&ns, "Person")).property("age", 42i64))
///     .unwrap();
/// assert_eq!(stored.key.unwrap().id, Some(Key::Id(1)));
/// assert_eq!(store.run_query(&Query::kind(&ns, "Person")).unwrap().count(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    documents: RwLock<BTreeMap<DocumentKey, Document>>,
    next_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document stored under `key`.
    #[must_use]
    pub fn get(&self, key: &DocumentKey) -> Option<Document> {
        self.documents.read().get(key).cloned()
    }

    /// Returns a copy of every stored document, in key order.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().values().cloned().collect()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Removes every document.
    pub fn clear(&self) {
        self.documents.write().clear();
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl DocumentStore for InMemoryStore {
    fn put(&self, mut document: Document) -> StorageResult<Document> {
        let mut key = document.key.take().ok_or(StorageError::MissingKey)?;
        if !key.is_complete() {
            key.id = Some(Key::Id(self.allocate_id()));
        }
        trace!(key = %key, properties = document.len(), "put document");

        document.key = Some(key.clone());
        self.documents.write().insert(key, document.clone());
        Ok(document)
    }

    fn run_query(&self, query: &Query) -> StorageResult<DocumentIter<'_>> {
        let documents = self.documents.read();
        let matching = documents.values().filter(|doc| query.matches(doc)).cloned();
        let results: Vec<Document> = match query.max_results() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        };
        trace!(query = %query, results = results.len(), "ran query");
        Ok(Box::new(results.into_iter()))
    }

    fn delete(&self, key: &DocumentKey) -> StorageResult<()> {
        if !key.is_complete() {
            return Err(StorageError::incomplete_key(key));
        }
        let removed = self.documents.write().remove(key).is_some();
        trace!(key = %key, removed, "delete document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entimap_value::{Ancestor, Namespace, Value};

    fn ns() -> Namespace {
        Namespace::new("tenant-a")
    }

    fn person(id: Option<i64>) -> Document {
        let key = DocumentKey::new(&ns(), "Person");
        let key = match id {
            Some(id) => key.with_id(id),
            None => key,
        };
        Document::with_key(key).property("name", "Alice")
    }

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn memory_put_assigns_sequential_ids() {
        let store = InMemoryStore::new();

        let first = store.put(person(None)).unwrap();
        let second = store.put(person(None)).unwrap();

        assert_eq!(first.key.unwrap().id, Some(Key::Id(1)));
        assert_eq!(second.key.unwrap().id, Some(Key::Id(2)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn memory_put_keeps_complete_key() {
        let store = InMemoryStore::new();
        let stored = store.put(person(Some(42))).unwrap();
        assert_eq!(stored.key.as_ref().unwrap().id, Some(Key::Id(42)));
        assert_eq!(store.get(stored.key.as_ref().unwrap()), Some(stored));
    }

    #[test]
    fn memory_put_replaces_by_key() {
        let store = InMemoryStore::new();
        store.put(person(Some(1))).unwrap();
        let mut updated = person(Some(1));
        updated.set("name", "Bob");
        store.put(updated).unwrap();

        assert_eq!(store.len(), 1);
        let key = DocumentKey::new(&ns(), "Person").with_id(1);
        assert_eq!(
            store.get(&key).unwrap().get("name"),
            Some(&Value::string("Bob"))
        );
    }

    #[test]
    fn memory_put_without_key_fails() {
        let store = InMemoryStore::new();
        let result = store.put(Document::new());
        assert!(matches!(result, Err(StorageError::MissingKey)));
    }

    #[test]
    fn memory_query_filters_by_ancestor() {
        let store = InMemoryStore::new();
        let company = DocumentKey::new(&ns(), "Company").with_id(7);
        store.put(Document::with_key(company.clone())).unwrap();
        store
            .put(Document::with_key(
                DocumentKey::new(&ns(), "Person").with_ancestors(vec![Ancestor::id("Company", 7)]),
            ))
            .unwrap();
        store.put(person(None)).unwrap();

        let all = store.run_query(&Query::kind(&ns(), "Person")).unwrap().count();
        let under = store
            .run_query(&Query::kind(&ns(), "Person").has_ancestor(company))
            .unwrap()
            .count();
        assert_eq!(all, 2);
        assert_eq!(under, 1);
    }

    #[test]
    fn memory_query_respects_limit() {
        let store = InMemoryStore::new();
        for _ in 0..5 {
            store.put(person(None)).unwrap();
        }
        let query = Query::kind(&ns(), "Person").limit(3);
        assert_eq!(store.run_query(&query).unwrap().count(), 3);
    }

    #[test]
    fn memory_delete_is_idempotent() {
        let store = InMemoryStore::new();
        let stored = store.put(person(None)).unwrap();
        let key = stored.key.unwrap();

        store.delete(&key).unwrap();
        store.delete(&key).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn memory_delete_incomplete_key_fails() {
        let store = InMemoryStore::new();
        let result = store.delete(&DocumentKey::new(&ns(), "Person"));
        assert!(matches!(result, Err(StorageError::IncompleteKey { .. })));
    }

    #[test]
    fn memory_clear() {
        let store = InMemoryStore::new();
        store.put(person(None)).unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn memory_assigned_ids_are_unique(count in 1usize..40) {
                let store = InMemoryStore::new();
                let mut ids = std::collections::BTreeSet::new();
                for _ in 0..count {
                    let stored = store.put(person(None)).unwrap();
                    ids.insert(stored.key.unwrap().id);
                }
                prop_assert_eq!(ids.len(), count);
                prop_assert_eq!(store.len(), count);
            }
        }
    }
}
