//! Typed operations over a document store.

use crate::dynamic::Dynamic;
use crate::error::MapperResult;
use crate::external::ExternalRepository;
use crate::mapper::EntityMapper;
use crate::record::Entity;
use crate::repository::Repository;
use crate::types::RecordType;
use entimap_storage::{DocumentStore, Query};
use entimap_value::{Ancestor, Document, DocumentKey, Key, Namespace};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes entities through a [`DocumentStore`].
///
/// Cheap to clone; clones share the store and the mapper.
#[derive(Clone)]
pub struct EntityStore {
    store: Arc<dyn DocumentStore>,
    mapper: Arc<EntityMapper>,
}

impl EntityStore {
    /// Composes `store` and `mapper`.
    pub fn new(store: Arc<dyn DocumentStore>, mapper: Arc<EntityMapper>) -> Self {
        Self { store, mapper }
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &Arc<EntityMapper> {
        &self.mapper
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Fetches the `T` identified by `key` under `ancestors`.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn get<T: Entity>(&self, namespace: &Namespace, key: impl Into<Key>, ancestors: &[Ancestor]) -> MapperResult<Option<T>> {
        let namespace = self.mapper.config().scope(namespace);
        self.find_document::<T>(&namespace, key.into(), ancestors)?
            .map(|document| self.mapper.deserialize(&namespace, &document))
            .transpose()
    }

    /// Lists every `T` under `ancestors`, or every `T` in the namespace when
    /// `ancestors` is empty.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn list<T: Entity>(&self, namespace: &Namespace, ancestors: &[Ancestor]) -> MapperResult<Vec<T>> {
        let namespace = self.mapper.config().scope(namespace);
        list_documents(self.store.as_ref(), &self.mapper, &namespace, RecordType::of::<T>(), ancestors)?
            .iter()
            .map(|document| self.mapper.deserialize(&namespace, document))
            .collect()
    }

    /// Stores `entity` and returns it as stored, with any generated key
    /// written back.
    ///
    /// # Errors
    ///
    /// Returns a serialization error or the store's error.
    pub fn persist<T: Entity>(
        &self,
        namespace: &Namespace,
        entity: &T,
        extra_ancestors: &[Ancestor],
        prepend: bool,
    ) -> MapperResult<T> {
        let document = self
            .mapper
            .serialize(namespace, entity, extra_ancestors, prepend)?;
        let stored = self.store.put(document)?;
        debug!(key = ?stored.key, "persisted entity");
        let namespace = self.mapper.effective_namespace(&stored, namespace);
        self.mapper.deserialize(&namespace, &stored)
    }

    /// Deletes the `T` identified by `key` under `ancestors` and returns it.
    ///
    /// Returns `None` if nothing was stored under that key.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn delete<T: Entity>(&self, namespace: &Namespace, key: impl Into<Key>, ancestors: &[Ancestor]) -> MapperResult<Option<T>> {
        let namespace = self.mapper.config().scope(namespace);
        let Some(document) = self.find_document::<T>(&namespace, key.into(), ancestors)? else {
            return Ok(None);
        };
        let entity = self.mapper.deserialize(&namespace, &document)?;
        if let Some(key) = &document.key {
            self.store.delete(key)?;
            debug!(key = %key, "deleted entity");
        }
        Ok(Some(entity))
    }

    /// Runs a caller-built query and reads every result as a `T` in the
    /// query's namespace.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn eval<T: Entity>(&self, query: &Query) -> MapperResult<Vec<T>> {
        self.store
            .run_query(query)?
            .map(|document| self.mapper.deserialize(query.namespace(), &document))
            .collect()
    }

    /// Lets external fields holding `T` load their children from this store.
    pub fn register_child_repository<T: Entity>(&self) {
        self.mapper.register_repository(Arc::new(StoreBackedRepository::<T> {
            store: Arc::clone(&self.store),
            child: PhantomData,
        }));
    }

    /// Returns a repository for `T` over this store.
    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.clone())
    }

    fn find_document<T: Entity>(&self, namespace: &Namespace, key: Key, ancestors: &[Ancestor]) -> MapperResult<Option<Document>> {
        let kind = self.mapper.kind_of(&RecordType::of::<T>())?;
        let full_key = DocumentKey::new(namespace, kind.as_str())
            .with_ancestors(ancestors.to_vec())
            .with_id(key);
        let query = Query::kind(namespace, kind).has_ancestor(full_key).limit(1);
        Ok(self.store.run_query(&query)?.next())
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}

fn list_documents(
    store: &dyn DocumentStore,
    mapper: &EntityMapper,
    namespace: &Namespace,
    record_type: RecordType,
    ancestors: &[Ancestor],
) -> MapperResult<Vec<Document>> {
    let mut query = Query::kind(namespace, mapper.kind_of(&record_type)?);
    if let Some(parent) = DocumentKey::from_path(namespace, ancestors) {
        query = query.has_ancestor(parent);
    }
    debug!(query = %query, "listing entities");
    Ok(store.run_query(&query)?.collect())
}

/// Child repository answering from the same store. It holds no mapper of
/// its own so that registering it does not create a reference cycle.
struct StoreBackedRepository<T> {
    store: Arc<dyn DocumentStore>,
    child: PhantomData<fn() -> T>,
}

impl<T: Entity> ExternalRepository for StoreBackedRepository<T> {
    fn record_type(&self) -> RecordType {
        RecordType::of::<T>()
    }

    fn list(&self, mapper: &EntityMapper, namespace: &Namespace, ancestors: &[Ancestor]) -> MapperResult<Vec<Dynamic>> {
        let namespace = mapper.config().scope(namespace);
        list_documents(self.store.as_ref(), mapper, &namespace, self.record_type(), ancestors)?
            .iter()
            .map(|document| mapper.deserialize::<T>(&namespace, document).map(|child| child.to_dynamic()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::schema::Schema;
    use entimap_storage::InMemoryStore;
    use entimap_value::KeyKind;

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Note {
            id: i64,
            text: String,
        }
    }

    impl Entity for Note {
        fn schema() -> MapperResult<Schema> {
            Schema::builder::<Self>().key("id", KeyKind::Long).build()
        }
    }

    fn store() -> EntityStore {
        EntityStore::new(Arc::new(InMemoryStore::new()), Arc::new(EntityMapper::new()))
    }

    #[test]
    fn persist_writes_back_generated_id() {
        let store = store();
        let ns = Namespace::new("notes");
        let saved = store
            .persist(
                &ns,
                &Note {
                    id: 0,
                    text: "hello".into(),
                },
                &[],
                false,
            )
            .unwrap();
        assert_ne!(saved.id, 0);

        let fetched: Note = store.get(&ns, saved.id, &[]).unwrap().unwrap();
        assert_eq!(fetched, saved);
    }

    #[test]
    fn get_misses_return_none() {
        let store = store();
        let missing: Option<Note> = store.get(&Namespace::new("notes"), 42_i64, &[]).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn delete_returns_the_removed_entity() {
        let store = store();
        let ns = Namespace::new("notes");
        let saved = store
            .persist(
                &ns,
                &Note {
                    id: 5,
                    text: "bye".into(),
                },
                &[],
                false,
            )
            .unwrap();

        let deleted: Note = store.delete(&ns, saved.id, &[]).unwrap().unwrap();
        assert_eq!(deleted, saved);
        assert!(store.get::<Note>(&ns, 5_i64, &[]).unwrap().is_none());
        assert!(store.delete::<Note>(&ns, 5_i64, &[]).unwrap().is_none());
    }

    #[test]
    fn eval_reads_in_query_namespace() {
        let store = store();
        let ns = Namespace::new("notes");
        for text in ["a", "b", "c"] {
            store
                .persist(
                    &ns,
                    &Note {
                        id: 0,
                        text: text.into(),
                    },
                    &[],
                    false,
                )
                .unwrap();
        }
        let notes: Vec<Note> = store.eval(&Query::kind(&ns, "Note").limit(2)).unwrap();
        assert_eq!(notes.len(), 2);

        let elsewhere: Vec<Note> = store.list(&Namespace::new("other"), &[]).unwrap();
        assert!(elsewhere.is_empty());
    }
}
