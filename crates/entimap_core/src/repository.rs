//! Per-type repositories.

use crate::error::MapperResult;
use crate::record::Entity;
use crate::store::EntityStore;
use entimap_value::{Ancestor, Key, Namespace};
use std::fmt;
use std::marker::PhantomData;

/// CRUD operations for one entity type over an [`EntityStore`].
///
/// `save_with_ancestors` places the given ancestors before the entity's own.
pub struct Repository<T> {
    store: EntityStore,
    entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    /// Creates a repository over `store`.
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            entity: PhantomData,
        }
    }

    /// Stores `entity` and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns a serialization error or the store's error.
    pub fn save(&self, namespace: &Namespace, entity: &T) -> MapperResult<T> {
        self.store.persist(namespace, entity, &[], false)
    }

    /// Stores `entity` under `ancestors` and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns a serialization error or the store's error.
    pub fn save_with_ancestors(&self, namespace: &Namespace, entity: &T, ancestors: &[Ancestor]) -> MapperResult<T> {
        self.store.persist(namespace, entity, ancestors, true)
    }

    /// Fetches the entity with `key`.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn get(&self, namespace: &Namespace, key: impl Into<Key>) -> MapperResult<Option<T>> {
        self.store.get(namespace, key, &[])
    }

    /// Fetches the entity with `key` under `ancestors`.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn get_with_ancestors(&self, namespace: &Namespace, key: impl Into<Key>, ancestors: &[Ancestor]) -> MapperResult<Option<T>> {
        self.store.get(namespace, key, ancestors)
    }

    /// Lists every entity in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn list(&self, namespace: &Namespace) -> MapperResult<Vec<T>> {
        self.store.list(namespace, &[])
    }

    /// Lists every entity under `ancestors`.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn list_with_ancestors(&self, namespace: &Namespace, ancestors: &[Ancestor]) -> MapperResult<Vec<T>> {
        self.store.list(namespace, ancestors)
    }

    /// Deletes the entity with `key` and returns it.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn delete(&self, namespace: &Namespace, key: impl Into<Key>) -> MapperResult<Option<T>> {
        self.store.delete(namespace, key, &[])
    }

    /// Deletes the entity with `key` under `ancestors` and returns it.
    ///
    /// # Errors
    ///
    /// Returns the store's error or a deserialization error.
    pub fn delete_with_ancestors(&self, namespace: &Namespace, key: impl Into<Key>, ancestors: &[Ancestor]) -> MapperResult<Option<T>> {
        self.store.delete(namespace, key, ancestors)
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
