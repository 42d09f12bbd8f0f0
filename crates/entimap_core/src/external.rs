//! External-entity fields: children stored as documents of their own and
//! loaded into a parent after it is deserialized.

use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use crate::record::Record;
use crate::types::{short_type_name, RecordType};
use entimap_value::{Ancestor, Namespace};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Derives the ancestor path under which a parent's children are stored.
pub trait ChildAncestors: Send + Sync {
    /// Returns the path for the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be derived from `parent`.
    fn child_ancestors(&self, parent: &dyn Record) -> MapperResult<Vec<Ancestor>>;
}

impl<F> ChildAncestors for F
where
    F: Fn(&dyn Record) -> MapperResult<Vec<Ancestor>> + Send + Sync,
{
    fn child_ancestors(&self, parent: &dyn Record) -> MapperResult<Vec<Ancestor>> {
        self(parent)
    }
}

/// A [`ChildAncestors`] over a concrete parent type.
pub struct TypedChildAncestors<P, F> {
    derive: F,
    parent: PhantomData<fn(&P)>,
}

impl<P, F> ChildAncestors for TypedChildAncestors<P, F>
where
    P: Record,
    F: Fn(&P) -> Vec<Ancestor> + Send + Sync,
{
    fn child_ancestors(&self, parent: &dyn Record) -> MapperResult<Vec<Ancestor>> {
        parent
            .downcast_ref::<P>()
            .map(&self.derive)
            .ok_or_else(|| MapperError::type_mismatch(short_type_name::<P>(), parent.record_type().name()))
    }
}

/// Wraps a closure over the concrete parent type.
///
/// ```
/// use entimap_core::child_ancestors;
/// use entimap_value::Ancestor;
/// # entimap_core::record! {
/// #     #[derive(Debug, Clone, Default)]
/// #     pub struct Company { pub id: i64 }
/// # }
/// # impl entimap_core::Entity for Company {}
///
/// let derive = child_ancestors(|company: &Company| vec![Ancestor::id("Company", company.id)]);
/// # let _ = derive;
/// ```
pub fn child_ancestors<P, F>(derive: F) -> TypedChildAncestors<P, F>
where
    P: Record,
    F: Fn(&P) -> Vec<Ancestor> + Send + Sync,
{
    TypedChildAncestors {
        derive,
        parent: PhantomData,
    }
}

/// Lists the children of one record type under an ancestor path.
pub trait ExternalRepository: Send + Sync {
    /// The child type this repository serves.
    fn record_type(&self) -> RecordType;

    /// Returns every child stored under `ancestors`.
    ///
    /// # Errors
    ///
    /// Returns the repository's error, typically wrapped in
    /// [`MapperError::External`] or [`MapperError::Storage`].
    fn list(&self, mapper: &EntityMapper, namespace: &Namespace, ancestors: &[Ancestor]) -> MapperResult<Vec<Dynamic>>;
}

/// Table of external repositories, one per child type.
#[derive(Default)]
pub struct ExternalResolver {
    repositories: RwLock<HashMap<TypeId, Arc<dyn ExternalRepository>>>,
}

impl ExternalResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `repository` for its record type, replacing any previous one.
    pub fn register(&self, repository: Arc<dyn ExternalRepository>) {
        let record_type = repository.record_type();
        debug!(child = record_type.name(), "registered external repository");
        self.repositories.write().insert(record_type.id(), repository);
    }

    /// Returns the repository serving `record_type`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Resolution`] if none is registered.
    pub fn resolve(&self, record_type: &RecordType) -> MapperResult<Arc<dyn ExternalRepository>> {
        self.repositories
            .read()
            .get(&record_type.id())
            .cloned()
            .ok_or_else(|| MapperError::resolution(record_type.name(), "no external repository registered"))
    }

    /// Number of registered repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.read().is_empty()
    }
}

impl fmt::Debug for ExternalResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalResolver")
            .field("repositories", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::record::Entity;
    use entimap_value::Key;

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Shelf {
            id: i64,
        }
    }

    impl Entity for Shelf {}

    struct Fixed(Vec<Dynamic>);

    impl ExternalRepository for Fixed {
        fn record_type(&self) -> RecordType {
            RecordType::of::<Shelf>()
        }

        fn list(&self, _: &EntityMapper, _: &Namespace, _: &[Ancestor]) -> MapperResult<Vec<Dynamic>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn typed_derivation_downcasts_the_parent() {
        let derive = child_ancestors(|shelf: &Shelf| vec![Ancestor::id("Shelf", shelf.id)]);
        let path = derive.child_ancestors(&Shelf { id: 4 }).unwrap();
        assert_eq!(path[0].key, Key::Id(4));
    }

    #[test]
    fn resolve_requires_registration() {
        let resolver = ExternalResolver::new();
        let err = resolver.resolve(&RecordType::of::<Shelf>()).err().unwrap();
        assert!(matches!(err, MapperError::Resolution { .. }));

        resolver.register(Arc::new(Fixed(vec![Dynamic::Long(1)])));
        assert_eq!(resolver.len(), 1);
        let repository = resolver.resolve(&RecordType::of::<Shelf>()).unwrap();
        let listed = repository
            .list(&EntityMapper::new(), &Namespace::default(), &[])
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
