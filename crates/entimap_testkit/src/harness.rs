//! Test harness: an in-memory store wired to a mapper.

use crate::fixtures::Employee;
use entimap_core::{EntityMapper, EntityStore, MapperConfig, MapperResult};
use entimap_storage::InMemoryStore;
use entimap_value::Namespace;
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

/// An [`EntityStore`] over a fresh [`InMemoryStore`].
pub struct Harness {
    /// The raw store, for inspecting stored documents.
    pub store: Arc<InMemoryStore>,
    /// The typed façade.
    pub entities: EntityStore,
    /// Namespace tests should use.
    pub namespace: Namespace,
}

impl Harness {
    /// Creates a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    /// Creates a harness with `config`.
    ///
    /// The employee repository is registered so [`crate::Company`] can load
    /// its external children.
    pub fn with_config(config: MapperConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mapper = Arc::new(EntityMapper::builder().config(config).build());
        let entities = EntityStore::new(store.clone(), mapper);
        entities.register_child_repository::<Employee>();
        Self {
            store,
            entities,
            namespace: Namespace::new("test"),
        }
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &EntityMapper {
        self.entities.mapper()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a fresh harness.
///
/// # Example
///
/// ```rust
/// use entimap_testkit::{with_harness, Person};
///
/// with_harness(|harness| {
///     let people: Vec<Person> = harness.entities.list(&harness.namespace, &[])?;
///     assert!(people.is_empty());
///     Ok(())
/// })
/// .unwrap();
/// ```
///
/// # Errors
///
/// Returns whatever the test body returns.
pub fn with_harness<F, R>(f: F) -> MapperResult<R>
where
    F: FnOnce(&Harness) -> MapperResult<R>,
{
    let harness = Harness::new();
    f(&harness)
}

static TRACING: Once = Once::new();

/// Installs a `tracing` subscriber for test output.
///
/// The filter comes from `RUST_LOG`, defaulting to `debug` for the EntiMap
/// crates. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("entimap_core=debug,entimap_storage=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_person;
    use crate::Person;

    #[test]
    fn harness_round_trips_through_the_store() {
        init_tracing();
        let harness = Harness::new();
        let saved = harness
            .entities
            .persist(&harness.namespace, &sample_person(), &[], false)
            .unwrap();
        assert_eq!(harness.store.len(), 1);

        let fetched: Person = harness
            .entities
            .get(&harness.namespace, saved.id, &[])
            .unwrap()
            .unwrap();
        assert_eq!(fetched, saved);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
