//! Property-based test generators using proptest.
//!
//! Strategies produce fixture values that respect the mapping rules: keys
//! are either unset or valid, and text fits in property names.

use crate::fixtures::{Address, Dimensions, Person, Poster, Sensor};
use entimap_value::Namespace;
use proptest::prelude::*;

/// Strategy for generating identifier-like names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating namespaces, with or without a project.
pub fn namespace_strategy() -> impl Strategy<Value = Namespace> {
    (name_strategy(), prop::option::of(name_strategy())).prop_map(|(namespace, project)| {
        let ns = Namespace::new(namespace);
        match project {
            Some(project) => ns.with_project(project),
            None => ns,
        }
    })
}

/// Strategy for generating addresses.
pub fn address_strategy() -> impl Strategy<Value = Address> {
    (
        "[0-9]{1,3} [A-Z][a-z]{2,10} St",
        "[A-Z][a-z]{2,12}",
        prop::option::of("[0-9]{5}"),
    )
        .prop_map(|(street, city, zip)| Address { street, city, zip })
}

/// Strategy for generating people. Keys are zero or positive.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        prop_oneof![Just(0_i64), 1..i64::MAX],
        "[A-Z][a-z]{0,12}",
        any::<i32>(),
        prop::option::of("[a-z]{1,8}@example\\.com"),
        prop::collection::vec("[a-z]{0,8}", 0..5),
        prop::collection::btree_map(name_strategy(), any::<i64>(), 0..4),
        prop::option::of(address_strategy()),
    )
        .prop_map(|(id, name, age, email, tags, scores, address)| Person {
            id,
            name,
            age,
            email,
            tags,
            scores,
            address,
            session: None,
        })
}

/// Strategy for generating posters with non-empty keys.
pub fn poster_strategy() -> impl Strategy<Value = Poster> {
    (name_strategy(), ".{0,20}", any::<i64>(), any::<i64>()).prop_map(|(id, title, width, height)| Poster {
        id,
        title,
        size: Dimensions { width, height },
    })
}

/// Strategy for generating sensors. Readings are finite.
pub fn sensor_strategy() -> impl Strategy<Value = Sensor> {
    (
        name_strategy(),
        any::<bool>(),
        -1.0e6_f32..1.0e6_f32,
        prop::collection::btree_set("[a-z]{1,8}", 0..4),
        prop::collection::hash_set(any::<i32>(), 0..6),
    )
        .prop_map(|(id, active, reading, labels, channels)| Sensor {
            id,
            active,
            reading,
            labels,
            channels,
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
