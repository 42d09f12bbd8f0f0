//! # EntiMap Testkit
//!
//! Test utilities for EntiMap.
//!
//! This crate provides:
//! - Fixture entity types covering every mapping feature
//! - Property-based test generators using proptest
//! - A harness pairing an in-memory store with a mapper
//! - Tracing initialization for test diagnostics
//!
//! ## Usage
//!
//! ```rust
//! use entimap_testkit::prelude::*;
//!
//! with_harness(|harness| {
//!     let saved = harness.entities.persist(&harness.namespace, &sample_person(), &[], false)?;
//!     assert_ne!(saved.id, 0);
//!     Ok(())
//! })
//! .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
