//! # EntiMap Storage
//!
//! The document store collaborator for EntiMap.
//!
//! The mapping engine never performs I/O itself. Everything that talks to a
//! store goes through the [`DocumentStore`] trait, which only knows about
//! [`entimap_value::Document`]s and keys.
//!
//! ## Design Principles
//!
//! - Stores accept and return whole documents
//! - Stores assign numeric ids to incomplete keys
//! - Queries select one kind in one namespace, optionally under an ancestor
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use entimap_storage::{DocumentStore, InMemoryStore, Query};
//! use entimap_value::{Document, DocumentKey, Namespace};
//!
//! let store = InMemoryStore::new();
//! let ns = Namespace::default();
//! let key = DocumentKey::new(&ns, "Note").with_id("n1");
//! store.put(Document::with_key(key.clone()).property("text", "hi")).unwrap();
//!
//! let found: Vec<_> = store.run_query(&Query::kind(&ns, "Note")).unwrap().collect();
//! assert_eq!(found.len(), 1);
//! store.delete(&key).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod query;

pub use backend::{DocumentIter, DocumentStore};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use query::Query;
