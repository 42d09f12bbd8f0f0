//! # EntiMap Value
//!
//! The document model shared by the mapping engine and the document store.
//!
//! A [`Document`] is an optional [`DocumentKey`] plus named [`Value`]s. A key
//! is scoped by a [`Namespace`], carries an ordered [`Ancestor`] path and a
//! kind, and is *incomplete* until it has an identifier.
//!
//! ## Usage
//!
//! ```
//! use entimap_value::{Ancestor, Document, DocumentKey, Namespace, Value};
//!
//! let ns = Namespace::new("tenant-a");
//! let key = DocumentKey::new(&ns, "Person")
//!     .with_ancestors(vec![Ancestor::id("Company", 7)])
//!     .with_id("alice");
//!
//! let doc = Document::with_key(key)
//!     .property("age", 42i64)
//!     .property("bio", Value::string("...").excluded(true));
//!
//! assert_eq!(doc.get("age"), Some(&Value::integer(42)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod key;
mod timestamp;
mod value;

pub use document::Document;
pub use error::{ValueError, ValueResult};
pub use key::{Ancestor, DocumentKey, Key, KeyKind, Namespace};
pub use timestamp::Timestamp;
pub use value::{Value, ValueData, ValueType};
