//! # EntiMap Core
//!
//! Maps application structs to store documents and back.
//!
//! This crate provides:
//! - [`Record`] field access and the [`record!`] macro that implements it
//! - Declarative [`Schema`]s: keys, ancestors, renames, flattening,
//!   custom codecs, polymorphic subtypes and external children
//! - A [`CodecRegistry`] resolving codecs in registration order, with the
//!   [`ObjectCodec`] as fallback
//! - The [`EntityMapper`] orchestrating key building and (de)serialization
//! - Structural [`is_same`] and [`merge`] over mapped values
//! - An [`EntityStore`] façade and typed [`Repository`] over any
//!   [`entimap_storage::DocumentStore`]
//!
//! ## Example
//!
//! ```rust
//! use entimap_core::{record, Entity, EntityMapper, MapperResult, Schema};
//! use entimap_value::{KeyKind, Namespace};
//!
//! record! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Book {
//!         pub isbn: String,
//!         pub title: String,
//!         pub pages: i32,
//!     }
//! }
//!
//! impl Entity for Book {
//!     fn schema() -> MapperResult<Schema> {
//!         Schema::builder::<Self>()
//!             .kind("books")
//!             .key("isbn", KeyKind::String)
//!             .build()
//!     }
//! }
//!
//! let mapper = EntityMapper::new();
//! let ns = Namespace::new("library");
//! let book = Book { isbn: "978-0".into(), title: "Dune".into(), pages: 412 };
//!
//! let document = mapper.serialize(&ns, &book, &[], false)?;
//! assert_eq!(document.key.as_ref().map(|k| k.kind.as_str()), Some("books"));
//! assert_eq!(mapper.deserialize::<Book>(&ns, &document)?, book);
//! # Ok::<(), entimap_core::MapperError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod compare;
mod config;
mod dynamic;
mod error;
mod external;
mod key;
mod macros;
mod mapper;
mod record;
mod repository;
mod schema;
mod store;
mod types;

pub use codec::{
    BooleanCodec, Codec, CodecRegistry, CustomCodec, DoubleCodec, FloatCodec, IntegerCodec,
    ListCodec, LongCodec, MapCodec, ObjectCodec, SetCodec, StringCodec, TimestampCodec,
    TimestampMillisCodec,
};
pub use compare::{is_same, merge};
pub use config::MapperConfig;
pub use dynamic::{downcast_record, AnyRecord, Dynamic, Mappable};
pub use error::{MapperError, MapperResult};
pub use external::{child_ancestors, ChildAncestors, ExternalRepository, ExternalResolver, TypedChildAncestors};
pub use key::KeyBuilder;
pub use mapper::{EntityMapper, EntityMapperBuilder};
pub use record::{Entity, Record};
pub use repository::Repository;
pub use schema::{
    Discriminator, FieldDescriptor, FieldRole, Inclusion, Schema, SchemaBuilder, SchemaCache,
    Subtype,
};
pub use store::EntityStore;
pub use types::{FieldInfo, RecordType, TypeRef};
