//! Schema descriptors and their cache.

mod builder;
mod cache;
mod descriptor;

pub use builder::SchemaBuilder;
pub use cache::SchemaCache;
pub use descriptor::{Discriminator, FieldDescriptor, FieldRole, Inclusion, Schema, Subtype};
