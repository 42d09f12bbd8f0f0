//! Codecs: bidirectional converters between dynamic values and document values.
//!
//! A [`Codec`] declares what it can handle through two predicates and is
//! picked by the [`CodecRegistry`] in registration order, with the
//! [`ObjectCodec`] as the fallback that always matches. A [`CustomCodec`] is
//! bound to a single field through its schema and bypasses the registry.

mod collection;
mod custom;
mod object;
mod primitive;
mod registry;

pub use collection::{ListCodec, MapCodec, SetCodec};
pub use custom::TimestampMillisCodec;
pub use object::ObjectCodec;
pub use primitive::{
    BooleanCodec, DoubleCodec, FloatCodec, IntegerCodec, LongCodec, StringCodec, TimestampCodec,
};
pub use registry::CodecRegistry;

use crate::dynamic::Dynamic;
use crate::error::MapperResult;
use crate::mapper::EntityMapper;
use crate::types::TypeRef;
use entimap_value::{Namespace, Value};

/// A converter for one family of values.
///
/// `can_serialize` matches on the runtime value; `can_deserialize` must agree
/// on both the declared type and the tag of the stored value, otherwise the
/// codec declines and resolution moves on.
///
/// Codecs for containers call back into the [`EntityMapper`] for their
/// elements without knowing which codec will handle them.
pub trait Codec: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if this codec serializes `value`.
    fn can_serialize(&self, value: &Dynamic) -> bool;

    /// Serializes `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value or one of its elements cannot be serialized.
    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value>;

    /// Returns `true` if this codec reads `value` as `declared`.
    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool;

    /// Reads `value` as `declared`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value or one of its elements cannot be read.
    fn deserialize(
        &self,
        mapper: &EntityMapper,
        namespace: &Namespace,
        value: &Value,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic>;
}

/// A codec bound to one field through [`crate::SchemaBuilder::codec`].
///
/// It is used unconditionally for that field, so it has no predicates.
pub trait CustomCodec: Send + Sync {
    /// Serializes the field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value>;

    /// Reads the stored property back into a field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be read.
    fn deserialize(&self, mapper: &EntityMapper, value: &Value) -> MapperResult<Dynamic>;
}
