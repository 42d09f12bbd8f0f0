//! Ordered codec lookup.

use super::collection::{ListCodec, MapCodec, SetCodec};
use super::object::ObjectCodec;
use super::primitive::{
    BooleanCodec, DoubleCodec, FloatCodec, IntegerCodec, LongCodec, StringCodec, TimestampCodec,
};
use super::Codec;
use crate::dynamic::Dynamic;
use crate::types::TypeRef;
use entimap_value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Codecs in registration order, with the object codec as fallback.
///
/// Resolution walks the list front to back and returns the first codec whose
/// predicate accepts; if none does, the fallback is returned. Registration
/// order is therefore precedence order.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
    fallback: Arc<dyn Codec>,
}

impl CodecRegistry {
    /// Creates a registry holding only the fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: Vec::new(),
            fallback: Arc::new(ObjectCodec),
        }
    }

    /// Creates a registry with the built-in scalar and collection codecs.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(BooleanCodec)
            .with(IntegerCodec)
            .with(LongCodec)
            .with(FloatCodec)
            .with(DoubleCodec)
            .with(StringCodec)
            .with(TimestampCodec)
            .with(ListCodec)
            .with(SetCodec)
            .with(MapCodec)
    }

    /// Appends `codec`, builder style.
    #[must_use]
    pub fn with(mut self, codec: impl Codec + 'static) -> Self {
        self.register(codec);
        self
    }

    /// Appends `codec`. It is consulted after every codec registered before it.
    pub fn register(&mut self, codec: impl Codec + 'static) {
        self.codecs.push(Arc::new(codec));
    }

    /// Picks the codec for serializing `value`.
    pub fn resolve_for_serialize(&self, value: &Dynamic) -> &dyn Codec {
        let codec = self
            .codecs
            .iter()
            .find(|codec| codec.can_serialize(value))
            .unwrap_or(&self.fallback);
        trace!(codec = codec.name(), value_type = value.type_name(), "resolved serializer");
        codec.as_ref()
    }

    /// Picks the codec for reading `value` as `declared`.
    pub fn resolve_for_deserialize(&self, declared: &TypeRef, value: &Value) -> &dyn Codec {
        let codec = self
            .codecs
            .iter()
            .find(|codec| codec.can_deserialize(declared, value))
            .unwrap_or(&self.fallback);
        trace!(codec = codec.name(), declared = %declared, "resolved deserializer");
        codec.as_ref()
    }

    /// Names of the registered codecs in order, fallback last.
    pub fn names(&self) -> Vec<&'static str> {
        self.codecs
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|codec| codec.name())
            .collect()
    }

    /// Number of registered codecs, not counting the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if only the fallback is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}
