//! The entity mapper: serialization and deserialization end to end.

use crate::codec::{Codec, CodecRegistry, ObjectCodec};
use crate::compare;
use crate::config::MapperConfig;
use crate::dynamic::{downcast_record, AnyRecord, Dynamic, Mappable};
use crate::error::{MapperError, MapperResult};
use crate::external::{ExternalRepository, ExternalResolver};
use crate::key::KeyBuilder;
use crate::record::{Entity, Record};
use crate::schema::{Schema, SchemaCache};
use crate::types::{RecordType, TypeRef};
use entimap_value::{Ancestor, Document, DocumentKey, Namespace, Value};
use std::sync::Arc;
use tracing::debug;

/// Maps records to documents and back.
///
/// The mapper owns the codec registry, the schema cache and the external
/// repository table. It is `Send + Sync` and meant to be shared behind an
/// `Arc`; schemas are derived on first use and reused afterwards.
///
/// ```
/// use entimap_core::{record, Entity, EntityMapper, MapperResult, Schema};
/// use entimap_value::{KeyKind, Namespace};
///
/// record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Person {
///         pub id: i64,
///         pub name: String,
///     }
/// }
///
/// impl Entity for Person {
///     fn schema() -> MapperResult<Schema> {
///         Schema::builder::<Self>().key("id", KeyKind::Long).build()
///     }
/// }
///
/// let mapper = EntityMapper::new();
/// let ns = Namespace::new("people");
/// let alice = Person { id: 7, name: "Alice".into() };
///
/// let document = mapper.serialize(&ns, &alice, &[], false)?;
/// assert_eq!(document.get("name").and_then(|v| v.as_str()), Some("Alice"));
///
/// let back: Person = mapper.deserialize(&ns, &document)?;
/// assert_eq!(back, alice);
/// # Ok::<(), entimap_core::MapperError>(())
/// ```
#[derive(Debug)]
pub struct EntityMapper {
    config: MapperConfig,
    registry: CodecRegistry,
    schemas: SchemaCache,
    external: ExternalResolver,
}

impl EntityMapper {
    /// Creates a mapper with the default configuration and codecs.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a mapper.
    pub fn builder() -> EntityMapperBuilder {
        EntityMapperBuilder::default()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns the codec registry.
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Returns the schema cache.
    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Returns a key builder bound to this mapper's configuration.
    pub fn key_builder(&self) -> KeyBuilder<'_> {
        KeyBuilder::new(&self.config)
    }

    /// Returns the schema of `record_type`, deriving it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Schema`] if the schema is invalid.
    pub fn schema_of(&self, record_type: &RecordType) -> MapperResult<Arc<Schema>> {
        self.schemas.get(record_type)
    }

    /// Returns the store kind of `record_type`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Schema`] if the schema is invalid.
    pub fn kind_of(&self, record_type: &RecordType) -> MapperResult<String> {
        Ok(self.schema_of(record_type)?.kind().to_string())
    }

    /// Namespace a document should be read in: the one of its key, else `fallback`.
    pub fn effective_namespace(&self, document: &Document, fallback: &Namespace) -> Namespace {
        document
            .key
            .as_ref()
            .map_or_else(|| fallback.clone(), DocumentKey::namespace)
    }

    /// Serializes `entity` into a document keyed under `namespace`.
    ///
    /// `extra` ancestors are placed before the entity's own ancestors when
    /// `prepend` is set, after them otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be built or a field fails to serialize.
    pub fn serialize<T: Entity>(
        &self,
        namespace: &Namespace,
        entity: &T,
        extra: &[Ancestor],
        prepend: bool,
    ) -> MapperResult<Document> {
        self.serialize_record(namespace, entity, extra, prepend)
    }

    /// Serializes a record of any type. See [`EntityMapper::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be built or a field fails to serialize.
    pub fn serialize_record(
        &self,
        namespace: &Namespace,
        record: &dyn Record,
        extra: &[Ancestor],
        prepend: bool,
    ) -> MapperResult<Document> {
        let schema = self.schema_of(&record.record_type())?;
        let key = self
            .key_builder()
            .create_key(&schema, namespace, record, extra, prepend)?;
        debug!(type_name = schema.name(), key = %key, "serializing entity");
        ObjectCodec::write_record(self, record, Some(key))
    }

    /// Deserializes `document` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if a property cannot be read into its field.
    pub fn deserialize<T: Entity>(&self, namespace: &Namespace, document: &Document) -> MapperResult<T> {
        let value = self.deserialize_as(namespace, document, &T::type_ref())?;
        downcast_record(value)
    }

    /// Deserializes `document` into `record_type`, which may be abstract.
    ///
    /// # Errors
    ///
    /// Returns an error if no subtype can be selected or a property cannot
    /// be read into its field.
    pub fn deserialize_any(
        &self,
        namespace: &Namespace,
        document: &Document,
        record_type: RecordType,
    ) -> MapperResult<AnyRecord> {
        let value = self.deserialize_as(namespace, document, &TypeRef::Record(record_type))?;
        AnyRecord::from_dynamic(value)
    }

    /// Deserializes `document` through codec resolution with `declared` as
    /// the target type.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected codec fails.
    pub fn deserialize_as(
        &self,
        namespace: &Namespace,
        document: &Document,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic> {
        debug!(declared = %declared, key = ?document.key, "deserializing entity");
        self.handle_property(namespace, &Value::entity(document.clone()), declared)
    }

    /// Serializes one value through the registry.
    ///
    /// This is the re-entry point for codecs serializing elements or nested
    /// records. Null becomes a null value.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved codec fails.
    pub fn create_property(&self, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        if value.is_null() {
            return Ok(Value::null().excluded(exclude_from_index));
        }
        self.registry
            .resolve_for_serialize(value)
            .serialize(self, value, exclude_from_index)
    }

    /// Serializes the field `field` of `record` as its schema describes,
    /// honoring custom codecs and index exclusion.
    ///
    /// Returns `None` for null values and for fields that are not stored as
    /// properties.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownField`] if the record has no such field,
    /// or the codec's error.
    pub fn create_field_property(&self, record: &dyn Record, field: &str) -> MapperResult<Option<Value>> {
        let schema = self.schema_of(&record.record_type())?;
        let descriptor = schema
            .field(field)
            .ok_or_else(|| MapperError::unknown_field(schema.name(), field))?;
        if !descriptor.is_plain() {
            return Ok(None);
        }
        let value = record
            .get_field(field)
            .ok_or_else(|| MapperError::unknown_field(schema.name(), field))?;
        if value.is_null() {
            return Ok(None);
        }

        let exclude = descriptor.excludes_from_index();
        let stored = match descriptor.codec() {
            Some(codec) => codec.serialize(self, &value, exclude),
            None => self.create_property(&value, exclude),
        };
        stored
            .map(Some)
            .map_err(|e| MapperError::field(schema.name(), field, e))
    }

    /// Reads one value as `declared` through the registry.
    ///
    /// This is the re-entry point for codecs reading elements or nested
    /// records. A null value reads as [`Dynamic::Null`].
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved codec fails.
    pub fn handle_property(&self, namespace: &Namespace, value: &Value, declared: &TypeRef) -> MapperResult<Dynamic> {
        if value.is_null() {
            return Ok(Dynamic::Null);
        }
        self.registry
            .resolve_for_deserialize(declared, value)
            .deserialize(self, namespace, value, declared)
    }

    /// Registers the repository that external fields of its type load from.
    pub fn register_repository(&self, repository: Arc<dyn ExternalRepository>) {
        self.external.register(repository);
    }

    /// Returns the repository serving `record_type`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Resolution`] if none is registered.
    pub fn external_repository(&self, record_type: &RecordType) -> MapperResult<Arc<dyn ExternalRepository>> {
        self.external.resolve(record_type)
    }

    /// Deep structural equality. With `ignore_key` the key fields are not compared.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Heterogeneous`] if nested values differ in type.
    pub fn is_same<T: Entity>(&self, left: &T, right: &T, ignore_key: bool) -> MapperResult<bool> {
        compare::is_same(self, &left.to_dynamic(), &right.to_dynamic(), ignore_key)
    }

    /// Copies every non-null field of `source` over `target`, merging nested
    /// records field by field.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Heterogeneous`] if nested values differ in type.
    pub fn merge_non_null_fields<T: Entity>(&self, source: &T, target: T, ignore_key: bool) -> MapperResult<T> {
        let merged = compare::merge(self, source.to_dynamic(), target.to_dynamic(), ignore_key)?;
        downcast_record(merged)
    }
}

impl Default for EntityMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`EntityMapper`].
#[derive(Default)]
#[must_use]
pub struct EntityMapperBuilder {
    config: MapperConfig,
    registry: Option<CodecRegistry>,
    codecs: Vec<Box<dyn FnOnce(&mut CodecRegistry)>>,
    repositories: Vec<Arc<dyn ExternalRepository>>,
}

impl EntityMapperBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default registry.
    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Appends `codec` to the registry, after the codecs already in it.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs
            .push(Box::new(move |registry: &mut CodecRegistry| registry.register(codec)));
        self
    }

    /// Registers an external repository.
    pub fn repository(mut self, repository: impl ExternalRepository + 'static) -> Self {
        self.repositories.push(Arc::new(repository));
        self
    }

    /// Builds the mapper.
    #[must_use]
    pub fn build(self) -> EntityMapper {
        let mut registry = self.registry.unwrap_or_default();
        for add in self.codecs {
            add(&mut registry);
        }
        let mapper = EntityMapper {
            config: self.config,
            registry,
            schemas: SchemaCache::new(),
            external: ExternalResolver::new(),
        };
        for repository in self.repositories {
            mapper.register_repository(repository);
        }
        debug!(codecs = ?mapper.registry.names(), "built entity mapper");
        mapper
    }
}
