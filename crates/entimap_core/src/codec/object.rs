//! The fallback codec: records as nested entities.

use super::Codec;
use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use crate::record::Record;
use crate::schema::{Discriminator, FieldDescriptor, FieldRole, Inclusion, Schema};
use crate::types::{RecordType, TypeRef};
use entimap_value::{Document, DocumentKey, Namespace, Value, ValueData};
use tracing::{debug, trace};

/// Serializes any record through its schema and reads entities back into
/// the declared record type.
///
/// It accepts everything, so the registry consults it only after every
/// other codec has declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectCodec;

impl ObjectCodec {
    /// Writes the plain fields of `record` into a new document carrying `key`.
    pub(crate) fn write_record(
        mapper: &EntityMapper,
        record: &dyn Record,
        key: Option<DocumentKey>,
    ) -> MapperResult<Document> {
        let schema = mapper.schema_of(&record.record_type())?;
        let mut document = key.map_or_else(Document::new, Document::with_key);

        for field in schema.fields().iter().filter(|field| field.is_plain()) {
            write_field(mapper, &schema, record, field, &mut document)
                .map_err(|e| MapperError::field(schema.name(), field.name(), e))?;
        }
        trace!(type_name = schema.name(), properties = document.len(), "wrote record");
        Ok(document)
    }

    /// Builds a record of `declared` (or of the subtype its discriminator
    /// selects) from `document`.
    pub(crate) fn read_record(
        mapper: &EntityMapper,
        namespace: &Namespace,
        document: &Document,
        declared: RecordType,
    ) -> MapperResult<Box<dyn Record>> {
        let strict = !mapper.config().ignore_unknown_properties;
        Self::read_checked(mapper, namespace, document, declared, strict)
    }

    /// Flattened records share their parent's document, so only the
    /// outermost read checks for unclaimed properties.
    fn read_checked(
        mapper: &EntityMapper,
        namespace: &Namespace,
        document: &Document,
        declared: RecordType,
        strict: bool,
    ) -> MapperResult<Box<dyn Record>> {
        let declared_schema = mapper.schema_of(&declared)?;
        let type_tag = declared_schema
            .discriminator()
            .map(|discriminator| discriminator.property().to_string());
        let concrete = match declared_schema.discriminator() {
            Some(discriminator) => select_type(&declared_schema, discriminator, document)?,
            None => declared,
        };
        let schema = if concrete == declared {
            declared_schema
        } else {
            debug!(declared = declared.name(), concrete = concrete.name(), "selected subtype");
            mapper.schema_of(&concrete)?
        };

        let mut record = concrete.instantiate().ok_or_else(|| {
            MapperError::resolution(concrete.name(), "abstract type cannot be instantiated")
        })?;

        if let Some(key) = &document.key {
            mapper.key_builder().write_key_fields(&schema, record.as_mut(), key)?;
        }

        for field in schema
            .fields()
            .iter()
            .filter(|field| field.is_plain() && field.subtypes().is_none())
        {
            read_field(mapper, namespace, document, field, record.as_mut())
                .map_err(|e| MapperError::field(schema.name(), field.name(), e))?;
        }

        if strict {
            for (property, _) in document.iter() {
                if type_tag.as_deref() != Some(property) && !claims(mapper, &schema, property)? {
                    return Err(MapperError::unmapped_property(schema.name(), property));
                }
            }
        }

        for field in schema.fields().iter().filter(|field| field.is_plain()) {
            if let Some(discriminator) = field.subtypes() {
                read_polymorphic(mapper, namespace, &schema, document, field, discriminator, record.as_mut())
                    .map_err(|e| MapperError::field(schema.name(), field.name(), e))?;
            }
        }

        for field in schema.external_fields() {
            read_external(mapper, namespace, field, record.as_mut())?;
        }

        Ok(record)
    }
}

impl Codec for ObjectCodec {
    fn name(&self) -> &'static str {
        "object"
    }

    fn can_serialize(&self, _: &Dynamic) -> bool {
        true
    }

    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        match value {
            Dynamic::Record(record) => {
                debug!(type_name = record.record_type().name(), "serializing record as entity");
                let document = Self::write_record(mapper, record.as_ref(), None)?;
                Ok(Value::entity(document).excluded(exclude_from_index))
            }
            other => Err(MapperError::resolution(
                other.type_name(),
                "no codec serializes this value",
            )),
        }
    }

    fn can_deserialize(&self, _: &TypeRef, _: &Value) -> bool {
        true
    }

    fn deserialize(
        &self,
        mapper: &EntityMapper,
        namespace: &Namespace,
        value: &Value,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic> {
        let record_type = match declared {
            TypeRef::Record(record_type) => *record_type,
            TypeRef::AnyRecord => {
                return Err(MapperError::resolution(
                    "AnyRecord",
                    "concrete type unknown, declare subtypes for the field",
                ))
            }
            other => {
                return Err(MapperError::resolution(
                    other.to_string(),
                    format!("no codec reads a {} value as {other}", value.value_type()),
                ))
            }
        };
        let document = value.expect_entity()?;
        debug!(type_name = record_type.name(), "deserializing entity as record");
        Self::read_record(mapper, namespace, document, record_type).map(Dynamic::Record)
    }
}

fn write_field(
    mapper: &EntityMapper,
    schema: &Schema,
    record: &dyn Record,
    field: &FieldDescriptor,
    document: &mut Document,
) -> MapperResult<()> {
    let value = record
        .get_field(field.name())
        .ok_or_else(|| MapperError::unknown_field(schema.name(), field.name()))?;
    if value.is_null() {
        return Ok(());
    }
    let exclude = field.excludes_from_index();

    if let Some(codec) = field.codec() {
        document.set(field.property(), codec.serialize(mapper, &value, exclude)?);
        return Ok(());
    }

    if field.is_flattened() {
        let nested = value
            .as_record()
            .ok_or_else(|| MapperError::type_mismatch("record", value.type_name()))?;
        document.extend(ObjectCodec::write_record(mapper, nested, None)?);
        return Ok(());
    }

    let mut stored = mapper.create_property(&value, exclude)?;
    if let (Some(discriminator), Some(nested), ValueData::Entity(entity)) =
        (field.subtypes(), value.as_record(), &mut stored.data)
    {
        tag_subtype(discriminator, nested.record_type(), entity);
    }
    document.set(field.property(), stored);
    Ok(())
}

fn tag_subtype(discriminator: &Discriminator, record_type: RecordType, entity: &mut Document) {
    if discriminator.inclusion() != Inclusion::Internal {
        return;
    }
    let tagged = entity
        .get(discriminator.property())
        .and_then(value_text)
        .is_some_and(|tag| !tag.is_empty());
    if tagged {
        return;
    }
    if let Some(name) = discriminator.name_of(&record_type) {
        entity.set(discriminator.property(), Value::string(name));
    }
}

fn read_field(
    mapper: &EntityMapper,
    namespace: &Namespace,
    document: &Document,
    field: &FieldDescriptor,
    record: &mut dyn Record,
) -> MapperResult<()> {
    if field.is_flattened() {
        let nested_type = field
            .type_ref()
            .as_record()
            .ok_or_else(|| MapperError::type_mismatch("record", field.type_ref().to_string()))?;
        let mut view = document.clone();
        view.key = None;
        let nested = ObjectCodec::read_checked(mapper, namespace, &view, nested_type, false)?;
        return record.set_field(field.name(), Dynamic::Record(nested));
    }

    let Some(stored) = document.get(field.property()) else {
        return Ok(());
    };
    if stored.is_null() {
        return Ok(());
    }
    let value = match field.codec() {
        Some(codec) => codec.deserialize(mapper, stored)?,
        None => mapper.handle_property(namespace, stored, field.type_ref())?,
    };
    record.set_field(field.name(), value)
}

fn read_polymorphic(
    mapper: &EntityMapper,
    namespace: &Namespace,
    schema: &Schema,
    document: &Document,
    field: &FieldDescriptor,
    discriminator: &Discriminator,
    record: &mut dyn Record,
) -> MapperResult<()> {
    let Some(stored) = document.get(field.property()) else {
        return Ok(());
    };
    if stored.is_null() {
        return Ok(());
    }

    let tag = match discriminator.inclusion() {
        Inclusion::Internal => stored
            .as_entity()
            .and_then(|entity| entity.get(discriminator.property()))
            .and_then(value_text),
        Inclusion::External => record
            .get_field(discriminator.property())
            .filter(|value| !value.is_null())
            .map(|value| value.to_key_string())
            .transpose()?,
    };
    let concrete = match tag {
        Some(tag) => discriminator.resolve(schema.name(), &tag)?,
        None => discriminator.default_type().ok_or_else(|| {
            MapperError::missing_discriminator(schema.name(), discriminator.property())
        })?,
    };
    trace!(field = field.name(), concrete = concrete.name(), "resolved field subtype");

    let untagged;
    let stored = if discriminator.inclusion() == Inclusion::Internal
        && !claims(mapper, &*mapper.schema_of(&concrete)?, discriminator.property())?
    {
        untagged = without_property(stored, discriminator.property());
        &untagged
    } else {
        stored
    };
    let value = mapper.handle_property(namespace, stored, &TypeRef::Record(concrete))?;
    record.set_field(field.name(), value)
}

fn read_external(
    mapper: &EntityMapper,
    namespace: &Namespace,
    field: &FieldDescriptor,
    record: &mut dyn Record,
) -> MapperResult<()> {
    let FieldRole::External(ancestors) = field.role() else {
        return Ok(());
    };
    let child_type = match field.type_ref() {
        TypeRef::List(element) => element.as_record(),
        _ => None,
    }
    .ok_or_else(|| MapperError::type_mismatch("List<record>", field.type_ref().to_string()))?;

    let path = ancestors.child_ancestors(&*record)?;
    let children = mapper
        .external_repository(&child_type)?
        .list(mapper, namespace, &path)?;
    debug!(
        field = field.name(),
        child = child_type.name(),
        count = children.len(),
        "loaded external children"
    );
    record.set_field(field.name(), Dynamic::List(children))
}

/// Whether `property` maps to a field of `schema` or of a record flattened
/// into it.
fn claims(mapper: &EntityMapper, schema: &Schema, property: &str) -> MapperResult<bool> {
    if schema.claims_property(property) {
        return Ok(true);
    }
    for field in schema.fields().iter().filter(|field| field.is_plain() && field.is_flattened()) {
        if let Some(nested) = field.type_ref().as_record() {
            if claims(mapper, &*mapper.schema_of(&nested)?, property)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn without_property(value: &Value, property: &str) -> Value {
    let mut value = value.clone();
    if let ValueData::Entity(entity) = &mut value.data {
        entity.remove(property);
    }
    value
}

fn select_type(schema: &Schema, discriminator: &Discriminator, document: &Document) -> MapperResult<RecordType> {
    match document.get(discriminator.property()).and_then(value_text) {
        Some(tag) => discriminator.resolve(schema.name(), &tag),
        None => discriminator.default_type().ok_or_else(|| {
            MapperError::missing_discriminator(schema.name(), discriminator.property())
        }),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match &value.data {
        ValueData::String(s) => Some(s.clone()),
        ValueData::Integer(n) => Some(n.to_string()),
        ValueData::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::dynamic::AnyRecord;
    use crate::record::Entity;
    use crate::record;

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Dimensions {
            width: i64,
            height: i64,
        }
    }

    impl Entity for Dimensions {}

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Poster {
            title: String,
            subtitle: Option<String>,
            size: Dimensions,
        }
    }

    impl Entity for Poster {
        fn schema() -> MapperResult<Schema> {
            Schema::builder::<Self>().flatten("size").build()
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Frame {
            size: Dimensions,
        }
    }

    impl Entity for Frame {}

    record! {
        #[derive(Debug, Clone, Default)]
        struct Wall {
            art: Option<AnyRecord>,
        }
    }

    impl Entity for Wall {
        fn schema() -> MapperResult<Schema> {
            Schema::builder::<Self>()
                .subtypes(
                    "art",
                    Discriminator::internal("type")
                        .subtype::<Poster>("poster")
                        .subtype::<Frame>("frame"),
                )
                .build()
        }
    }

    fn ns() -> Namespace {
        Namespace::default()
    }

    #[test]
    fn null_fields_are_omitted() {
        let mapper = EntityMapper::new();
        let poster = Poster {
            title: "Dunes".into(),
            ..Poster::default()
        };
        let document = ObjectCodec::write_record(&mapper, &poster, None).unwrap();
        assert!(document.contains("title"));
        assert!(!document.contains("subtitle"));
    }

    #[test]
    fn flattened_fields_land_on_the_parent() {
        let mapper = EntityMapper::new();
        let poster = Poster {
            title: "Dunes".into(),
            subtitle: None,
            size: Dimensions {
                width: 60,
                height: 90,
            },
        };
        let document = ObjectCodec::write_record(&mapper, &poster, None).unwrap();
        assert_eq!(document.get("width").and_then(Value::as_integer), Some(60));
        assert!(!document.contains("size"));

        let back = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Poster>()).unwrap();
        assert_eq!(back.downcast_ref::<Poster>(), Some(&poster));
    }

    #[test]
    fn internal_subtype_tag_is_written_and_read() {
        let mapper = EntityMapper::new();
        let wall = Wall {
            art: Some(AnyRecord::new(Frame {
                size: Dimensions {
                    width: 1,
                    height: 2,
                },
            })),
        };
        let document = ObjectCodec::write_record(&mapper, &wall, None).unwrap();
        let art = document.get("art").and_then(Value::as_entity).unwrap();
        assert_eq!(art.get("type").and_then(Value::as_str), Some("frame"));

        let back = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Wall>()).unwrap();
        let back = back.downcast_ref::<Wall>().unwrap();
        let frame = back.art.as_ref().and_then(AnyRecord::downcast_ref::<Frame>).unwrap();
        assert_eq!(frame.size.height, 2);
    }

    #[test]
    fn unknown_subtype_tag_fails() {
        let mapper = EntityMapper::new();
        let document = Document::new().property(
            "art",
            Value::entity(Document::new().property("type", Value::string("mural"))),
        );
        let err = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Wall>()).unwrap_err();
        assert!(matches!(err.root_cause(), MapperError::UnknownSubtype { .. }));
        assert_eq!(err.field_path(), vec!["art"]);
    }

    #[test]
    fn unknown_properties_are_reported_when_strict() {
        let mapper = EntityMapper::builder()
            .config(MapperConfig::new().ignore_unknown_properties(false))
            .build();
        let document = Document::new()
            .property("size", Value::entity(Document::new()))
            .property("colour", Value::string("red"));
        let err = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Frame>()).unwrap_err();
        assert!(matches!(err, MapperError::UnmappedProperty { ref property, .. } if property == "colour"));

        let lenient = EntityMapper::new();
        assert!(ObjectCodec::read_record(&lenient, &ns(), &document, RecordType::of::<Frame>()).is_ok());
    }

    fn strict_mapper() -> EntityMapper {
        EntityMapper::builder()
            .config(MapperConfig::new().ignore_unknown_properties(false))
            .build()
    }

    #[test]
    fn strict_reads_accept_flattened_properties() {
        let mapper = strict_mapper();
        let poster = Poster {
            title: "Dunes".into(),
            subtitle: None,
            size: Dimensions {
                width: 3,
                height: 4,
            },
        };
        let mut document = ObjectCodec::write_record(&mapper, &poster, None).unwrap();
        let back = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Poster>()).unwrap();
        assert_eq!(back.downcast_ref::<Poster>(), Some(&poster));

        document.set("depth", Value::integer(5));
        let err = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Poster>()).unwrap_err();
        assert!(matches!(err, MapperError::UnmappedProperty { ref property, .. } if property == "depth"));

        document.remove("depth");
        document.set("size", Value::entity(Document::new()));
        let err = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Poster>()).unwrap_err();
        assert!(matches!(err, MapperError::UnmappedProperty { ref property, .. } if property == "size"));
    }

    #[test]
    fn strict_reads_accept_internal_subtype_tag() {
        let mapper = strict_mapper();
        let wall = Wall {
            art: Some(AnyRecord::new(Frame {
                size: Dimensions {
                    width: 1,
                    height: 2,
                },
            })),
        };
        let document = ObjectCodec::write_record(&mapper, &wall, None).unwrap();
        let back = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Wall>()).unwrap();
        let back = back.downcast_ref::<Wall>().unwrap();
        let frame = back.art.as_ref().and_then(AnyRecord::downcast_ref::<Frame>).unwrap();
        assert_eq!(frame.size.width, 1);
    }

    struct AnyArt;

    fn art_type() -> RecordType {
        RecordType::polymorphic::<AnyArt>("AnyArt", describe_art)
    }

    fn describe_art() -> MapperResult<Schema> {
        Schema::abstract_type(art_type())
            .discriminator(Discriminator::internal("type").subtype::<Frame>("frame"))
            .build()
    }

    #[test]
    fn strict_reads_accept_type_level_tag() {
        let mapper = strict_mapper();
        let document = Document::new()
            .property("type", Value::string("frame"))
            .property(
                "size",
                Value::entity(Document::new().property("width", Value::integer(8))),
            );
        let back = ObjectCodec::read_record(&mapper, &ns(), &document, art_type()).unwrap();
        assert_eq!(back.downcast_ref::<Frame>().map(|frame| frame.size.width), Some(8));
    }

    #[test]
    fn strict_reads_still_reject_extras_inside_subtypes() {
        let mapper = strict_mapper();
        let art = Document::new()
            .property("type", Value::string("frame"))
            .property("frame_colour", Value::string("oak"));
        let document = Document::new().property("art", Value::entity(art));
        let err = ObjectCodec::read_record(&mapper, &ns(), &document, RecordType::of::<Wall>()).unwrap_err();
        assert_eq!(err.field_path(), vec!["art"]);
        assert!(matches!(
            err.root_cause(),
            MapperError::UnmappedProperty { property, .. } if property == "frame_colour"
        ));
    }

    #[test]
    fn scalars_cannot_fall_through_to_object() {
        let mapper = EntityMapper::new();
        let err = ObjectCodec
            .deserialize(&mapper, &ns(), &Value::string("x"), &TypeRef::Int)
            .unwrap_err();
        assert!(matches!(err, MapperError::Resolution { .. }));
    }
}
