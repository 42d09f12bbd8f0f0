//! List, set and map codecs.

use super::Codec;
use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use crate::types::TypeRef;
use entimap_value::{Document, Namespace, Value, ValueData, ValueType};
use tracing::{debug, warn};

fn serialize_elements(
    mapper: &EntityMapper,
    items: &[Dynamic],
    exclude_from_index: bool,
) -> MapperResult<Value> {
    let values = items
        .iter()
        .map(|item| mapper.create_property(item, exclude_from_index))
        .collect::<MapperResult<Vec<_>>>()?;
    Ok(Value::list(values).excluded(exclude_from_index))
}

fn deserialize_elements(
    mapper: &EntityMapper,
    namespace: &Namespace,
    value: &Value,
    element: &TypeRef,
) -> MapperResult<Vec<Dynamic>> {
    value
        .expect_list()?
        .iter()
        .map(|item| mapper.handle_property(namespace, item, element))
        .collect()
}

/// Ordered sequences as list values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl Codec for ListCodec {
    fn name(&self) -> &'static str {
        "list"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::List(_))
    }

    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        match value {
            Dynamic::List(items) => {
                debug!(len = items.len(), "serializing list");
                serialize_elements(mapper, items, exclude_from_index)
            }
            other => Err(MapperError::type_mismatch("List", other.type_name())),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        matches!(declared, TypeRef::List(_)) && value.value_type() == ValueType::List
    }

    fn deserialize(
        &self,
        mapper: &EntityMapper,
        namespace: &Namespace,
        value: &Value,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic> {
        let TypeRef::List(element) = declared else {
            return Err(MapperError::type_mismatch("List", declared.to_string()));
        };
        debug!(element = %element, "deserializing list");
        deserialize_elements(mapper, namespace, value, element).map(Dynamic::List)
    }
}

/// Sets as list values; element order on the store is unspecified.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetCodec;

impl Codec for SetCodec {
    fn name(&self) -> &'static str {
        "set"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Set(_))
    }

    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        match value {
            Dynamic::Set(items) => {
                debug!(len = items.len(), "serializing set");
                serialize_elements(mapper, items, exclude_from_index)
            }
            other => Err(MapperError::type_mismatch("Set", other.type_name())),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        matches!(declared, TypeRef::Set(_)) && value.value_type() == ValueType::List
    }

    fn deserialize(
        &self,
        mapper: &EntityMapper,
        namespace: &Namespace,
        value: &Value,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic> {
        let TypeRef::Set(element) = declared else {
            return Err(MapperError::type_mismatch("Set", declared.to_string()));
        };
        debug!(element = %element, "deserializing set");
        deserialize_elements(mapper, namespace, value, element).map(Dynamic::Set)
    }
}

/// Maps as nested entities, one property per entry.
///
/// Keys are written in their textual form and parsed back according to the
/// declared key type. An entry that fails to read is logged and dropped when
/// [`crate::MapperConfig::skip_invalid_map_entries`] is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapCodec;

impl MapCodec {
    fn parse_key(raw: &str, key_type: &TypeRef) -> MapperResult<Dynamic> {
        let invalid = || MapperError::type_mismatch(key_type.to_string(), format!("map key '{raw}'"));
        match key_type {
            TypeRef::String => Ok(Dynamic::String(raw.to_string())),
            TypeRef::Int => raw.parse().map(Dynamic::Int).map_err(|_| invalid()),
            TypeRef::Long => raw.parse().map(Dynamic::Long).map_err(|_| invalid()),
            TypeRef::Float => raw.parse().map(Dynamic::Float).map_err(|_| invalid()),
            TypeRef::Double => raw.parse().map(Dynamic::Double).map_err(|_| invalid()),
            TypeRef::Bool => raw.parse().map(Dynamic::Bool).map_err(|_| invalid()),
            other => Err(MapperError::resolution(
                "Map",
                format!("unsupported key type {other}"),
            )),
        }
    }
}

impl Codec for MapCodec {
    fn name(&self) -> &'static str {
        "map"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Map(_))
    }

    fn serialize(&self, mapper: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        let Dynamic::Map(entries) = value else {
            return Err(MapperError::type_mismatch("Map", value.type_name()));
        };
        debug!(len = entries.len(), "serializing map");

        let mut document = Document::new();
        for (key, item) in entries {
            let property = key.to_key_string()?;
            document.set(property, mapper.create_property(item, exclude_from_index)?);
        }
        Ok(Value::entity(document).excluded(exclude_from_index))
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        matches!(declared, TypeRef::Map(..)) && value.value_type() == ValueType::Entity
    }

    fn deserialize(
        &self,
        mapper: &EntityMapper,
        namespace: &Namespace,
        value: &Value,
        declared: &TypeRef,
    ) -> MapperResult<Dynamic> {
        let TypeRef::Map(key_type, value_type) = declared else {
            return Err(MapperError::type_mismatch("Map", declared.to_string()));
        };
        let ValueData::Entity(document) = &value.data else {
            return Err(MapperError::type_mismatch("entity", value.value_type().to_string()));
        };
        debug!(key = %key_type, value = %value_type, "deserializing map");

        let mut entries = Vec::with_capacity(document.len());
        for (property, item) in document.iter() {
            let entry = Self::parse_key(property, key_type).and_then(|key| {
                let item = mapper.handle_property(namespace, item, value_type)?;
                Ok((key, item))
            });
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) if mapper.config().skip_invalid_map_entries => {
                    warn!(property, error = %e, "skipping map entry that failed to deserialize");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Dynamic::Map(entries))
    }
}
