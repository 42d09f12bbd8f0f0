//! Scalar codecs.

use super::Codec;
use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use crate::types::TypeRef;
use entimap_value::{Namespace, Value, ValueType};
use tracing::debug;

fn unexpected(expected: &str, value: &Dynamic) -> MapperError {
    MapperError::type_mismatch(expected, value.type_name())
}

/// `bool` as a boolean value.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Bool(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing bool to a value of type bool");
        match value {
            Dynamic::Bool(b) => Ok(Value::bool(*b).excluded(exclude_from_index)),
            other => Err(unexpected("bool", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::Bool && value.value_type() == ValueType::Bool
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type bool as a bool");
        Ok(Dynamic::Bool(value.expect_bool()?))
    }
}

/// `i32` widened to an integer value, narrowed on the way back.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Int(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing i32 to a value of type integer");
        match value {
            Dynamic::Int(n) => Ok(Value::integer(i64::from(*n)).excluded(exclude_from_index)),
            other => Err(unexpected("i32", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::Int && value.value_type() == ValueType::Integer
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type integer as an i32");
        let n = value.expect_integer()?;
        i32::try_from(n)
            .map(Dynamic::Int)
            .map_err(|_| MapperError::resolution("i32", format!("{n} is out of range")))
    }
}

/// `i64` as an integer value.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongCodec;

impl Codec for LongCodec {
    fn name(&self) -> &'static str {
        "long"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Long(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing i64 to a value of type integer");
        match value {
            Dynamic::Long(n) => Ok(Value::integer(*n).excluded(exclude_from_index)),
            other => Err(unexpected("i64", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::Long && value.value_type() == ValueType::Integer
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type integer as an i64");
        Ok(Dynamic::Long(value.expect_integer()?))
    }
}

/// `f32` widened to a double value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCodec;

impl Codec for FloatCodec {
    fn name(&self) -> &'static str {
        "float"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Float(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing f32 to a value of type double");
        match value {
            Dynamic::Float(x) => Ok(Value::double(f64::from(*x)).excluded(exclude_from_index)),
            other => Err(unexpected("f32", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::Float && value.value_type() == ValueType::Double
    }

    #[allow(clippy::cast_possible_truncation)]
    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type double as an f32");
        Ok(Dynamic::Float(value.expect_double()? as f32))
    }
}

/// `f64` as a double value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleCodec;

impl Codec for DoubleCodec {
    fn name(&self) -> &'static str {
        "double"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Double(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing f64 to a value of type double");
        match value {
            Dynamic::Double(x) => Ok(Value::double(*x).excluded(exclude_from_index)),
            other => Err(unexpected("f64", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::Double && value.value_type() == ValueType::Double
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type double as an f64");
        Ok(Dynamic::Double(value.expect_double()?))
    }
}

/// `String` as a string value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::String(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing String to a value of type string");
        match value {
            Dynamic::String(s) => Ok(Value::string(s.clone()).excluded(exclude_from_index)),
            other => Err(unexpected("String", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        *declared == TypeRef::String && value.value_type() == ValueType::String
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, _: &TypeRef) -> MapperResult<Dynamic> {
        debug!("deserializing value type string as a String");
        Ok(Dynamic::String(value.expect_str()?.to_string()))
    }
}

/// Timestamps as timestamp values.
///
/// Also reads a stored timestamp into an `i64` field as epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl Codec for TimestampCodec {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn can_serialize(&self, value: &Dynamic) -> bool {
        matches!(value, Dynamic::Timestamp(_))
    }

    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        debug!("serializing Timestamp to a value of type timestamp");
        match value {
            Dynamic::Timestamp(ts) => Ok(Value::timestamp(*ts).excluded(exclude_from_index)),
            other => Err(unexpected("Timestamp", other)),
        }
    }

    fn can_deserialize(&self, declared: &TypeRef, value: &Value) -> bool {
        matches!(declared, TypeRef::Timestamp | TypeRef::Long)
            && value.value_type() == ValueType::Timestamp
    }

    fn deserialize(&self, _: &EntityMapper, _: &Namespace, value: &Value, declared: &TypeRef) -> MapperResult<Dynamic> {
        debug!(declared = %declared, "deserializing value type timestamp");
        let ts = value.expect_timestamp()?;
        match declared {
            TypeRef::Long => Ok(Dynamic::Long(ts.as_millis())),
            _ => Ok(Dynamic::Timestamp(ts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entimap_value::Timestamp;

    fn mapper() -> EntityMapper {
        EntityMapper::new()
    }

    fn ns() -> Namespace {
        Namespace::default()
    }

    #[test]
    fn integer_widens_and_narrows() {
        let m = mapper();
        let value = IntegerCodec.serialize(&m, &Dynamic::Int(-7), false).unwrap();
        assert_eq!(value, Value::integer(-7));

        let back = IntegerCodec.deserialize(&m, &ns(), &value, &TypeRef::Int).unwrap();
        assert!(matches!(back, Dynamic::Int(-7)));
    }

    #[test]
    fn integer_rejects_out_of_range() {
        let m = mapper();
        let value = Value::integer(i64::from(i32::MAX) + 1);
        let err = IntegerCodec.deserialize(&m, &ns(), &value, &TypeRef::Int).unwrap_err();
        assert!(matches!(err, MapperError::Resolution { .. }));
    }

    #[test]
    fn float_collapses_to_double() {
        let m = mapper();
        let value = FloatCodec.serialize(&m, &Dynamic::Float(1.5), true).unwrap();
        assert_eq!(value.as_double(), Some(1.5));
        assert!(value.exclude_from_index);
        assert!(FloatCodec.can_deserialize(&TypeRef::Float, &value));
        assert!(!FloatCodec.can_deserialize(&TypeRef::Double, &value));
    }

    #[test]
    fn deserialize_requires_type_and_tag_agreement() {
        assert!(LongCodec.can_deserialize(&TypeRef::Long, &Value::integer(1)));
        assert!(!LongCodec.can_deserialize(&TypeRef::Int, &Value::integer(1)));
        assert!(!LongCodec.can_deserialize(&TypeRef::Long, &Value::string("1")));
        assert!(!StringCodec.can_deserialize(&TypeRef::String, &Value::integer(1)));
    }

    #[test]
    fn serialize_matches_exact_runtime_type() {
        assert!(IntegerCodec.can_serialize(&Dynamic::Int(1)));
        assert!(!IntegerCodec.can_serialize(&Dynamic::Long(1)));
        assert!(LongCodec.can_serialize(&Dynamic::Long(1)));
        assert!(!BooleanCodec.can_serialize(&Dynamic::String("true".into())));
    }

    #[test]
    fn timestamp_reads_into_long_as_millis() {
        let m = mapper();
        let value = Value::timestamp(Timestamp::from_millis(1_234));
        assert!(TimestampCodec.can_deserialize(&TypeRef::Long, &value));

        let back = TimestampCodec.deserialize(&m, &ns(), &value, &TypeRef::Long).unwrap();
        assert!(matches!(back, Dynamic::Long(1_234)));

        let back = TimestampCodec
            .deserialize(&m, &ns(), &value, &TypeRef::Timestamp)
            .unwrap();
        assert!(matches!(back, Dynamic::Timestamp(ts) if ts == Timestamp::from_millis(1_234)));
    }

    #[test]
    fn serialize_rejects_foreign_values() {
        let m = mapper();
        let err = StringCodec.serialize(&m, &Dynamic::Bool(true), false).unwrap_err();
        assert!(matches!(err, MapperError::TypeMismatch { .. }));
    }
}
