//! Field-bound codecs shipped with the crate.

use super::CustomCodec;
use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use entimap_value::{Timestamp, Value};

/// Stores an `i64` field of epoch milliseconds as a timestamp value.
///
/// ```
/// use entimap_core::{record, Entity, MapperResult, Schema, TimestampMillisCodec};
///
/// record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Event {
///         pub at: i64,
///     }
/// }
///
/// impl Entity for Event {
///     fn schema() -> MapperResult<Schema> {
///         Schema::builder::<Self>().codec("at", TimestampMillisCodec).build()
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampMillisCodec;

impl CustomCodec for TimestampMillisCodec {
    fn serialize(&self, _: &EntityMapper, value: &Dynamic, exclude_from_index: bool) -> MapperResult<Value> {
        match value {
            Dynamic::Long(millis) => {
                Ok(Value::timestamp(Timestamp::from_millis(*millis)).excluded(exclude_from_index))
            }
            other => Err(MapperError::type_mismatch("i64", other.type_name())),
        }
    }

    fn deserialize(&self, _: &EntityMapper, value: &Value) -> MapperResult<Dynamic> {
        Ok(Dynamic::Long(value.expect_timestamp()?.as_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_survive_the_store() {
        let mapper = EntityMapper::new();
        let stored = TimestampMillisCodec
            .serialize(&mapper, &Dynamic::Long(1_700_000_000_123), false)
            .unwrap();
        assert_eq!(
            stored.as_timestamp(),
            Some(Timestamp::from_millis(1_700_000_000_123))
        );

        let back = TimestampMillisCodec.deserialize(&mapper, &stored).unwrap();
        assert!(matches!(back, Dynamic::Long(1_700_000_000_123)));
    }

    #[test]
    fn rejects_non_timestamps() {
        let mapper = EntityMapper::new();
        let err = TimestampMillisCodec
            .deserialize(&mapper, &Value::integer(5))
            .unwrap_err();
        assert!(matches!(err, MapperError::Value(_)));
    }
}
