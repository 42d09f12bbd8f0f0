//! Structural equality and non-null merge over dynamic values.

use crate::dynamic::Dynamic;
use crate::error::{MapperError, MapperResult};
use crate::mapper::EntityMapper;
use crate::record::Record;
use std::mem;

fn heterogeneous(left: &Dynamic, right: &Dynamic) -> MapperError {
    MapperError::heterogeneous(left.type_name(), right.type_name())
}

/// Deep equality.
///
/// Lists compare position by position, sets ignore order, maps compare
/// entries by key. Records compare every declared field, except the key
/// field when `ignore_key` is set; the flag applies at every depth.
///
/// # Errors
///
/// Returns [`MapperError::Heterogeneous`] if two non-null values being
/// compared differ in type.
pub fn is_same(mapper: &EntityMapper, left: &Dynamic, right: &Dynamic, ignore_key: bool) -> MapperResult<bool> {
    match (left, right) {
        (Dynamic::Null, Dynamic::Null) => Ok(true),
        (Dynamic::Null, _) | (_, Dynamic::Null) => Ok(false),
        (Dynamic::Bool(a), Dynamic::Bool(b)) => Ok(a == b),
        (Dynamic::Int(a), Dynamic::Int(b)) => Ok(a == b),
        (Dynamic::Long(a), Dynamic::Long(b)) => Ok(a == b),
        #[allow(clippy::float_cmp)]
        (Dynamic::Float(a), Dynamic::Float(b)) => Ok(a == b),
        #[allow(clippy::float_cmp)]
        (Dynamic::Double(a), Dynamic::Double(b)) => Ok(a == b),
        (Dynamic::String(a), Dynamic::String(b)) => Ok(a == b),
        (Dynamic::Timestamp(a), Dynamic::Timestamp(b)) => Ok(a == b),
        (Dynamic::List(a), Dynamic::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !is_same(mapper, x, y, ignore_key)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Dynamic::Set(a), Dynamic::Set(b)) => same_unordered(mapper, a, b, ignore_key),
        (Dynamic::Map(a), Dynamic::Map(b)) => same_entries(mapper, a, b, ignore_key),
        (Dynamic::Record(a), Dynamic::Record(b)) => same_record(mapper, a.as_ref(), b.as_ref(), ignore_key),
        _ => Err(heterogeneous(left, right)),
    }
}

fn same_unordered(mapper: &EntityMapper, a: &[Dynamic], b: &[Dynamic], ignore_key: bool) -> MapperResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    let mut matched = vec![false; b.len()];
    for x in a {
        let mut found = false;
        for (i, y) in b.iter().enumerate() {
            if !matched[i] && is_same(mapper, x, y, ignore_key)? {
                matched[i] = true;
                found = true;
                break;
            }
        }
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

fn same_entries(
    mapper: &EntityMapper,
    a: &[(Dynamic, Dynamic)],
    b: &[(Dynamic, Dynamic)],
    ignore_key: bool,
) -> MapperResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (key, value) in a {
        let mut other = None;
        for (k, v) in b {
            if is_same(mapper, key, k, ignore_key)? {
                other = Some(v);
                break;
            }
        }
        match other {
            Some(v) if is_same(mapper, value, v, ignore_key)? => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

fn same_record(mapper: &EntityMapper, a: &dyn Record, b: &dyn Record, ignore_key: bool) -> MapperResult<bool> {
    if a.record_type() != b.record_type() {
        return Err(MapperError::heterogeneous(a.record_type().name(), b.record_type().name()));
    }
    let schema = mapper.schema_of(&a.record_type())?;
    for field in schema.fields() {
        if ignore_key && field.is_key() {
            continue;
        }
        let left = a.get_field(field.name()).unwrap_or(Dynamic::Null);
        let right = b.get_field(field.name()).unwrap_or(Dynamic::Null);
        if !is_same(mapper, &left, &right, ignore_key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Overlays the non-null parts of `source` onto `target`.
///
/// A null `source` leaves `target` untouched; records merge field by field,
/// skipping the key field when `ignore_key` is set; any other value in
/// `source` replaces `target` whole.
///
/// # Errors
///
/// Returns [`MapperError::Heterogeneous`] if two non-null values being
/// merged differ in type.
pub fn merge(mapper: &EntityMapper, source: Dynamic, target: Dynamic, ignore_key: bool) -> MapperResult<Dynamic> {
    match (source, target) {
        (Dynamic::Null, target) => Ok(target),
        (source, Dynamic::Null) => Ok(source),
        (Dynamic::Record(source), Dynamic::Record(mut target)) => {
            merge_record(mapper, source.as_ref(), target.as_mut(), ignore_key)?;
            Ok(Dynamic::Record(target))
        }
        (source, target) if mem::discriminant(&source) == mem::discriminant(&target) => Ok(source),
        (source, target) => Err(heterogeneous(&source, &target)),
    }
}

fn merge_record(mapper: &EntityMapper, source: &dyn Record, target: &mut dyn Record, ignore_key: bool) -> MapperResult<()> {
    if source.record_type() != target.record_type() {
        return Err(MapperError::heterogeneous(
            source.record_type().name(),
            target.record_type().name(),
        ));
    }
    let schema = mapper.schema_of(&source.record_type())?;
    for field in schema.fields() {
        if ignore_key && field.is_key() {
            continue;
        }
        let Some(incoming) = source.get_field(field.name()).filter(|v| !v.is_null()) else {
            continue;
        };
        let current = target.get_field(field.name()).unwrap_or(Dynamic::Null);
        let merged = merge(mapper, incoming, current, ignore_key)
            .map_err(|e| MapperError::field(schema.name(), field.name(), e))?;
        target.set_field(field.name(), merged)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::record::Entity;
    use crate::schema::Schema;
    use entimap_value::KeyKind;

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Inner {
            n: Option<i64>,
            s: Option<String>,
        }
    }

    impl Entity for Inner {}

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Outer {
            id: i64,
            name: Option<String>,
            tags: Vec<String>,
            inner: Option<Inner>,
        }
    }

    impl Entity for Outer {
        fn schema() -> MapperResult<Schema> {
            Schema::builder::<Self>().key("id", KeyKind::Long).build()
        }
    }

    fn strings(items: &[&str]) -> Dynamic {
        Dynamic::List(items.iter().map(|s| Dynamic::String((*s).to_string())).collect())
    }

    #[test]
    fn equal_lists_are_same() {
        let mapper = EntityMapper::new();
        assert!(is_same(&mapper, &strings(&["a", "b"]), &strings(&["a", "b"]), false).unwrap());
        assert!(!is_same(&mapper, &strings(&["a", "b"]), &strings(&["b", "a"]), false).unwrap());
        assert!(!is_same(&mapper, &strings(&["a"]), &strings(&["a", "b"]), false).unwrap());
    }

    #[test]
    fn sets_ignore_order() {
        let mapper = EntityMapper::new();
        let a = Dynamic::Set(vec![Dynamic::Int(1), Dynamic::Int(2)]);
        let b = Dynamic::Set(vec![Dynamic::Int(2), Dynamic::Int(1)]);
        assert!(is_same(&mapper, &a, &b, false).unwrap());
    }

    #[test]
    fn null_is_only_same_as_null() {
        let mapper = EntityMapper::new();
        assert!(is_same(&mapper, &Dynamic::Null, &Dynamic::Null, false).unwrap());
        assert!(!is_same(&mapper, &Dynamic::Null, &Dynamic::Int(0), false).unwrap());
    }

    #[test]
    fn different_types_are_heterogeneous() {
        let mapper = EntityMapper::new();
        let err = is_same(&mapper, &Dynamic::Int(1), &Dynamic::Long(1), false).unwrap_err();
        assert!(matches!(err, MapperError::Heterogeneous { .. }));
    }

    #[test]
    fn merge_rejects_different_types() {
        let mapper = EntityMapper::new();
        let err = merge(&mapper, Dynamic::Long(1), Dynamic::String("a".into()), false).unwrap_err();
        assert!(matches!(err, MapperError::Heterogeneous { .. }));

        let inner = Dynamic::Record(Box::new(Inner::default()));
        let outer = Dynamic::Record(Box::new(Outer::default()));
        let err = merge(&mapper, inner, outer, false).unwrap_err();
        assert!(matches!(err, MapperError::Heterogeneous { .. }));
    }

    #[test]
    fn ignore_key_skips_the_key_field() {
        let mapper = EntityMapper::new();
        let a = Outer {
            id: 1,
            name: Some("x".into()),
            ..Outer::default()
        };
        let b = Outer { id: 2, ..a.clone() };
        assert!(!mapper.is_same(&a, &b, false).unwrap());
        assert!(mapper.is_same(&a, &b, true).unwrap());
    }

    #[test]
    fn merge_keeps_target_where_source_is_null() {
        let mapper = EntityMapper::new();
        let source = Outer {
            id: 9,
            name: None,
            tags: vec!["new".into()],
            inner: Some(Inner {
                n: Some(5),
                s: None,
            }),
        };
        let target = Outer {
            id: 1,
            name: Some("kept".into()),
            tags: vec!["old".into(), "older".into()],
            inner: Some(Inner {
                n: Some(1),
                s: Some("kept too".into()),
            }),
        };

        let merged = mapper.merge_non_null_fields(&source, target.clone(), true).unwrap();
        assert_eq!(merged.id, 1);
        assert_eq!(merged.name.as_deref(), Some("kept"));
        assert_eq!(merged.tags, vec!["new".to_string()]);
        assert_eq!(
            merged.inner,
            Some(Inner {
                n: Some(5),
                s: Some("kept too".into()),
            })
        );

        let again = mapper.merge_non_null_fields(&source, merged.clone(), true).unwrap();
        assert_eq!(again, merged);
    }

    #[test]
    fn merge_copies_key_unless_ignored() {
        let mapper = EntityMapper::new();
        let source = Outer {
            id: 9,
            ..Outer::default()
        };
        let merged = mapper.merge_non_null_fields(&source, Outer::default(), false).unwrap();
        assert_eq!(merged.id, 9);
    }
}
