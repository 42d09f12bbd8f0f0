//! Runtime values handed to codecs.

use crate::error::{MapperError, MapperResult};
use crate::record::Record;
use crate::types::{short_type_name, RecordType, TypeRef};
use entimap_value::Timestamp;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// An application value in a shape every codec understands.
///
/// Records travel boxed, so a `Dynamic` can carry any mapped struct without
/// the codec knowing its concrete type.
#[derive(Debug)]
pub enum Dynamic {
    /// Absent value (`None`).
    Null,
    /// `bool`.
    Bool(bool),
    /// `i32`.
    Int(i32),
    /// `i64`.
    Long(i64),
    /// `f32`.
    Float(f32),
    /// `f64`.
    Double(f64),
    /// `String`.
    String(String),
    /// Timestamp.
    Timestamp(Timestamp),
    /// Ordered sequence.
    List(Vec<Dynamic>),
    /// Set; element order carries no meaning.
    Set(Vec<Dynamic>),
    /// Map entries.
    Map(Vec<(Dynamic, Dynamic)>),
    /// A mapped struct.
    Record(Box<dyn Record>),
}

impl Clone for Dynamic {
    fn clone(&self) -> Self {
        match self {
            Dynamic::Null => Dynamic::Null,
            Dynamic::Bool(b) => Dynamic::Bool(*b),
            Dynamic::Int(n) => Dynamic::Int(*n),
            Dynamic::Long(n) => Dynamic::Long(*n),
            Dynamic::Float(x) => Dynamic::Float(*x),
            Dynamic::Double(x) => Dynamic::Double(*x),
            Dynamic::String(s) => Dynamic::String(s.clone()),
            Dynamic::Timestamp(ts) => Dynamic::Timestamp(*ts),
            Dynamic::List(items) => Dynamic::List(items.clone()),
            Dynamic::Set(items) => Dynamic::Set(items.clone()),
            Dynamic::Map(entries) => Dynamic::Map(entries.clone()),
            Dynamic::Record(record) => Dynamic::Record(record.clone_record()),
        }
    }
}

impl Dynamic {
    /// Returns `true` for [`Dynamic::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// Name of the runtime type, for logs and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "i32",
            Dynamic::Long(_) => "i64",
            Dynamic::Float(_) => "f32",
            Dynamic::Double(_) => "f64",
            Dynamic::String(_) => "String",
            Dynamic::Timestamp(_) => "Timestamp",
            Dynamic::List(_) => "List",
            Dynamic::Set(_) => "Set",
            Dynamic::Map(_) => "Map",
            Dynamic::Record(record) => record.record_type().name(),
        }
    }

    /// Returns the boxed record, if this is one.
    pub fn as_record(&self) -> Option<&dyn Record> {
        match self {
            Dynamic::Record(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Text used for this value as a map key or discriminator.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for values without a textual form.
    pub fn to_key_string(&self) -> MapperResult<String> {
        match self {
            Dynamic::Bool(b) => Ok(b.to_string()),
            Dynamic::Int(n) => Ok(n.to_string()),
            Dynamic::Long(n) => Ok(n.to_string()),
            Dynamic::Float(x) => Ok(x.to_string()),
            Dynamic::Double(x) => Ok(x.to_string()),
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(MapperError::type_mismatch("scalar", other.type_name())),
        }
    }

    /// Converts into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value does not hold a `T`.
    pub fn into_value<T: Mappable>(self) -> MapperResult<T> {
        T::from_dynamic(self)
    }

    fn mismatch(self, expected: impl Into<String>) -> MapperError {
        MapperError::type_mismatch(expected, self.type_name())
    }
}

/// Conversion between a Rust type and [`Dynamic`], plus its declared type.
pub trait Mappable: Sized + Send + Sync + 'static {
    /// Declared type of this Rust type.
    fn type_ref() -> TypeRef;

    /// Converts a reference into a dynamic value.
    fn to_dynamic(&self) -> Dynamic;

    /// Converts a dynamic value back.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if `value` does not hold this type.
    fn from_dynamic(value: Dynamic) -> MapperResult<Self>;

    /// Whether the type accepts [`Dynamic::Null`].
    fn nullable() -> bool {
        false
    }
}

macro_rules! scalar_mappable {
    ($ty:ty, $variant:ident, $type_ref:expr, |$this:ident| $to:expr) => {
        impl Mappable for $ty {
            fn type_ref() -> TypeRef {
                $type_ref
            }

            fn to_dynamic(&self) -> Dynamic {
                let $this = self;
                Dynamic::$variant($to)
            }

            fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
                match value {
                    Dynamic::$variant(v) => Ok(v),
                    other => Err(other.mismatch(stringify!($ty))),
                }
            }
        }
    };
}

scalar_mappable!(bool, Bool, TypeRef::Bool, |v| *v);
scalar_mappable!(i32, Int, TypeRef::Int, |v| *v);
scalar_mappable!(i64, Long, TypeRef::Long, |v| *v);
scalar_mappable!(f32, Float, TypeRef::Float, |v| *v);
scalar_mappable!(f64, Double, TypeRef::Double, |v| *v);
scalar_mappable!(String, String, TypeRef::String, |v| v.clone());
scalar_mappable!(Timestamp, Timestamp, TypeRef::Timestamp, |v| *v);

impl<T: Mappable> Mappable for Option<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn to_dynamic(&self) -> Dynamic {
        self.as_ref().map_or(Dynamic::Null, Mappable::to_dynamic)
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        match value {
            Dynamic::Null => Ok(None),
            other => T::from_dynamic(other).map(Some),
        }
    }

    fn nullable() -> bool {
        true
    }
}

fn into_elements(value: Dynamic, expected: &str) -> MapperResult<Vec<Dynamic>> {
    match value {
        Dynamic::List(items) | Dynamic::Set(items) => Ok(items),
        other => Err(other.mismatch(expected)),
    }
}

fn into_entries(value: Dynamic) -> MapperResult<Vec<(Dynamic, Dynamic)>> {
    match value {
        Dynamic::Map(entries) => Ok(entries),
        other => Err(other.mismatch("Map")),
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn type_ref() -> TypeRef {
        TypeRef::list(T::type_ref())
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::List(self.iter().map(Mappable::to_dynamic).collect())
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        into_elements(value, "List")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

impl<T: Mappable + Eq + Hash> Mappable for HashSet<T> {
    fn type_ref() -> TypeRef {
        TypeRef::set(T::type_ref())
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Set(self.iter().map(Mappable::to_dynamic).collect())
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        into_elements(value, "Set")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

impl<T: Mappable + Ord> Mappable for BTreeSet<T> {
    fn type_ref() -> TypeRef {
        TypeRef::set(T::type_ref())
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Set(self.iter().map(Mappable::to_dynamic).collect())
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        into_elements(value, "Set")?
            .into_iter()
            .map(T::from_dynamic)
            .collect()
    }
}

impl<K: Mappable + Eq + Hash, V: Mappable> Mappable for HashMap<K, V> {
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Map(
            self.iter()
                .map(|(k, v)| (k.to_dynamic(), v.to_dynamic()))
                .collect(),
        )
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        into_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_dynamic(k)?, V::from_dynamic(v)?)))
            .collect()
    }
}

impl<K: Mappable + Ord, V: Mappable> Mappable for BTreeMap<K, V> {
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Map(
            self.iter()
                .map(|(k, v)| (k.to_dynamic(), v.to_dynamic()))
                .collect(),
        )
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        into_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_dynamic(k)?, V::from_dynamic(v)?)))
            .collect()
    }
}

/// Unboxes a dynamic record into its concrete type.
///
/// # Errors
///
/// Returns a type mismatch if `value` is not a record of type `T`.
pub fn downcast_record<T: Record>(value: Dynamic) -> MapperResult<T> {
    match value {
        Dynamic::Record(record) => {
            let actual = record.record_type().name();
            record
                .into_any()
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| MapperError::type_mismatch(short_type_name::<T>(), actual))
        }
        other => Err(other.mismatch(short_type_name::<T>())),
    }
}

/// A record whose concrete type is chosen at runtime.
///
/// Use it for fields resolved through a discriminator, and as the result of
/// deserializing into an abstract [`RecordType`].
#[derive(Debug)]
pub struct AnyRecord(Box<dyn Record>);

impl AnyRecord {
    /// Boxes a concrete record.
    pub fn new<T: Record>(record: T) -> Self {
        Self(Box::new(record))
    }

    /// Handle to the concrete type.
    pub fn record_type(&self) -> RecordType {
        self.0.record_type()
    }

    /// Borrows the inner record.
    pub fn as_record(&self) -> &dyn Record {
        self.0.as_ref()
    }

    /// Downcasts by reference.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Downcasts by value, returning `self` unchanged on mismatch.
    ///
    /// # Errors
    ///
    /// Returns the original record if it is not a `T`.
    pub fn downcast<T: Record + Clone>(self) -> Result<T, Self> {
        match self.downcast_ref::<T>() {
            Some(record) => Ok(record.clone()),
            None => Err(self),
        }
    }
}

impl Clone for AnyRecord {
    fn clone(&self) -> Self {
        Self(self.0.clone_record())
    }
}

impl Mappable for AnyRecord {
    fn type_ref() -> TypeRef {
        TypeRef::AnyRecord
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Record(self.0.clone_record())
    }

    fn from_dynamic(value: Dynamic) -> MapperResult<Self> {
        match value {
            Dynamic::Record(record) => Ok(Self(record)),
            other => Err(other.mismatch("record")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_none_to_null() {
        assert!(None::<i32>.to_dynamic().is_null());
        assert_eq!(Option::<i32>::from_dynamic(Dynamic::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_dynamic(Dynamic::Int(3)).unwrap(), Some(3));
        assert!(Option::<i32>::nullable());
        assert!(!i32::nullable());
        assert_eq!(Option::<String>::type_ref(), TypeRef::String);
    }

    #[test]
    fn scalars_reject_other_variants() {
        let err = i32::from_dynamic(Dynamic::Long(3)).unwrap_err();
        assert!(matches!(
            err,
            MapperError::TypeMismatch { expected, actual } if expected == "i32" && actual == "i64"
        ));
        assert!(String::from_dynamic(Dynamic::Null).is_err());
    }

    #[test]
    fn collections_convert_elementwise() {
        let list = vec![1i64, 2, 3].to_dynamic();
        assert_eq!(Vec::<i64>::from_dynamic(list).unwrap(), vec![1, 2, 3]);

        let set: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let back = HashSet::<String>::from_dynamic(set.to_dynamic()).unwrap();
        assert_eq!(back, set);

        let mut map = BTreeMap::new();
        map.insert(1i32, true);
        map.insert(2i32, false);
        let back = BTreeMap::<i32, bool>::from_dynamic(map.to_dynamic()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn set_deduplicates_on_the_way_back() {
        let dynamic = Dynamic::Set(vec![Dynamic::Long(1), Dynamic::Long(1), Dynamic::Long(2)]);
        let set = BTreeSet::<i64>::from_dynamic(dynamic).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn collection_type_refs() {
        assert_eq!(Vec::<i32>::type_ref(), TypeRef::list(TypeRef::Int));
        assert_eq!(
            HashMap::<String, Vec<f64>>::type_ref(),
            TypeRef::map(TypeRef::String, TypeRef::list(TypeRef::Double))
        );
    }

    #[test]
    fn key_strings() {
        assert_eq!(Dynamic::Long(42).to_key_string().unwrap(), "42");
        assert_eq!(Dynamic::Bool(true).to_key_string().unwrap(), "true");
        assert_eq!(Dynamic::Double(1.5).to_key_string().unwrap(), "1.5");
        assert!(Dynamic::List(vec![]).to_key_string().is_err());
    }
}
