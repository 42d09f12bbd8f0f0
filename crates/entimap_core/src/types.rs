//! Declared types: what a field or a deserialization target is expected to hold.

use crate::error::MapperResult;
use crate::record::{Entity, Record};
use crate::schema::Schema;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to a record type.
///
/// Carries the type's identity and name, the function that describes its
/// schema, and a factory for a default instance. Abstract (polymorphic) types
/// have no factory; deserializing into them requires a discriminator.
///
/// Two handles are equal when they refer to the same Rust type.
#[derive(Clone, Copy)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
    describe: fn() -> MapperResult<Schema>,
    factory: Option<fn() -> Box<dyn Record>>,
}

fn instantiate<T: Entity>() -> Box<dyn Record> {
    Box::new(T::default())
}

impl RecordType {
    /// Handle for a concrete entity type.
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
            describe: T::schema,
            factory: Some(instantiate::<T>),
        }
    }

    /// Handle for an abstract type identified by the marker `M`.
    ///
    /// `describe` must return a schema carrying a type-level discriminator.
    pub fn polymorphic<M: 'static>(name: &'static str, describe: fn() -> MapperResult<Schema>) -> Self {
        Self {
            id: TypeId::of::<M>(),
            name,
            describe,
            factory: None,
        }
    }

    /// Identity of the underlying Rust type.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Short type name, used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Derives the schema. Callers should go through the mapper's cache.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the schema is invalid.
    pub fn describe(&self) -> MapperResult<Schema> {
        (self.describe)()
    }

    /// Returns `true` if the type cannot be instantiated directly.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.factory.is_none()
    }

    /// Creates a default instance, or `None` for abstract types.
    #[must_use]
    pub fn instantiate(&self) -> Option<Box<dyn Record>> {
        self.factory.map(|factory| factory())
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The declared type of a field, collection element or deserialization target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `bool`.
    Bool,
    /// `i32`.
    Int,
    /// `i64`.
    Long,
    /// `f32`.
    Float,
    /// `f64`.
    Double,
    /// `String`.
    String,
    /// [`entimap_value::Timestamp`].
    Timestamp,
    /// Ordered sequence of the element type.
    List(Box<TypeRef>),
    /// Set of the element type.
    Set(Box<TypeRef>),
    /// Map from key type to value type.
    Map(Box<TypeRef>, Box<TypeRef>),
    /// A record type.
    Record(RecordType),
    /// A record whose concrete type is only known at runtime.
    AnyRecord,
}

impl TypeRef {
    /// List of `element`.
    #[must_use]
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// Set of `element`.
    #[must_use]
    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(Box::new(element))
    }

    /// Map from `key` to `value`.
    #[must_use]
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// Returns the record type if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<RecordType> {
        match self {
            TypeRef::Record(record_type) => Some(*record_type),
            _ => None,
        }
    }

    /// Returns `true` for records, concrete or not.
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, TypeRef::Record(_) | TypeRef::AnyRecord)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Int => f.write_str("i32"),
            TypeRef::Long => f.write_str("i64"),
            TypeRef::Float => f.write_str("f32"),
            TypeRef::Double => f.write_str("f64"),
            TypeRef::String => f.write_str("String"),
            TypeRef::Timestamp => f.write_str("Timestamp"),
            TypeRef::List(element) => write!(f, "List<{element}>"),
            TypeRef::Set(element) => write!(f, "Set<{element}>"),
            TypeRef::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            TypeRef::Record(record_type) => write!(f, "{record_type}"),
            TypeRef::AnyRecord => f.write_str("AnyRecord"),
        }
    }
}

/// A field as declared on a record: name, type and nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name.
    pub name: &'static str,
    /// Declared type. For `Option<T>` this is the type of `T`.
    pub type_ref: TypeRef,
    /// Whether the field accepts null (`Option<T>`).
    pub nullable: bool,
}

impl FieldInfo {
    /// Describes a field of type `T`.
    pub fn of<T: crate::dynamic::Mappable>(name: &'static str) -> Self {
        Self {
            name,
            type_ref: T::type_ref(),
            nullable: T::nullable(),
        }
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
