//! Field accessor capability for mapped structs.

use crate::dynamic::{Dynamic, Mappable};
use crate::error::MapperResult;
use crate::schema::Schema;
use crate::types::{FieldInfo, RecordType};
use std::any::Any;
use std::fmt;

/// Read and write access to a struct's fields by name.
///
/// This trait is object safe; the mapper works on `&dyn Record` so that a
/// codec never needs to know the concrete type it handles. Implement it with
/// the [`crate::record!`] macro.
pub trait Record: Any + Send + Sync + fmt::Debug {
    /// Handle to this record's type.
    fn record_type(&self) -> RecordType;

    /// Returns the current value of `name`, or `None` if no such field exists.
    fn get_field(&self, name: &str) -> Option<Dynamic>;

    /// Replaces the value of `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or `value` has the wrong type.
    fn set_field(&mut self, name: &str, value: Dynamic) -> MapperResult<()>;

    /// Clones this record behind a new box.
    fn clone_record(&self) -> Box<dyn Record>;

    /// Upcast for downcasting by reference.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Every declared field, in declaration order.
    fn declared_fields() -> Vec<FieldInfo>
    where
        Self: Sized;
}

impl dyn Record {
    /// Downcasts to a concrete record type.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A record that can be stored as a document of its own.
///
/// The default [`Entity::schema`] maps every declared field as a plain
/// property under its own name, with the type's name as kind. Override it to
/// declare keys, ancestors and the other per-field options.
///
/// ```
/// use entimap_core::{record, Entity, MapperResult, Schema};
/// use entimap_value::KeyKind;
///
/// record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Note {
///         pub id: String,
///         pub text: String,
///     }
/// }
///
/// impl Entity for Note {
///     fn schema() -> MapperResult<Schema> {
///         Schema::builder::<Self>().kind("Note").key("id", KeyKind::String).build()
///     }
/// }
///
/// let schema = Note::schema().unwrap();
/// assert_eq!(schema.kind(), "Note");
/// ```
pub trait Entity: Record + Mappable + Default + Clone {
    /// Describes how this type maps to a document.
    ///
    /// # Errors
    ///
    /// Returns a schema error if the description is invalid.
    fn schema() -> MapperResult<Schema> {
        Schema::builder::<Self>().build()
    }

    /// Handle to this type.
    fn entity_type() -> RecordType {
        RecordType::of::<Self>()
    }
}
