//! Schema descriptors: how one record type maps to a document.

use crate::codec::CustomCodec;
use crate::error::{MapperError, MapperResult};
use crate::external::ChildAncestors;
use crate::record::Entity;
use crate::types::{RecordType, TypeRef};
use entimap_value::KeyKind;
use std::fmt;
use std::sync::Arc;

/// How a field participates in mapping.
#[derive(Clone)]
pub enum FieldRole {
    /// Stored as a document property.
    Plain,
    /// Supplies the identifier of the document key.
    Key(KeyKind),
    /// Supplies one element of the ancestor path.
    Ancestor {
        /// Kind of the ancestor.
        kind: String,
        /// Representation of the ancestor's identifier.
        key_kind: KeyKind,
        /// 1-based position among the type's ancestors.
        order: u32,
    },
    /// Never stored or read.
    Skip,
    /// Filled after deserialization from a child repository.
    External(Arc<dyn ChildAncestors>),
}

impl fmt::Debug for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Plain => f.write_str("Plain"),
            FieldRole::Key(key_kind) => f.debug_tuple("Key").field(key_kind).finish(),
            FieldRole::Ancestor {
                kind,
                key_kind,
                order,
            } => f
                .debug_struct("Ancestor")
                .field("kind", kind)
                .field("key_kind", key_kind)
                .field("order", order)
                .finish(),
            FieldRole::Skip => f.write_str("Skip"),
            FieldRole::External(_) => f.write_str("External"),
        }
    }
}

/// Mapping metadata for one field.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub(crate) name: &'static str,
    pub(crate) property: String,
    pub(crate) type_ref: TypeRef,
    pub(crate) nullable: bool,
    pub(crate) role: FieldRole,
    pub(crate) exclude_from_index: bool,
    pub(crate) flatten: bool,
    pub(crate) codec: Option<Arc<dyn CustomCodec>>,
    pub(crate) subtypes: Option<Discriminator>,
}

impl FieldDescriptor {
    /// Field name on the struct.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Property name on the document.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Declared type.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Whether the field accepts null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Role of the field.
    pub fn role(&self) -> &FieldRole {
        &self.role
    }

    /// Whether the stored value is excluded from indexes.
    pub fn excludes_from_index(&self) -> bool {
        self.exclude_from_index
    }

    /// Whether the field's own properties are hoisted into the parent document.
    pub fn is_flattened(&self) -> bool {
        self.flatten
    }

    /// Custom codec overriding registry resolution, if any.
    pub fn codec(&self) -> Option<&dyn CustomCodec> {
        self.codec.as_deref()
    }

    /// Subtype table for a polymorphic field, if any.
    pub fn subtypes(&self) -> Option<&Discriminator> {
        self.subtypes.as_ref()
    }

    /// Returns `true` if the field is stored as a property.
    pub fn is_plain(&self) -> bool {
        matches!(self.role, FieldRole::Plain)
    }

    /// Returns `true` for the key field.
    pub fn is_key(&self) -> bool {
        matches!(self.role, FieldRole::Key(_))
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("property", &self.property)
            .field("type_ref", &self.type_ref)
            .field("role", &self.role)
            .field("flatten", &self.flatten)
            .field("custom_codec", &self.codec.is_some())
            .field("subtypes", &self.subtypes)
            .finish()
    }
}

/// Where a discriminator value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// A property inside the polymorphic value's own document.
    Internal,
    /// A sibling field of the owning record, already deserialized.
    External,
}

/// One entry of a subtype table.
#[derive(Debug, Clone)]
pub struct Subtype {
    name: String,
    aliases: Vec<String>,
    record_type: RecordType,
}

impl Subtype {
    /// Primary discriminator value.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative discriminator values.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Concrete type selected by this entry.
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    fn matches(&self, value: &str) -> bool {
        self.name == value || self.aliases.iter().any(|alias| alias == value)
    }
}

/// Polymorphic subtype resolution: where the discriminator lives, the
/// subtype table, and the fallback implementation.
///
/// ```
/// use entimap_core::{Discriminator, Inclusion};
///
/// let discriminator = Discriminator::internal("type");
/// assert_eq!(discriminator.property(), "type");
/// assert_eq!(discriminator.inclusion(), Inclusion::Internal);
/// ```
#[derive(Debug, Clone)]
pub struct Discriminator {
    property: String,
    inclusion: Inclusion,
    subtypes: Vec<Subtype>,
    default_impl: Option<RecordType>,
}

impl Discriminator {
    /// Reads the discriminator from `property` of the value's own document.
    pub fn internal(property: impl Into<String>) -> Self {
        Self::new(property.into(), Inclusion::Internal)
    }

    /// Reads the discriminator from the sibling field `field`.
    pub fn external(field: impl Into<String>) -> Self {
        Self::new(field.into(), Inclusion::External)
    }

    fn new(property: String, inclusion: Inclusion) -> Self {
        Self {
            property,
            inclusion,
            subtypes: Vec::new(),
            default_impl: None,
        }
    }

    /// Maps `name` to `T`.
    #[must_use]
    pub fn subtype<T: Entity>(self, name: impl Into<String>) -> Self {
        self.subtype_names::<T>(name, &[])
    }

    /// Maps `name` and every alias to `T`.
    #[must_use]
    pub fn subtype_names<T: Entity>(mut self, name: impl Into<String>, aliases: &[&str]) -> Self {
        self.subtypes.push(Subtype {
            name: name.into(),
            aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
            record_type: RecordType::of::<T>(),
        });
        self
    }

    /// Falls back to `T` when no entry matches.
    #[must_use]
    pub fn default_impl<T: Entity>(mut self) -> Self {
        self.default_impl = Some(RecordType::of::<T>());
        self
    }

    /// Property or sibling field the value is read from.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Where the value is read from.
    pub fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The subtype table, in declaration order.
    pub fn subtypes(&self) -> &[Subtype] {
        &self.subtypes
    }

    /// The fallback implementation, if any.
    pub fn default_type(&self) -> Option<RecordType> {
        self.default_impl
    }

    /// Picks the concrete type for a discriminator value.
    ///
    /// The first entry whose name or aliases contain `value` wins; otherwise
    /// the default implementation; otherwise an error.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownSubtype`] if nothing matches and no
    /// default is configured.
    pub fn resolve(&self, owner: &str, value: &str) -> MapperResult<RecordType> {
        self.subtypes
            .iter()
            .find(|subtype| subtype.matches(value))
            .map(Subtype::record_type)
            .or(self.default_impl)
            .ok_or_else(|| MapperError::unknown_subtype(owner, value))
    }

    /// Primary discriminator value for a concrete type.
    pub fn name_of(&self, record_type: &RecordType) -> Option<&str> {
        self.subtypes
            .iter()
            .find(|subtype| subtype.record_type == *record_type)
            .map(Subtype::name)
    }
}

/// Immutable mapping metadata for one record type.
///
/// Built once per type through [`Schema::builder`] and shared behind an
/// `Arc` by the mapper's cache.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) record_type: RecordType,
    pub(crate) kind: String,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) discriminator: Option<Discriminator>,
}

impl Schema {
    /// The type this schema describes.
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Short type name.
    pub fn name(&self) -> &'static str {
        self.record_type.name()
    }

    /// Store kind for documents of this type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Every field, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The key field, if the type has one.
    pub fn key_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.is_key())
    }

    /// Ancestor fields, in declaration order.
    pub fn ancestor_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|field| matches!(field.role, FieldRole::Ancestor { .. }))
    }

    /// Fields filled from child repositories.
    pub fn external_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|field| matches!(field.role, FieldRole::External(_)))
    }

    /// Type-level discriminator of an abstract type.
    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// Returns `true` if any field is flattened.
    pub fn has_flattened(&self) -> bool {
        self.fields.iter().any(|field| field.flatten)
    }

    /// Returns `true` if a document property with this name maps to a field.
    pub fn claims_property(&self, property: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field.is_plain() && !field.flatten && field.property == property)
            || self
                .discriminator
                .as_ref()
                .is_some_and(|discriminator| discriminator.property == property)
    }
}
