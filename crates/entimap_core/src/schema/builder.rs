//! Declarative schema construction and validation.

use super::descriptor::{Discriminator, FieldDescriptor, FieldRole, Inclusion, Schema};
use crate::codec::CustomCodec;
use crate::error::{MapperError, MapperResult};
use crate::external::ChildAncestors;
use crate::record::Entity;
use crate::types::{RecordType, TypeRef};
use entimap_value::KeyKind;
use std::collections::HashSet;
use std::sync::Arc;

impl Schema {
    /// Starts a schema for `T`, seeded with every declared field as a plain
    /// property under its own name and the type name as kind.
    pub fn builder<T: Entity>() -> SchemaBuilder {
        let record_type = RecordType::of::<T>();
        let fields = T::declared_fields()
            .into_iter()
            .map(|info| FieldDescriptor {
                name: info.name,
                property: info.name.to_string(),
                type_ref: info.type_ref,
                nullable: info.nullable,
                role: FieldRole::Plain,
                exclude_from_index: false,
                flatten: false,
                codec: None,
                subtypes: None,
            })
            .collect();
        SchemaBuilder::new(record_type, fields)
    }

    /// Starts a schema for an abstract type. It has no fields and must be
    /// given a [`SchemaBuilder::discriminator`].
    pub fn abstract_type(record_type: RecordType) -> SchemaBuilder {
        SchemaBuilder::new(record_type, Vec::new())
    }
}

/// Builder for [`Schema`]. Each call corresponds to one field annotation.
///
/// Problems such as unknown field names are collected and reported together
/// by [`SchemaBuilder::build`].
#[derive(Debug)]
#[must_use]
pub struct SchemaBuilder {
    record_type: RecordType,
    kind: String,
    fields: Vec<FieldDescriptor>,
    discriminator: Option<Discriminator>,
    problems: Vec<String>,
}

impl SchemaBuilder {
    fn new(record_type: RecordType, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            record_type,
            kind: record_type.name().to_string(),
            fields,
            discriminator: None,
            problems: Vec::new(),
        }
    }

    fn with_field(mut self, field: &str, apply: impl FnOnce(&mut FieldDescriptor) -> Result<(), String>) -> Self {
        let outcome = match self.fields.iter_mut().find(|f| f.name == field) {
            Some(descriptor) => apply(descriptor),
            None => Err(format!("no field named '{field}'")),
        };
        if let Err(problem) = outcome {
            self.problems.push(problem);
        }
        self
    }

    fn with_role(self, field: &str, role: FieldRole) -> Self {
        self.with_field(field, |descriptor| {
            if descriptor.is_plain() {
                descriptor.role = role;
                Ok(())
            } else {
                Err(format!(
                    "field '{}' already has role {:?}",
                    descriptor.name, descriptor.role
                ))
            }
        })
    }

    /// Sets the store kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Marks `field` as the key field.
    pub fn key(self, field: &str, key_kind: KeyKind) -> Self {
        self.with_role(field, FieldRole::Key(key_kind))
    }

    /// Marks `field` as the ancestor of `kind` at position `order` (1-based).
    pub fn ancestor(self, field: &str, kind: impl Into<String>, key_kind: KeyKind, order: u32) -> Self {
        self.with_role(
            field,
            FieldRole::Ancestor {
                kind: kind.into(),
                key_kind,
                order,
            },
        )
    }

    /// Stores `field` under `property` instead of its own name.
    pub fn rename(self, field: &str, property: impl Into<String>) -> Self {
        let property = property.into();
        self.with_field(field, |descriptor| {
            descriptor.property = property;
            Ok(())
        })
    }

    /// Never stores or reads `field`.
    pub fn skip(self, field: &str) -> Self {
        self.with_role(field, FieldRole::Skip)
    }

    /// Excludes the stored value of `field` from indexes.
    pub fn exclude_from_index(self, field: &str) -> Self {
        self.with_field(field, |descriptor| {
            descriptor.exclude_from_index = true;
            Ok(())
        })
    }

    /// Hoists the properties of the record in `field` into this document.
    pub fn flatten(self, field: &str) -> Self {
        self.with_field(field, |descriptor| {
            descriptor.flatten = true;
            Ok(())
        })
    }

    /// Handles `field` with `codec` instead of resolving one from the registry.
    pub fn codec(self, field: &str, codec: impl CustomCodec + 'static) -> Self {
        let codec: Arc<dyn CustomCodec> = Arc::new(codec);
        self.with_field(field, |descriptor| {
            descriptor.codec = Some(codec);
            Ok(())
        })
    }

    /// Resolves the concrete type of `field` through `discriminator`.
    pub fn subtypes(self, field: &str, discriminator: Discriminator) -> Self {
        self.with_field(field, |descriptor| {
            descriptor.subtypes = Some(discriminator);
            Ok(())
        })
    }

    /// Fills `field` from the child repository of its element type, queried
    /// under the ancestors `ancestors` derives from the parent.
    pub fn external(self, field: &str, ancestors: impl ChildAncestors + 'static) -> Self {
        self.with_role(field, FieldRole::External(Arc::new(ancestors)))
    }

    /// Declares the type-level discriminator of an abstract type.
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Schema`] listing every problem found.
    pub fn build(mut self) -> MapperResult<Schema> {
        self.validate_kind();
        self.validate_keys();
        self.validate_ancestors();
        self.validate_properties();
        self.validate_field_options();
        self.validate_discriminator();

        if !self.problems.is_empty() {
            return Err(MapperError::schema(
                self.record_type.name(),
                self.problems.join("; "),
            ));
        }

        Ok(Schema {
            record_type: self.record_type,
            kind: self.kind,
            fields: self.fields,
            discriminator: self.discriminator,
        })
    }

    fn validate_kind(&mut self) {
        if self.kind.is_empty() {
            self.problems.push("kind must not be empty".to_string());
        }
    }

    fn validate_keys(&mut self) {
        let keys: Vec<_> = self.fields.iter().filter(|f| f.is_key()).collect();
        if keys.len() > 1 {
            let names: Vec<_> = keys.iter().map(|f| f.name).collect();
            self.problems
                .push(format!("more than one key field: {}", names.join(", ")));
        }
        let mismatched: Vec<String> = keys
            .iter()
            .filter_map(|f| match f.role {
                FieldRole::Key(key_kind) if !key_type_matches(key_kind, &f.type_ref) => Some(format!(
                    "key field '{}' is {} but declared {key_kind}",
                    f.name, f.type_ref
                )),
                _ => None,
            })
            .collect();
        self.problems.extend(mismatched);
    }

    fn validate_ancestors(&mut self) {
        let mut orders = Vec::new();
        for field in &self.fields {
            if let FieldRole::Ancestor {
                key_kind, order, ..
            } = &field.role
            {
                if !key_type_matches(*key_kind, &field.type_ref) {
                    self.problems.push(format!(
                        "ancestor field '{}' is {} but declared {key_kind}",
                        field.name, field.type_ref
                    ));
                }
                orders.push(*order);
            }
        }
        orders.sort_unstable();
        let contiguous = orders
            .iter()
            .enumerate()
            .all(|(i, order)| usize::try_from(*order).is_ok_and(|o| o == i + 1));
        if !contiguous {
            self.problems.push(format!(
                "ancestor orders must be unique and contiguous from 1, found {orders:?}"
            ));
        }
    }

    fn validate_properties(&mut self) {
        let mut seen = HashSet::new();
        for field in self.fields.iter().filter(|f| f.is_plain() && !f.flatten) {
            if !seen.insert(field.property.as_str()) {
                self.problems.push(format!(
                    "property '{}' is mapped by more than one field",
                    field.property
                ));
            }
        }
    }

    fn validate_field_options(&mut self) {
        for field in &self.fields {
            if field.flatten && !matches!(field.type_ref, TypeRef::Record(_)) {
                self.problems.push(format!(
                    "flattened field '{}' must be a record, found {}",
                    field.name, field.type_ref
                ));
            }
            if matches!(field.role, FieldRole::External(_))
                && !matches!(&field.type_ref, TypeRef::List(element) if matches!(**element, TypeRef::Record(_)))
            {
                self.problems.push(format!(
                    "external field '{}' must be a list of records, found {}",
                    field.name, field.type_ref
                ));
            }
            if let Some(discriminator) = &field.subtypes {
                if !field.type_ref.is_record() {
                    self.problems.push(format!(
                        "polymorphic field '{}' must be a record, found {}",
                        field.name, field.type_ref
                    ));
                }
                if discriminator.inclusion() == Inclusion::External
                    && !self.fields.iter().any(|f| f.name == discriminator.property())
                {
                    self.problems.push(format!(
                        "discriminator field '{}' of '{}' does not exist",
                        discriminator.property(),
                        field.name
                    ));
                }
            }
        }
    }

    fn validate_discriminator(&mut self) {
        match &self.discriminator {
            Some(discriminator) if discriminator.inclusion() != Inclusion::Internal => {
                self.problems
                    .push("type-level discriminators must be internal".to_string());
            }
            None if self.record_type.is_abstract() => {
                self.problems
                    .push("abstract types need a discriminator".to_string());
            }
            _ => {}
        }
    }
}

fn key_type_matches(key_kind: KeyKind, type_ref: &TypeRef) -> bool {
    matches!(
        (key_kind, type_ref),
        (KeyKind::String, TypeRef::String) | (KeyKind::Long, TypeRef::Long)
    )
}
