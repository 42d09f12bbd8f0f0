//! Error types for the mapping engine.

use entimap_storage::StorageError;
use entimap_value::{KeyKind, ValueError};
use thiserror::Error;

/// Result type for mapping operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur while mapping records to and from documents.
///
/// Every failure is local to one serialize, deserialize or merge call and is
/// never retried internally.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Document store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document value had an unexpected shape.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A schema descriptor is invalid. This is a configuration error.
    #[error("invalid schema for {type_name}: {message}")]
    Schema {
        /// Type the schema describes.
        type_name: String,
        /// What is wrong with it.
        message: String,
    },

    /// No codec or constructor can produce the requested type.
    #[error("cannot resolve {type_name}: {message}")]
    Resolution {
        /// Type that could not be produced.
        type_name: String,
        /// Why resolution failed.
        message: String,
    },

    /// A failure while mapping one field of a record.
    #[error("failed mapping field '{field}' of {type_name}: {source}")]
    Field {
        /// Record type owning the field.
        type_name: String,
        /// Name of the field.
        field: String,
        /// The underlying failure.
        #[source]
        source: Box<MapperError>,
    },

    /// A dynamic value did not have the expected type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// A discriminator value matched no subtype and no default is configured.
    #[error("no subtype of {type_name} matches discriminator '{value}'")]
    UnknownSubtype {
        /// Polymorphic type being resolved.
        type_name: String,
        /// The unmatched discriminator value.
        value: String,
    },

    /// The discriminator needed to pick a subtype is absent.
    #[error("missing discriminator '{property}' for {type_name}")]
    MissingDiscriminator {
        /// Polymorphic type being resolved.
        type_name: String,
        /// Property or field the discriminator is read from.
        property: String,
    },

    /// A record was asked for a field it does not declare.
    #[error("{type_name} has no field '{field}'")]
    UnknownField {
        /// Record type.
        type_name: String,
        /// Requested field.
        field: String,
    },

    /// A document property has no matching field.
    #[error("property '{property}' has no matching field in {type_name}")]
    UnmappedProperty {
        /// Record type being deserialized.
        type_name: String,
        /// The unmatched property.
        property: String,
    },

    /// An ancestor field has no usable value.
    #[error("ancestor field '{field}' of {type_name} has no value")]
    MissingAncestor {
        /// Record type.
        type_name: String,
        /// The ancestor field.
        field: String,
    },

    /// A key element does not match the representation its field expects.
    #[error("key element '{kind}' is a {actual} key but field '{field}' expects {expected}")]
    KeyMismatch {
        /// Field receiving the key.
        field: String,
        /// Kind of the key element.
        kind: String,
        /// Representation the field expects.
        expected: KeyKind,
        /// Representation found in the key.
        actual: KeyKind,
    },

    /// Compare or merge was called on values of different runtime types.
    #[error("cannot compare {left} with {right}")]
    Heterogeneous {
        /// Type of the left operand.
        left: String,
        /// Type of the right operand.
        right: String,
    },

    /// An external repository failed. Its error is carried untouched.
    #[error("external resolution failed: {0}")]
    External(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MapperError {
    /// Creates a schema error.
    pub fn schema(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates a resolution error.
    pub fn resolution(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Wraps an error with the record type and field it occurred in.
    pub fn field(type_name: impl Into<String>, field: impl Into<String>, source: MapperError) -> Self {
        Self::Field {
            type_name: type_name.into(),
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an unknown subtype error.
    pub fn unknown_subtype(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownSubtype {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Creates a missing discriminator error.
    pub fn missing_discriminator(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingDiscriminator {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates an unmapped property error.
    pub fn unmapped_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnmappedProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a missing ancestor error.
    pub fn missing_ancestor(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingAncestor {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a heterogeneous operands error.
    pub fn heterogeneous(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::Heterogeneous {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Wraps a collaborator error.
    pub fn external(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::External(Box::new(error))
    }

    /// Returns the innermost error, looking through [`MapperError::Field`] wrappers.
    pub fn root_cause(&self) -> &MapperError {
        let mut current = self;
        while let MapperError::Field { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the field path leading to the root cause, outermost first.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let MapperError::Field { field, source, .. } = current {
            path.push(field.as_str());
            current = source;
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_field_wrappers() {
        let inner = MapperError::unknown_subtype("Shape", "hexagon");
        let err = MapperError::field(
            "Drawing",
            "layers",
            MapperError::field("Layer", "shape", inner),
        );

        assert!(matches!(
            err.root_cause(),
            MapperError::UnknownSubtype { value, .. } if value == "hexagon"
        ));
        assert_eq!(err.field_path(), vec!["layers", "shape"]);
    }

    #[test]
    fn field_error_names_type_and_field() {
        let err = MapperError::field("Person", "age", MapperError::type_mismatch("i32", "String"));
        assert_eq!(
            err.to_string(),
            "failed mapping field 'age' of Person: type mismatch: expected i32, found String"
        );
    }

    #[test]
    fn storage_errors_convert() {
        let err: MapperError = StorageError::MissingKey.into();
        assert!(matches!(err, MapperError::Storage(StorageError::MissingKey)));
    }
}
