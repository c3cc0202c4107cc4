//! Metadata builder error types.
//!
//! A write rejected because a stronger source already configured the facet is
//! not an error; builders report it through their return value. Everything in
//! [`MetadataError`] aborts the operation that raised it.

use crate::model::{PropertyType, Value};
use thiserror::Error;

/// Broad classification of a [`MetadataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value does not fit the facet's domain.
    DomainValidation,
    /// A structural contract of the metadata graph would be broken.
    InvariantViolation,
    /// An entity type is not part of the required inheritance hierarchy.
    BaseTypeConflict,
    /// The builder is in a state that forbids the operation.
    State,
    /// A referenced element does not exist.
    NotFound,
}

/// Metadata builder errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A name facet was given an empty string.
    #[error("{facet} of {element} cannot be empty")]
    EmptyName {
        /// Element being configured.
        element: String,
        /// Facet name.
        facet: &'static str,
    },

    /// A sequence facet was given an unusable value.
    #[error("invalid sequence {sequence}: {reason}")]
    InvalidSequence {
        /// Sequence name.
        sequence: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// Discriminator value is not assignable to the discriminator property.
    #[error("discriminator value {value:?} for {entity} is not assignable to {property} ({expected})")]
    InvalidDiscriminatorValue {
        /// Entity type receiving the value.
        entity: String,
        /// Discriminator property name.
        property: String,
        /// Rejected value.
        value: Value,
        /// Declared property type.
        expected: PropertyType,
    },

    /// A different entity type in the hierarchy already uses the value.
    #[error("discriminator value {value:?} for {entity} is already used by {existing}")]
    DuplicateDiscriminatorValue {
        /// Entity type receiving the value.
        entity: String,
        /// Duplicate value.
        value: Value,
        /// Entity type already holding the value.
        existing: String,
    },

    /// The hierarchy root has no discriminator property configured.
    #[error("no discriminator property is configured on {root}")]
    NoDiscriminatorProperty {
        /// Hierarchy root.
        root: String,
    },

    /// An entity type declares more than one ownership relationship.
    #[error("{entity} is owned through {count} foreign keys, expected at most one")]
    MultipleOwnerships {
        /// Dependent entity type.
        entity: String,
        /// Number of ownership foreign keys found.
        count: usize,
    },

    /// Setting the base type would create an inheritance cycle.
    #[error("cannot set base type of {entity} to {base}: inheritance cycle")]
    CyclicBaseType {
        /// Derived entity type.
        entity: String,
        /// Proposed base type.
        base: String,
    },

    /// The element is still referenced and cannot be removed.
    #[error("cannot remove {element}: still used by {used_by}")]
    ElementInUse {
        /// Element being removed.
        element: String,
        /// Referencing element.
        used_by: String,
    },

    /// The entity type does not derive from the discriminator root.
    #[error("cannot set discriminator value for {entity}: it does not derive from {root}")]
    EntityTypeNotDerived {
        /// Entity type receiving the value.
        entity: String,
        /// Root declaring the discriminator property.
        root: String,
    },

    /// The model is finalized.
    #[error("model is read-only")]
    ReadOnly,

    /// Convention dispatch nested deeper than configured.
    #[error("convention dispatch exceeded depth {depth} in {convention}")]
    DispatchDepthExceeded {
        /// Configured maximum depth.
        depth: usize,
        /// Convention about to be invoked.
        convention: String,
    },

    /// Entity type not found.
    #[error("entity type not found: {entity}")]
    EntityTypeNotFound {
        /// Requested entity type.
        entity: String,
    },

    /// Property not found.
    #[error("property not found: {entity}.{property}")]
    PropertyNotFound {
        /// Entity type searched.
        entity: String,
        /// Requested property.
        property: String,
    },

    /// A metadata element id no longer resolves.
    #[error("metadata element not found: {element}")]
    ElementNotFound {
        /// Element description.
        element: String,
    },

    /// Snapshot serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetadataError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetadataError::EmptyName { .. }
            | MetadataError::InvalidSequence { .. }
            | MetadataError::InvalidDiscriminatorValue { .. }
            | MetadataError::Serialization(_) => ErrorKind::DomainValidation,
            MetadataError::DuplicateDiscriminatorValue { .. }
            | MetadataError::NoDiscriminatorProperty { .. }
            | MetadataError::MultipleOwnerships { .. }
            | MetadataError::CyclicBaseType { .. }
            | MetadataError::ElementInUse { .. } => ErrorKind::InvariantViolation,
            MetadataError::EntityTypeNotDerived { .. } => ErrorKind::BaseTypeConflict,
            MetadataError::ReadOnly | MetadataError::DispatchDepthExceeded { .. } => {
                ErrorKind::State
            }
            MetadataError::EntityTypeNotFound { .. }
            | MetadataError::PropertyNotFound { .. }
            | MetadataError::ElementNotFound { .. } => ErrorKind::NotFound,
        }
    }
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = MetadataError::EntityTypeNotDerived {
            entity: "Fish".to_string(),
            root: "Animal".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::BaseTypeConflict);
        assert!(err.to_string().contains("Fish"));
        assert!(err.to_string().contains("Animal"));

        assert_eq!(MetadataError::ReadOnly.kind(), ErrorKind::State);
    }

    #[test]
    fn test_duplicate_value_display() {
        let err = MetadataError::DuplicateDiscriminatorValue {
            entity: "Fish".to_string(),
            value: Value::String("Dog".to_string()),
            existing: "Dog".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(err.to_string().contains("already used by Dog"));
    }
}
