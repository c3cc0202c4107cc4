//! ORMDB Metadata - Convention-driven model builder.
//!
//! This crate builds the mapping metadata of an ORMDB model. Every
//! configurable facet remembers the [`ConfigurationSource`] that set it, and
//! registered [`Convention`]s react to each accepted change before the
//! mutating call returns.

pub mod builder;
pub mod config;
pub mod convention;
pub mod error;
pub mod model;
pub mod relational;
pub mod source;

pub use builder::{
    EntityTypeBuilder, IndexBuilder, KeyBuilder, ModelBuilder, PropertyBuilder,
    RelationshipBuilder,
};
pub use config::{BuilderConfig, DEFAULT_MAX_DISPATCH_DEPTH};
pub use error::{ErrorKind, MetadataError, Result};
pub use source::{ConfigurationSource, SetOutcome, Tracked};

// Model exports
pub use model::{
    Annotation, Annotations, ElementRef, EntityType, EntityTypeId, ForeignKey, ForeignKeyId,
    Index, IndexId, Key, KeyId, Model, ModelSnapshot, Property, PropertyId, PropertyType,
    ScalarType, Value,
};

// Convention exports
pub use convention::{
    AnnotationChange, Capability, CapabilitySet, Convention, ConventionSet,
    SharedTableConvention, TableAssignment,
};

// Relational exports
pub use relational::{DiscriminatorBuilder, RelationalFacet, Sequence};
