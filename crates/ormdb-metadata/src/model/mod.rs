//! Metadata graph for ORMDB models.
//!
//! The graph stores entity types, properties, keys, indexes and foreign keys
//! together with the configuration source of every facet.

mod annotation;
mod arena;
mod entity;
mod foreign_key;
mod graph;
mod key;
mod property;
mod snapshot;
mod types;

pub use annotation::{Annotation, Annotations};
pub use arena::{Arena, EntityTypeId, ForeignKeyId, IndexId, KeyId, PropertyId};
pub use entity::EntityType;
pub use foreign_key::ForeignKey;
pub use graph::{ElementRef, Model};
pub use key::{Index, Key};
pub use property::Property;
pub use snapshot::{EntitySnapshot, ForeignKeySnapshot, ModelSnapshot, PropertySnapshot};
pub use types::{PropertyType, ScalarType, Value};
