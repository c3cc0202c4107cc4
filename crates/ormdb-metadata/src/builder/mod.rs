//! Builders for the metadata graph.
//!
//! [`ModelBuilder`] owns the model and the convention set. The element
//! builders are short-lived handles that borrow it mutably and forward every
//! write through the same source checks and dispatch.

mod entity;
mod key;
mod model_builder;
mod property;
mod relationship;

pub use entity::EntityTypeBuilder;
pub use key::{IndexBuilder, KeyBuilder};
pub use model_builder::ModelBuilder;
pub use property::PropertyBuilder;
pub use relationship::RelationshipBuilder;
