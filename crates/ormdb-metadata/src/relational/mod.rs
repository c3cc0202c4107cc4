//! Relational mapping facets stored as annotations.
//!
//! Facets are written through the builder facades with ordinary source
//! checks and dispatch, and read back through views on [`Model`](crate::Model)
//! that apply the relational defaults.

mod annotations;
mod builder;
mod discriminator;
mod names;
mod sequence;

pub use annotations::{
    RelationalEntityAnnotations, RelationalModelAnnotations, RelationalNameAnnotations,
    RelationalPropertyAnnotations,
};
pub use builder::{
    RelationalEntityTypeBuilder, RelationalModelBuilder, RelationalNameBuilder,
    RelationalPropertyBuilder,
};
pub use discriminator::DiscriminatorBuilder;
pub use names::{RelationalFacet, DEFAULT_DISCRIMINATOR_NAME, RELATIONAL_PREFIX};
pub use sequence::{
    RelationalSequenceBuilder, Sequence, DEFAULT_SEQUENCE_INCREMENT, DEFAULT_SEQUENCE_START,
};
