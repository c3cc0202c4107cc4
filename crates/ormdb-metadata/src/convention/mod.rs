//! Conventions and their dispatch.
//!
//! A convention reacts to graph mutations and may mutate the graph further.
//! Conventions are registered in a [`ConventionSet`] and dispatched
//! synchronously by the [`ModelBuilder`](crate::ModelBuilder).

mod capability;
mod dispatcher;
mod set;
mod shared_table;

pub use capability::{AnnotationChange, Capability, CapabilitySet, Convention};
pub use set::ConventionSet;
pub use shared_table::{SharedTableConvention, TableAssignment};
