//! Ordered convention registry.

use super::capability::{Capability, Convention};
use super::shared_table::SharedTableConvention;
use std::sync::Arc;

/// Conventions in registration order.
///
/// For every capability, conventions run in the order they were registered.
/// Conventions that normalize state others depend on (ownership before
/// table naming) must be registered first.
#[derive(Clone, Default)]
pub struct ConventionSet {
    conventions: Vec<Arc<dyn Convention>>,
}

impl ConventionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relational conventions shipped with this crate.
    pub fn relational() -> Self {
        Self::new().with(SharedTableConvention::new())
    }

    /// Append a convention.
    pub fn with(mut self, convention: impl Convention + 'static) -> Self {
        self.register(Arc::new(convention));
        self
    }

    /// Append a shared convention.
    pub fn register(&mut self, convention: Arc<dyn Convention>) {
        self.conventions.push(convention);
    }

    /// Conventions implementing `capability`, in registration order.
    pub fn for_capability(&self, capability: Capability) -> Vec<Arc<dyn Convention>> {
        self.conventions
            .iter()
            .filter(|c| c.capabilities().contains(capability.as_set()))
            .cloned()
            .collect()
    }

    /// Registered convention names in order.
    pub fn names(&self) -> Vec<&str> {
        self.conventions.iter().map(|c| c.name()).collect()
    }

    /// Number of registered conventions.
    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    /// Check whether no convention is registered.
    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }
}

impl std::fmt::Debug for ConventionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConventionSet")
            .field("conventions", &self.names())
            .finish()
    }
}
