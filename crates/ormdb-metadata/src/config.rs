//! Model builder configuration.

/// Default limit on nested convention dispatch.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Configuration for a [`ModelBuilder`](crate::ModelBuilder).
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Accept a write whose source equals the recorded source of the facet.
    ///
    /// Needed when one convention pass re-applies its own earlier decisions.
    pub allow_same_source_overwrite: bool,

    /// Maximum nesting of convention callbacks before dispatch fails.
    pub max_dispatch_depth: usize,

    /// Provider annotation prefix (e.g. "SqlServer"). Provider annotations take
    /// precedence over the generic relational ones when reading.
    pub provider_prefix: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            allow_same_source_overwrite: true,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            provider_prefix: None,
        }
    }
}

impl BuilderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether same-source writes are accepted.
    pub fn with_same_source_overwrite(mut self, allow: bool) -> Self {
        self.allow_same_source_overwrite = allow;
        self
    }

    /// Set the maximum dispatch depth.
    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth.max(1);
        self
    }

    /// Set the provider annotation prefix.
    pub fn with_provider(mut self, prefix: impl Into<String>) -> Self {
        self.provider_prefix = Some(prefix.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BuilderConfig::new()
            .with_same_source_overwrite(false)
            .with_max_dispatch_depth(0)
            .with_provider("SqlServer");

        assert!(!config.allow_same_source_overwrite);
        assert_eq!(config.max_dispatch_depth, 1);
        assert_eq!(config.provider_prefix.as_deref(), Some("SqlServer"));
    }
}
