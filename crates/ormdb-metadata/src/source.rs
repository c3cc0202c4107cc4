//! Configuration source lattice.
//!
//! Every configurable facet of the metadata graph remembers which kind of
//! caller last configured it. A write is only accepted when it comes from a
//! source at least as strong as the recorded one.

use serde::{Deserialize, Serialize};

/// Who configured a facet.
///
/// Ordered from weakest to strongest: `Convention < DataAnnotation < Explicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigurationSource {
    /// Set by a convention pass.
    Convention,
    /// Set from an annotation found on the mapped type.
    DataAnnotation,
    /// Set explicitly by the user.
    Explicit,
}

impl ConfigurationSource {
    /// Check whether a write at `self` may replace a facet recorded at `current`.
    ///
    /// An unconfigured facet is always overridden. Equal sources override only
    /// when `allow_same_source` is set.
    pub fn overrides(self, current: Option<ConfigurationSource>, allow_same_source: bool) -> bool {
        match current {
            None => true,
            Some(current) if self == current => allow_same_source,
            Some(current) => self > current,
        }
    }

    /// Check whether a write at `self` is accepted for a facet recorded at `current`.
    ///
    /// Same as [`overrides`](Self::overrides), except that re-writing the
    /// current value at the recorded source is always accepted as a no-op.
    pub fn accepts(
        self,
        current: Option<ConfigurationSource>,
        same_value: bool,
        allow_same_source: bool,
    ) -> bool {
        match current {
            Some(current) if self == current => allow_same_source || same_value,
            current => self.overrides(current, allow_same_source),
        }
    }

    /// The stronger of two sources.
    pub fn max(self, other: ConfigurationSource) -> ConfigurationSource {
        std::cmp::max(self, other)
    }

    /// The stronger of a source and an optional recorded source.
    pub fn max_with(self, other: Option<ConfigurationSource>) -> ConfigurationSource {
        match other {
            Some(other) => self.max(other),
            None => self,
        }
    }
}

impl std::fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationSource::Convention => write!(f, "convention"),
            ConfigurationSource::DataAnnotation => write!(f, "data annotation"),
            ConfigurationSource::Explicit => write!(f, "explicit"),
        }
    }
}

/// A facet value together with the source that configured it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    /// Current value.
    pub value: T,
    /// Source of the last accepted write, `None` while still at its default.
    pub source: Option<ConfigurationSource>,
}

impl<T> Tracked<T> {
    /// A facet still holding its default value.
    pub fn unset(value: T) -> Self {
        Self {
            value,
            source: None,
        }
    }

    /// A facet configured at `source`.
    pub fn new(value: T, source: ConfigurationSource) -> Self {
        Self {
            value,
            source: Some(source),
        }
    }
}

/// Result of a try-set operation on a facet.
///
/// A rejected write is not an error: the facet was configured by a stronger
/// source and keeps its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome<T> {
    /// Whether the write was accepted.
    pub accepted: bool,
    /// Value of the facet after the call.
    pub current: T,
    /// Value of the facet before the call.
    pub previous: T,
    /// Whether a convention removed the element while reacting to the write.
    pub removed: bool,
}

impl<T: PartialEq> SetOutcome<T> {
    /// Outcome of a rejected write.
    pub fn rejected(current: T) -> Self
    where
        T: Clone,
    {
        Self {
            accepted: false,
            previous: current.clone(),
            current,
            removed: false,
        }
    }

    /// Whether the value actually changed.
    pub fn changed(&self) -> bool {
        self.accepted && self.current != self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConfigurationSource::*;

    #[test]
    fn test_source_ordering() {
        assert!(Convention < DataAnnotation);
        assert!(DataAnnotation < Explicit);
        assert_eq!(Convention.max(Explicit), Explicit);
        assert_eq!(DataAnnotation.max_with(None), DataAnnotation);
    }

    #[test]
    fn test_overrides() {
        assert!(Convention.overrides(None, false));
        assert!(Explicit.overrides(Some(DataAnnotation), false));
        assert!(!Convention.overrides(Some(DataAnnotation), true));
        assert!(Convention.overrides(Some(Convention), true));
        assert!(!Convention.overrides(Some(Convention), false));
    }

    #[test]
    fn test_accepts_same_value() {
        assert!(Convention.accepts(Some(Convention), true, false));
        assert!(!Convention.accepts(Some(Convention), false, false));
        assert!(!Convention.accepts(Some(Explicit), true, true));
        assert!(Explicit.accepts(Some(DataAnnotation), false, false));
    }

    #[test]
    fn test_outcome_changed() {
        let outcome = SetOutcome {
            accepted: true,
            current: 2,
            previous: 1,
            removed: false,
        };
        assert!(outcome.changed());
        assert!(!SetOutcome::rejected(3).changed());
    }
}
