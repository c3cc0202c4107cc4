//! Source-tracked annotation bags.

use super::types::Value;
use crate::source::ConfigurationSource;
use indexmap::IndexMap;
use serde::Serialize;

/// A named value attached to a metadata element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Annotation name, e.g. `Relational:TableName`.
    pub name: String,
    /// Annotation value.
    pub value: Value,
    /// Source of the last accepted write.
    pub source: ConfigurationSource,
}

/// Annotations of one element, in insertion order.
///
/// Clearing an annotation keeps the source that cleared it, so a weaker
/// source cannot put a value back.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Annotations {
    entries: IndexMap<String, Annotation>,
    #[serde(skip)]
    cleared: IndexMap<String, ConfigurationSource>,
}

impl Annotations {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an annotation by name.
    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.entries.get(name)
    }

    /// Get an annotation value by name.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|a| &a.value)
    }

    /// Get the recorded source of an annotation, including a cleared one.
    pub fn source(&self, name: &str) -> Option<ConfigurationSource> {
        self.entries
            .get(name)
            .map(|a| a.source)
            .or_else(|| self.cleared.get(name).copied())
    }

    /// Strongest source recorded on any annotation of the bag.
    pub fn strongest_source(&self) -> Option<ConfigurationSource> {
        self.entries
            .values()
            .map(|a| a.source)
            .chain(self.cleared.values().copied())
            .max()
    }

    /// Check whether a write of `value` at `source` would be accepted.
    ///
    /// Writing the current value again is accepted at any source not weaker
    /// than the recorded one.
    pub fn can_set(
        &self,
        name: &str,
        value: Option<&Value>,
        source: ConfigurationSource,
        allow_same_source: bool,
    ) -> bool {
        match self.entries.get(name) {
            Some(existing) => source.accepts(
                Some(existing.source),
                value == Some(&existing.value),
                allow_same_source,
            ),
            None => match self.cleared.get(name) {
                Some(cleared) => source.accepts(Some(*cleared), value.is_none(), allow_same_source),
                None => true,
            },
        }
    }

    /// Store or remove an annotation without consulting sources.
    ///
    /// Returns the previous value. Re-writing the same value, or clearing an
    /// already cleared annotation, keeps the stronger of the two sources.
    pub fn set(
        &mut self,
        name: &str,
        value: Option<Value>,
        source: ConfigurationSource,
    ) -> Option<Value> {
        match value {
            Some(value) => {
                self.cleared.shift_remove(name);
                let source = match self.entries.get(name) {
                    Some(existing) if existing.value == value => source.max(existing.source),
                    _ => source,
                };
                let previous = self.entries.insert(
                    name.to_string(),
                    Annotation {
                        name: name.to_string(),
                        value,
                        source,
                    },
                );
                previous.map(|a| a.value)
            }
            None => {
                let previous = self.entries.shift_remove(name);
                let source = match (&previous, self.cleared.get(name)) {
                    (None, Some(cleared)) => source.max(*cleared),
                    _ => source,
                };
                self.cleared.insert(name.to_string(), source);
                previous.map(|a| a.value)
            }
        }
    }

    /// Downgrade an annotation's source to `Convention`, keeping its value.
    ///
    /// A cleared annotation stays cleared at `Convention`.
    pub fn reset_source(&mut self, name: &str) -> bool {
        if let Some(annotation) = self.entries.get_mut(name) {
            annotation.source = ConfigurationSource::Convention;
            return true;
        }
        match self.cleared.get_mut(name) {
            Some(cleared) => {
                *cleared = ConfigurationSource::Convention;
                true
            }
            None => false,
        }
    }

    /// Iterate annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.values()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
