//! Entity type metadata.

use super::annotation::Annotations;
use super::arena::{EntityTypeId, ForeignKeyId, IndexId, KeyId, PropertyId};
use crate::source::{ConfigurationSource, Tracked};
use indexmap::IndexMap;

/// A mapped entity type.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub(crate) name: String,
    pub(crate) source: ConfigurationSource,
    pub(crate) base_type: Tracked<Option<EntityTypeId>>,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) keys: Vec<KeyId>,
    pub(crate) indexes: Vec<IndexId>,
    pub(crate) foreign_keys: Vec<ForeignKeyId>,
    pub(crate) ignored: IndexMap<String, ConfigurationSource>,
    pub(crate) annotations: Annotations,
}

impl EntityType {
    pub(crate) fn new(name: impl Into<String>, source: ConfigurationSource) -> Self {
        Self {
            name: name.into(),
            source,
            base_type: Tracked::unset(None),
            properties: Vec::new(),
            keys: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            ignored: IndexMap::new(),
            annotations: Annotations::new(),
        }
    }

    /// Entity type name (unique within the model).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source the entity type was added with.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Direct base type, if any.
    pub fn base_type(&self) -> Option<EntityTypeId> {
        self.base_type.value
    }

    /// Source of the base type configuration.
    pub fn base_type_source(&self) -> Option<ConfigurationSource> {
        self.base_type.source
    }

    /// Properties declared on this type (not inherited ones).
    pub fn declared_properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Keys declared on this type.
    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    /// Indexes declared on this type.
    pub fn indexes(&self) -> &[IndexId] {
        &self.indexes
    }

    /// Foreign keys declared on this type.
    pub fn foreign_keys(&self) -> &[ForeignKeyId] {
        &self.foreign_keys
    }

    /// Source at which `member` was ignored, if it was.
    pub fn ignored_source(&self, member: &str) -> Option<ConfigurationSource> {
        self.ignored.get(member).copied()
    }

    /// Annotations on this type.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Check whether nothing hangs off this type anymore.
    pub(crate) fn is_bare(&self) -> bool {
        self.properties.is_empty()
            && self.keys.is_empty()
            && self.indexes.is_empty()
            && self.foreign_keys.is_empty()
    }
}
