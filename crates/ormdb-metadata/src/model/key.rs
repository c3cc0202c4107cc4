//! Key and index metadata.

use super::annotation::Annotations;
use super::arena::{EntityTypeId, PropertyId};
use crate::source::{ConfigurationSource, Tracked};

/// A key (primary or alternate) over one or more properties.
#[derive(Debug, Clone)]
pub struct Key {
    pub(crate) declaring: EntityTypeId,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) source: ConfigurationSource,
    pub(crate) annotations: Annotations,
}

impl Key {
    pub(crate) fn new(
        declaring: EntityTypeId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            declaring,
            properties,
            source,
            annotations: Annotations::new(),
        }
    }

    /// Entity type declaring the key.
    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring
    }

    /// Key properties in order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Source the key was added with.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Annotations on this key.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

/// An index over one or more properties.
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) declaring: EntityTypeId,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) is_unique: Tracked<bool>,
    pub(crate) source: ConfigurationSource,
    pub(crate) annotations: Annotations,
}

impl Index {
    pub(crate) fn new(
        declaring: EntityTypeId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            declaring,
            properties,
            is_unique: Tracked::unset(false),
            source,
            annotations: Annotations::new(),
        }
    }

    /// Entity type declaring the index.
    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring
    }

    /// Indexed properties in order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Whether the index enforces uniqueness.
    pub fn is_unique(&self) -> bool {
        self.is_unique.value
    }

    /// Source of the uniqueness configuration.
    pub fn is_unique_source(&self) -> Option<ConfigurationSource> {
        self.is_unique.source
    }

    /// Source the index was added with.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Annotations on this index.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}
