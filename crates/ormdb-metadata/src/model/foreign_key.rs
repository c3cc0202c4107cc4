//! Foreign key (relationship) metadata.

use super::annotation::Annotations;
use super::arena::{EntityTypeId, KeyId, PropertyId};
use crate::source::{ConfigurationSource, Tracked};

/// A relationship from a dependent (declaring) entity type to a principal.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub(crate) declaring: EntityTypeId,
    pub(crate) principal: EntityTypeId,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) principal_key: Option<KeyId>,
    pub(crate) is_unique: Tracked<bool>,
    pub(crate) is_ownership: Tracked<bool>,
    pub(crate) source: ConfigurationSource,
    pub(crate) annotations: Annotations,
}

impl ForeignKey {
    pub(crate) fn new(
        declaring: EntityTypeId,
        principal: EntityTypeId,
        properties: Vec<PropertyId>,
        principal_key: Option<KeyId>,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            declaring,
            principal,
            properties,
            principal_key,
            is_unique: Tracked::unset(false),
            is_ownership: Tracked::unset(false),
            source,
            annotations: Annotations::new(),
        }
    }

    /// Entity type holding the foreign key properties.
    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring
    }

    /// Referenced entity type.
    pub fn principal_entity_type(&self) -> EntityTypeId {
        self.principal
    }

    /// Foreign key properties in order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Referenced key on the principal, if one was resolved.
    pub fn principal_key(&self) -> Option<KeyId> {
        self.principal_key
    }

    /// Whether at most one dependent references each principal.
    pub fn is_unique(&self) -> bool {
        self.is_unique.value
    }

    /// Source of the uniqueness configuration.
    pub fn is_unique_source(&self) -> Option<ConfigurationSource> {
        self.is_unique.source
    }

    /// Whether the dependent only exists within its principal.
    pub fn is_ownership(&self) -> bool {
        self.is_ownership.value
    }

    /// Source of the ownership configuration.
    pub fn is_ownership_source(&self) -> Option<ConfigurationSource> {
        self.is_ownership.source
    }

    /// Whether this relationship makes the dependent share its owner's table.
    pub fn is_table_sharing(&self) -> bool {
        self.is_ownership() && self.is_unique()
    }

    /// Source the foreign key was added with.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Annotations on this foreign key.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}
