//! Property metadata.

use super::annotation::Annotations;
use super::arena::EntityTypeId;
use super::types::PropertyType;
use crate::source::{ConfigurationSource, Tracked};

/// A property declared on an entity type.
#[derive(Debug, Clone)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) declaring: EntityTypeId,
    pub(crate) property_type: Tracked<PropertyType>,
    pub(crate) shadow: bool,
    pub(crate) source: ConfigurationSource,
    pub(crate) annotations: Annotations,
}

impl Property {
    pub(crate) fn new(
        name: impl Into<String>,
        declaring: EntityTypeId,
        property_type: PropertyType,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            name: name.into(),
            declaring,
            property_type: Tracked::new(property_type, source),
            shadow,
            source,
            annotations: Annotations::new(),
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity type declaring the property.
    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring
    }

    /// Declared type.
    pub fn property_type(&self) -> PropertyType {
        self.property_type.value
    }

    /// Source of the type configuration.
    pub fn property_type_source(&self) -> Option<ConfigurationSource> {
        self.property_type.source
    }

    /// Whether the property has no backing member on the mapped type.
    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    /// Source the property was added with.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Annotations on this property.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}
