//! Name-keyed snapshot of a model for external consumers.

use super::annotation::Annotations;
use super::arena::PropertyId;
use super::graph::Model;
use super::types::PropertyType;
use crate::error::Result;
use serde::Serialize;

/// A snapshot of the whole model with ids resolved to names.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSnapshot {
    /// Entity types in insertion order.
    pub entities: Vec<EntitySnapshot>,
    /// Model-level annotations.
    pub annotations: Annotations,
}

/// Snapshot of one entity type.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    /// Entity type name.
    pub name: String,
    /// Base type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    /// Declared properties.
    pub properties: Vec<PropertySnapshot>,
    /// Declared keys as property name lists.
    pub keys: Vec<Vec<String>>,
    /// Declared indexes as property name lists.
    pub indexes: Vec<Vec<String>>,
    /// Declared foreign keys.
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    /// Entity type annotations.
    pub annotations: Annotations,
}

/// Snapshot of one property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySnapshot {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub property_type: PropertyType,
    /// Whether the property is a shadow property.
    pub shadow: bool,
    /// Property annotations.
    pub annotations: Annotations,
}

/// Snapshot of one foreign key.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeySnapshot {
    /// Dependent property names.
    pub properties: Vec<String>,
    /// Principal entity type name.
    pub principal: String,
    /// Uniqueness flag.
    pub is_unique: bool,
    /// Ownership flag.
    pub is_ownership: bool,
    /// Foreign key annotations.
    pub annotations: Annotations,
}

impl ModelSnapshot {
    /// Capture the current state of `model`.
    pub fn capture(model: &Model) -> Self {
        let names = |ids: &[PropertyId]| model.property_names(ids);

        let entities = model
            .entity_types()
            .map(|(_, entity)| EntitySnapshot {
                name: entity.name().to_string(),
                base_type: entity.base_type().map(|base| model.entity_name(base)),
                properties: entity
                    .declared_properties()
                    .iter()
                    .filter_map(|id| model.property(*id))
                    .map(|p| PropertySnapshot {
                        name: p.name().to_string(),
                        property_type: p.property_type(),
                        shadow: p.is_shadow(),
                        annotations: p.annotations().clone(),
                    })
                    .collect(),
                keys: entity
                    .keys()
                    .iter()
                    .filter_map(|id| model.key(*id))
                    .map(|k| names(k.properties()))
                    .collect(),
                indexes: entity
                    .indexes()
                    .iter()
                    .filter_map(|id| model.index(*id))
                    .map(|i| names(i.properties()))
                    .collect(),
                foreign_keys: entity
                    .foreign_keys()
                    .iter()
                    .filter_map(|id| model.foreign_key(*id))
                    .map(|fk| ForeignKeySnapshot {
                        properties: names(fk.properties()),
                        principal: model.entity_name(fk.principal_entity_type()),
                        is_unique: fk.is_unique(),
                        is_ownership: fk.is_ownership(),
                        annotations: fk.annotations().clone(),
                    })
                    .collect(),
                annotations: entity.annotations().clone(),
            })
            .collect();

        Self {
            entities,
            annotations: model.annotations().clone(),
        }
    }

    /// Get an entity snapshot by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Render the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
