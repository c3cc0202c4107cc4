//! Read views over the relational annotations.
//!
//! Provider annotations win over the generic `Relational:` ones. Views fall
//! back to computed defaults where a facet is not configured.

use super::names::RelationalFacet;
use crate::model::{Annotations, ElementRef, EntityTypeId, Model, PropertyId, Value};
use crate::source::ConfigurationSource;

fn lookup<'m>(
    annotations: Option<&'m Annotations>,
    facet: RelationalFacet,
    provider: Option<&str>,
) -> Option<&'m crate::model::Annotation> {
    let annotations = annotations?;
    provider
        .and_then(|prefix| annotations.get(&facet.annotation_name(Some(prefix))))
        .or_else(|| annotations.get(&facet.annotation_name(None)))
}

fn read_string(
    annotations: Option<&Annotations>,
    facet: RelationalFacet,
    provider: Option<&str>,
) -> Option<String> {
    lookup(annotations, facet, provider)
        .and_then(|a| a.value.as_str())
        .map(str::to_string)
}

impl Model {
    /// Relational view of the model.
    pub fn relational(&self) -> RelationalModelAnnotations<'_> {
        RelationalModelAnnotations { model: self }
    }

    /// Relational view of an entity type.
    pub fn relational_entity(&self, entity: EntityTypeId) -> RelationalEntityAnnotations<'_> {
        RelationalEntityAnnotations {
            model: self,
            entity,
        }
    }

    /// Relational view of a property.
    pub fn relational_property(&self, property: PropertyId) -> RelationalPropertyAnnotations<'_> {
        RelationalPropertyAnnotations {
            model: self,
            property,
        }
    }

    /// Relational view of a key, index or foreign key.
    pub fn relational_name(&self, element: ElementRef) -> RelationalNameAnnotations<'_> {
        RelationalNameAnnotations {
            model: self,
            element,
        }
    }
}

/// Relational facets of the model.
#[derive(Debug, Clone, Copy)]
pub struct RelationalModelAnnotations<'m> {
    pub(crate) model: &'m Model,
}

impl RelationalModelAnnotations<'_> {
    /// Schema for entity types that configure none.
    pub fn default_schema(&self) -> Option<String> {
        read_string(
            Some(self.model.annotations()),
            RelationalFacet::DefaultSchema,
            self.model.provider_prefix(),
        )
    }
}

/// Relational facets of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct RelationalEntityAnnotations<'m> {
    model: &'m Model,
    entity: EntityTypeId,
}

impl<'m> RelationalEntityAnnotations<'m> {
    fn annotations(&self) -> Option<&'m Annotations> {
        self.model.annotations_of(ElementRef::EntityType(self.entity))
    }

    fn read(&self, facet: RelationalFacet) -> Option<String> {
        read_string(self.annotations(), facet, self.model.provider_prefix())
    }

    fn base_view(&self) -> Option<RelationalEntityAnnotations<'m>> {
        self.model
            .entity_type(self.entity)?
            .base_type()
            .map(|base| self.model.relational_entity(self.model.root_type(base)))
    }

    /// Table name configured on this entity type, if any.
    pub fn configured_table_name(&self) -> Option<String> {
        self.read(RelationalFacet::TableName)
    }

    /// Source of the configured table name.
    pub fn table_name_source(&self) -> Option<ConfigurationSource> {
        lookup(
            self.annotations(),
            RelationalFacet::TableName,
            self.model.provider_prefix(),
        )
        .map(|a| a.source)
    }

    /// Effective table name.
    ///
    /// Derived types without their own table map to the root's table; any
    /// other entity type defaults to its own name.
    pub fn table_name(&self) -> String {
        if let Some(table) = self.configured_table_name() {
            return table;
        }
        match self.base_view() {
            Some(root) => root.table_name(),
            None => self.model.entity_name(self.entity),
        }
    }

    /// Schema configured on this entity type, if any.
    pub fn configured_schema(&self) -> Option<String> {
        self.read(RelationalFacet::Schema)
    }

    /// Effective schema: configured, inherited from the root, or the model default.
    pub fn schema(&self) -> Option<String> {
        if let Some(schema) = self.configured_schema() {
            return Some(schema);
        }
        match self.base_view() {
            Some(root) => root.schema(),
            None => self.model.relational().default_schema(),
        }
    }

    /// Name of the discriminator property of this entity type's hierarchy.
    pub fn discriminator_property_name(&self) -> Option<String> {
        let root = self.model.root_type(self.entity);
        read_string(
            self.model.annotations_of(ElementRef::EntityType(root)),
            RelationalFacet::DiscriminatorProperty,
            self.model.provider_prefix(),
        )
    }

    /// The discriminator property of this entity type's hierarchy.
    ///
    /// `None` when unconfigured or when the configured property was removed.
    pub fn discriminator_property(&self) -> Option<PropertyId> {
        let name = self.discriminator_property_name()?;
        self.model
            .find_property(self.model.root_type(self.entity), &name)
    }

    /// Discriminator value of this entity type.
    pub fn discriminator_value(&self) -> Option<Value> {
        lookup(
            self.annotations(),
            RelationalFacet::DiscriminatorValue,
            self.model.provider_prefix(),
        )
        .map(|a| a.value.clone())
    }
}

/// Relational facets of a property.
#[derive(Debug, Clone, Copy)]
pub struct RelationalPropertyAnnotations<'m> {
    model: &'m Model,
    property: PropertyId,
}

impl RelationalPropertyAnnotations<'_> {
    fn lookup(&self, facet: RelationalFacet) -> Option<&crate::model::Annotation> {
        lookup(
            self.model.annotations_of(ElementRef::Property(self.property)),
            facet,
            self.model.provider_prefix(),
        )
    }

    /// Effective column name, defaulting to the property name.
    pub fn column_name(&self) -> String {
        self.lookup(RelationalFacet::ColumnName)
            .and_then(|a| a.value.as_str())
            .map(str::to_string)
            .or_else(|| self.model.property(self.property).map(|p| p.name().to_string()))
            .unwrap_or_default()
    }

    /// Store type of the column, if configured.
    pub fn column_type(&self) -> Option<String> {
        self.lookup(RelationalFacet::ColumnType)
            .and_then(|a| a.value.as_str())
            .map(str::to_string)
    }

    /// Column default value, if configured.
    pub fn default_value(&self) -> Option<Value> {
        self.lookup(RelationalFacet::DefaultValue)
            .map(|a| a.value.clone())
    }

    /// Column default SQL, if configured.
    pub fn generated_value_sql(&self) -> Option<String> {
        self.lookup(RelationalFacet::GeneratedValueSql)
            .and_then(|a| a.value.as_str())
            .map(str::to_string)
    }
}

/// Relational name of a key, index or foreign key.
#[derive(Debug, Clone, Copy)]
pub struct RelationalNameAnnotations<'m> {
    model: &'m Model,
    element: ElementRef,
}

impl RelationalNameAnnotations<'_> {
    /// Configured constraint or index name.
    pub fn name(&self) -> Option<String> {
        read_string(
            self.model.annotations_of(self.element),
            RelationalFacet::Name,
            self.model.provider_prefix(),
        )
    }
}
