//! Entity type configuration.

use super::key::{IndexBuilder, KeyBuilder};
use super::model_builder::ModelBuilder;
use super::property::PropertyBuilder;
use super::relationship::RelationshipBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityType, EntityTypeId, PropertyType, Value};
use crate::relational::RelationalEntityTypeBuilder;
use crate::source::{ConfigurationSource, SetOutcome, Tracked};
use tracing::debug;

impl ModelBuilder {
    /// Set or clear the base type of `entity`.
    ///
    /// Returns `Ok(Some(false))` when a stronger source configured the current
    /// base type and `Ok(None)` when a convention removed `entity`. Fails with
    /// [`MetadataError::CyclicBaseType`] if `base` derives from `entity`.
    pub fn set_base_type(
        &mut self,
        entity: EntityTypeId,
        base: Option<EntityTypeId>,
        source: ConfigurationSource,
    ) -> Result<Option<bool>> {
        self.ensure_mutable()?;
        let current = self.model.entity_type_or_err(entity)?.base_type.clone();
        let same = current.value == base;
        if !source.accepts(current.source, same, self.allow_same_source()) {
            debug!(entity = %self.model.entity_name(entity), %source, "base type write rejected");
            return Ok(Some(false));
        }

        if let Some(base) = base {
            self.model.entity_type_or_err(base)?;
            if self.model.is_same_or_derived(base, entity) {
                return Err(MetadataError::CyclicBaseType {
                    entity: self.model.entity_name(entity),
                    base: self.model.entity_name(base),
                });
            }
        }

        self.model.entity_type_mut(entity)?.base_type =
            Tracked::new(base, source.max_with(current.source));
        if !same {
            debug!(
                entity = %self.model.entity_name(entity),
                base = ?base.map(|b| self.model.entity_name(b)),
                "base type changed"
            );
            if self.dispatch_base_type_changed(entity, current.value)?.is_none() {
                return Ok(None);
            }
        }
        Ok(Some(true))
    }

    /// Exclude a member name from `entity`.
    ///
    /// A declared property with that name is removed. Weaker sources can no
    /// longer add a member with this name until a stronger source does.
    pub fn ignore(
        &mut self,
        entity: EntityTypeId,
        member: &str,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let entity_type = self.model.entity_type_or_err(entity)?;
        if let Some(ignored) = entity_type.ignored_source(member) {
            if ignored >= source {
                return Ok(true);
            }
        }

        if let Some(property) = self.model.find_declared_property(entity, member) {
            if !self.remove_property(property, source)? {
                return Ok(false);
            }
        }

        self.model
            .entity_type_mut(entity)?
            .ignored
            .insert(member.to_string(), source);
        debug!(entity = %self.model.entity_name(entity), member, %source, "member ignored");
        Ok(true)
    }
}

/// Configures one entity type.
pub struct EntityTypeBuilder<'a> {
    builder: &'a mut ModelBuilder,
    entity: EntityTypeId,
}

impl<'a> EntityTypeBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ModelBuilder, entity: EntityTypeId) -> Self {
        Self { builder, entity }
    }

    /// Id of the configured entity type.
    pub fn id(&self) -> EntityTypeId {
        self.entity
    }

    /// Current metadata of the entity type.
    pub fn metadata(&self) -> Result<&EntityType> {
        self.builder.model.entity_type_or_err(self.entity)
    }

    /// The underlying model builder.
    pub fn model_builder(&mut self) -> &mut ModelBuilder {
        self.builder
    }

    /// Add or reconfigure a mapped property.
    pub fn property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyBuilder<'_>>> {
        let id = self
            .builder
            .add_property(self.entity, name, property_type, false, source)?;
        Ok(id.map(|id| PropertyBuilder::new(self.builder, id)))
    }

    /// Add or reconfigure a property with no backing member.
    pub fn shadow_property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyBuilder<'_>>> {
        let id = self
            .builder
            .add_property(self.entity, name, property_type, true, source)?;
        Ok(id.map(|id| PropertyBuilder::new(self.builder, id)))
    }

    /// Add a key over the named properties.
    pub fn key(
        &mut self,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<KeyBuilder<'_>>> {
        let id = self.builder.add_key(self.entity, properties, source)?;
        Ok(id.map(|id| KeyBuilder::new(self.builder, id)))
    }

    /// Add an index over the named properties.
    pub fn index(
        &mut self,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<IndexBuilder<'_>>> {
        let id = self.builder.add_index(self.entity, properties, source)?;
        Ok(id.map(|id| IndexBuilder::new(self.builder, id)))
    }

    /// Add a foreign key from the named properties to `principal`.
    pub fn foreign_key(
        &mut self,
        principal: EntityTypeId,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<RelationshipBuilder<'_>>> {
        let id = self
            .builder
            .add_foreign_key(self.entity, principal, properties, source)?;
        Ok(id.map(|id| RelationshipBuilder::new(self.builder, id)))
    }

    /// Set or clear the base type.
    pub fn base_type(
        &mut self,
        base: Option<EntityTypeId>,
        source: ConfigurationSource,
    ) -> Result<Option<bool>> {
        self.builder.set_base_type(self.entity, base, source)
    }

    /// Exclude a member name.
    pub fn ignore(&mut self, member: &str, source: ConfigurationSource) -> Result<bool> {
        self.builder.ignore(self.entity, member, source)
    }

    /// Set or remove an entity type annotation.
    pub fn annotation(
        &mut self,
        name: &str,
        value: Option<Value>,
        source: ConfigurationSource,
    ) -> Result<SetOutcome<Option<Value>>> {
        self.builder
            .set_annotation(ElementRef::EntityType(self.entity), name, value, source)
    }

    /// Relational facets of this entity type.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalEntityTypeBuilder<'_> {
        RelationalEntityTypeBuilder::new(self.builder, self.entity, source)
    }

    /// Relational facets, consuming this handle.
    pub fn into_relational(self, source: ConfigurationSource) -> RelationalEntityTypeBuilder<'a> {
        RelationalEntityTypeBuilder::new(self.builder, self.entity, source)
    }
}
