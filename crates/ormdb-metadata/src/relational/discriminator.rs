//! Discriminator configuration for inheritance hierarchies.
//!
//! The discriminator property lives on the hierarchy root and is named by the
//! root's `DiscriminatorProperty` annotation. Each entity type in the
//! hierarchy stores its own `DiscriminatorValue` annotation.

use super::builder::RelationalEntityTypeBuilder;
use super::names::{RelationalFacet, DEFAULT_DISCRIMINATOR_NAME};
use crate::builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, PropertyId, PropertyType, Value};
use crate::source::ConfigurationSource;
use tracing::debug;

impl<'a> RelationalEntityTypeBuilder<'a> {
    fn root(&self) -> EntityTypeId {
        self.builder.metadata().root_type(self.entity)
    }

    fn configured_discriminator(&self, root: EntityTypeId) -> Option<String> {
        self.builder
            .metadata()
            .annotations_of(ElementRef::EntityType(root))?
            .value(&self.annotation_name(RelationalFacet::DiscriminatorProperty))?
            .as_str()
            .map(str::to_string)
    }

    /// Configure the discriminator, creating a string property named
    /// `Discriminator` on the root if none is configured yet.
    pub fn discriminator(self) -> Result<Option<DiscriminatorBuilder<'a>>> {
        let root = self.root();
        match self.configured_discriminator(root) {
            Some(name) => match self.builder.metadata().find_property(root, &name) {
                Some(_) => {
                    let source = self.source;
                    let value_key = self.annotation_name(RelationalFacet::DiscriminatorValue);
                    let property_key = self.annotation_name(RelationalFacet::DiscriminatorProperty);
                    Ok(Some(DiscriminatorBuilder {
                        builder: self.builder,
                        root,
                        source,
                        property_key,
                        value_key,
                    }))
                }
                None => self.discriminator_property(&name, PropertyType::string()),
            },
            None => self.discriminator_property(DEFAULT_DISCRIMINATOR_NAME, PropertyType::string()),
        }
    }

    /// Change the type of the discriminator property, keeping its name.
    pub fn discriminator_type(
        self,
        property_type: PropertyType,
    ) -> Result<Option<DiscriminatorBuilder<'a>>> {
        let name = self
            .configured_discriminator(self.root())
            .unwrap_or_else(|| DEFAULT_DISCRIMINATOR_NAME.to_string());
        self.discriminator_property(&name, property_type)
    }

    /// Use the property `name` of type `property_type` as discriminator.
    ///
    /// Switching from a different configured property retires the previous
    /// one if it was a shadow property created by a source no stronger than
    /// this call, and clears the discriminator values this call may override.
    /// Values left behind by [`remove_discriminator`](Self::remove_discriminator)
    /// are kept. Returns `Ok(None)` when a stronger source configured the
    /// discriminator or the name is ignored.
    pub fn discriminator_property(
        self,
        name: &str,
        property_type: PropertyType,
    ) -> Result<Option<DiscriminatorBuilder<'a>>> {
        self.builder.ensure_mutable()?;
        let root = self.root();
        let element = ElementRef::EntityType(root);
        if name.is_empty() {
            return Err(MetadataError::EmptyName {
                element: self.builder.metadata().display_name(element),
                facet: "discriminator property",
            });
        }

        let source = self.source;
        let allow_same_source = self.builder.allow_same_source();
        let property_key = self.annotation_name(RelationalFacet::DiscriminatorProperty);
        let value_key = self.annotation_name(RelationalFacet::DiscriminatorValue);
        let current = self.configured_discriminator(root);
        let requested = Value::from(name);

        let model = self.builder.metadata();
        let annotations = model
            .annotations_of(element)
            .ok_or_else(|| self.builder.element_not_found(element))?;
        if !annotations.can_set(&property_key, Some(&requested), source, allow_same_source) {
            debug!(root = %model.display_name(element), property = name, %source, "discriminator write rejected");
            return Ok(None);
        }

        let root_type = model.entity_type_or_err(root)?;
        if let Some(ignored) = root_type.ignored_source(name) {
            if !source.overrides(Some(ignored), true) {
                debug!(root = %root_type.name(), property = name, "discriminator name is ignored");
                return Ok(None);
            }
        }
        if let Some(existing) = model.find_property(root, name) {
            let existing = model.property_or_err(existing)?;
            if existing.property_type() != property_type
                && !source.accepts(existing.property_type_source(), false, allow_same_source)
            {
                return Ok(None);
            }
        }

        let switching = current.as_deref().is_some_and(|old| old != name);
        let previous = current
            .as_deref()
            .filter(|_| switching)
            .and_then(|old| model.find_property(root, old));

        let builder = self.builder;
        if builder
            .add_property(root, name, property_type, true, source)?
            .is_none()
        {
            return Ok(None);
        }
        builder.set_annotation(element, &property_key, Some(requested), source)?;

        if let Some(previous) = previous {
            retire_shadow_property(builder, previous, source)?;
        }
        if switching {
            clear_discriminator_values(builder, root, &value_key, source)?;
            debug!(root = %builder.metadata().display_name(element), property = name, %source, "discriminator property changed");
        }

        Ok(Some(DiscriminatorBuilder {
            builder,
            root,
            source,
            property_key,
            value_key,
        }))
    }

    /// Remove the discriminator configuration from the hierarchy root.
    ///
    /// Discriminator values stay on the entity types and become active again
    /// when a discriminator is configured next.
    pub fn remove_discriminator(self) -> Result<bool> {
        self.builder.ensure_mutable()?;
        let root = self.root();
        let element = ElementRef::EntityType(root);
        let property_key = self.annotation_name(RelationalFacet::DiscriminatorProperty);
        let Some(current) = self.configured_discriminator(root) else {
            return Ok(true);
        };

        let source = self.source;
        let previous = self.builder.metadata().find_property(root, &current);
        let builder = self.builder;
        if !builder
            .set_annotation(element, &property_key, None, source)?
            .accepted
        {
            return Ok(false);
        }
        if let Some(previous) = previous {
            retire_shadow_property(builder, previous, source)?;
        }
        Ok(true)
    }
}

/// Remove a former discriminator property if it is an unused shadow property
/// no stronger than `source`.
fn retire_shadow_property(
    builder: &mut ModelBuilder,
    property: PropertyId,
    source: ConfigurationSource,
) -> Result<()> {
    let model = builder.metadata();
    let Some(existing) = model.property(property) else {
        return Ok(());
    };
    if existing.is_shadow()
        && source.overrides(model.strongest_source(ElementRef::Property(property)), true)
        && model.property_users(property).is_none()
    {
        builder.remove_property(property, source)?;
    }
    Ok(())
}

fn clear_discriminator_values(
    builder: &mut ModelBuilder,
    root: EntityTypeId,
    value_key: &str,
    source: ConfigurationSource,
) -> Result<()> {
    for member in builder.metadata().hierarchy(root) {
        let element = ElementRef::EntityType(member);
        let clearable = builder
            .metadata()
            .annotations_of(element)
            .and_then(|annotations| annotations.get(value_key))
            .is_some_and(|recorded| recorded.source <= source);
        if clearable {
            builder.set_annotation(element, value_key, None, source)?;
        }
    }
    Ok(())
}

/// Assigns discriminator values within one hierarchy.
pub struct DiscriminatorBuilder<'a> {
    builder: &'a mut ModelBuilder,
    root: EntityTypeId,
    source: ConfigurationSource,
    property_key: String,
    value_key: String,
}

impl<'a> DiscriminatorBuilder<'a> {
    /// Root of the configured hierarchy.
    pub fn root(&self) -> EntityTypeId {
        self.root
    }

    /// The discriminator property.
    pub fn property(&self) -> Option<PropertyId> {
        let name = self
            .builder
            .metadata()
            .annotations_of(ElementRef::EntityType(self.root))?
            .value(&self.property_key)?
            .as_str()?;
        self.builder.metadata().find_property(self.root, name)
    }

    /// Assign the discriminator value of `entity`.
    ///
    /// `entity` must be the root or derive from it, and the value must fit the
    /// discriminator property type. Returns `Ok(None)` when a stronger source
    /// configured the value; fails when another entity type in the hierarchy
    /// already uses it.
    pub fn has_value(
        &mut self,
        entity: EntityTypeId,
        value: impl Into<Value>,
    ) -> Result<Option<&mut Self>> {
        self.builder.ensure_mutable()?;
        let value = value.into();
        let element = ElementRef::EntityType(entity);
        {
            let model = self.builder.metadata();
            let property = self
                .property()
                .ok_or_else(|| MetadataError::NoDiscriminatorProperty {
                    root: model.entity_name(self.root),
                })?;
            model.entity_type_or_err(entity)?;
            if !model.is_same_or_derived(entity, self.root) {
                return Err(MetadataError::EntityTypeNotDerived {
                    entity: model.entity_name(entity),
                    root: model.entity_name(self.root),
                });
            }

            let property = model.property_or_err(property)?;
            if !property.property_type().accepts(&value) {
                return Err(MetadataError::InvalidDiscriminatorValue {
                    entity: model.entity_name(entity),
                    property: property.name().to_string(),
                    value,
                    expected: property.property_type(),
                });
            }

            let annotations = model
                .annotations_of(element)
                .ok_or_else(|| self.builder.element_not_found(element))?;
            if !annotations.can_set(
                &self.value_key,
                Some(&value),
                self.source,
                self.builder.allow_same_source(),
            ) {
                debug!(entity = %model.entity_name(entity), source = %self.source, "discriminator value write rejected");
                return Ok(None);
            }

            let duplicate = model
                .hierarchy(self.root)
                .into_iter()
                .filter(|member| *member != entity)
                .find(|member| {
                    model
                        .annotations_of(ElementRef::EntityType(*member))
                        .and_then(|annotations| annotations.value(&self.value_key))
                        == Some(&value)
                });
            if let Some(existing) = duplicate {
                return Err(MetadataError::DuplicateDiscriminatorValue {
                    entity: model.entity_name(entity),
                    value,
                    existing: model.entity_name(existing),
                });
            }
        }

        self.builder
            .set_annotation(element, &self.value_key, Some(value), self.source)?;
        Ok(Some(self))
    }

    /// Assign the discriminator value of the entity type named `name`.
    pub fn has_value_for(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<&mut Self>> {
        let entity = self
            .builder
            .metadata()
            .find_entity_type(name)
            .ok_or_else(|| MetadataError::EntityTypeNotFound {
                entity: name.to_string(),
            })?;
        self.has_value(entity, value)
    }
}
