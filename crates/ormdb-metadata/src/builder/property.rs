//! Property configuration.

use super::model_builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, Property, PropertyId, PropertyType, Value};
use crate::relational::RelationalPropertyBuilder;
use crate::source::{ConfigurationSource, SetOutcome, Tracked};
use tracing::{debug, trace};

impl ModelBuilder {
    /// Add a property to `entity`, or reconfigure the one already visible
    /// under `name`.
    ///
    /// Returns `Ok(None)` when the name is ignored by a stronger source or the
    /// existing property's type was configured by a stronger source.
    pub fn add_property(
        &mut self,
        entity: EntityTypeId,
        name: &str,
        property_type: PropertyType,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyId>> {
        self.ensure_mutable()?;
        let entity_type = self.model.entity_type_or_err(entity)?;
        if name.is_empty() {
            return Err(MetadataError::EmptyName {
                element: entity_type.name.clone(),
                facet: "property name",
            });
        }
        if let Some(ignored) = entity_type.ignored_source(name) {
            if !source.overrides(Some(ignored), true) {
                debug!(entity = %entity_type.name, property = name, "property is ignored");
                return Ok(None);
            }
        }

        let id = match self.model.find_property(entity, name) {
            Some(existing) => {
                let current = self.model.property_or_err(existing)?.property_type();
                if current != property_type
                    && !self.set_property_type(existing, property_type, source)?
                {
                    return Ok(None);
                }
                let property = self.model.property_mut(existing)?;
                property.source = property.source.max(source);
                existing
            }
            None => {
                let id = self.model.properties.insert(Property::new(
                    name,
                    entity,
                    property_type,
                    shadow,
                    source,
                ));
                self.model.entity_type_mut(entity)?.properties.push(id);
                trace!(entity = %self.model.entity_name(entity), property = name, %source, "property added");
                id
            }
        };

        self.model.entity_type_mut(entity)?.ignored.shift_remove(name);
        Ok(Some(id))
    }

    /// Change the type of a property.
    pub fn set_property_type(
        &mut self,
        property: PropertyId,
        property_type: PropertyType,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let current = self.model.property_or_err(property)?.property_type.clone();
        let same = current.value == property_type;
        if !source.accepts(current.source, same, self.allow_same_source()) {
            return Ok(false);
        }
        self.model.property_mut(property)?.property_type =
            Tracked::new(property_type, source.max_with(current.source));
        Ok(true)
    }

    /// Remove a property no key, index or foreign key uses.
    pub fn remove_property(
        &mut self,
        property: PropertyId,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let existing = self.model.property_or_err(property)?;
        if !source.overrides(self.model.strongest_source(ElementRef::Property(property)), true) {
            return Ok(false);
        }
        if let Some(user) = self.model.property_users(property) {
            return Err(MetadataError::ElementInUse {
                element: self.model.display_name(ElementRef::Property(property)),
                used_by: self.model.display_name(user),
            });
        }

        let declaring = existing.declaring;
        if let Some(removed) = self.model.properties.remove(property) {
            trace!(property = %removed.name, %source, "property removed");
        }
        if let Some(entity) = self.model.entity_types.get_mut(declaring) {
            entity.properties.retain(|id| *id != property);
        }
        Ok(true)
    }

    pub(crate) fn resolve_properties(
        &self,
        entity: EntityTypeId,
        names: &[&str],
    ) -> Result<Vec<PropertyId>> {
        if names.is_empty() {
            return Err(MetadataError::EmptyName {
                element: self.model.entity_name(entity),
                facet: "property list",
            });
        }
        names
            .iter()
            .map(|name| {
                self.model
                    .find_property(entity, name)
                    .ok_or_else(|| MetadataError::PropertyNotFound {
                        entity: self.model.entity_name(entity),
                        property: name.to_string(),
                    })
            })
            .collect()
    }
}

/// Configures one property.
pub struct PropertyBuilder<'a> {
    builder: &'a mut ModelBuilder,
    property: PropertyId,
}

impl<'a> PropertyBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ModelBuilder, property: PropertyId) -> Self {
        Self { builder, property }
    }

    /// Id of the configured property.
    pub fn id(&self) -> PropertyId {
        self.property
    }

    /// Current metadata of the property.
    pub fn metadata(&self) -> Result<&Property> {
        self.builder.model.property_or_err(self.property)
    }

    /// Change the property type.
    pub fn property_type(
        &mut self,
        property_type: PropertyType,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.builder
            .set_property_type(self.property, property_type, source)
    }

    /// Set or remove a property annotation.
    pub fn annotation(
        &mut self,
        name: &str,
        value: Option<Value>,
        source: ConfigurationSource,
    ) -> Result<SetOutcome<Option<Value>>> {
        self.builder
            .set_annotation(ElementRef::Property(self.property), name, value, source)
    }

    /// Relational facets of this property.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalPropertyBuilder<'_> {
        RelationalPropertyBuilder::new(self.builder, self.property, source)
    }
}

#[cfg(test)]
mod tests {
    use crate::convention::ConventionSet;
    use crate::error::ErrorKind;
    use crate::model::{PropertyType, ScalarType};
    use crate::source::ConfigurationSource::*;
    use crate::ModelBuilder;

    #[test]
    fn test_property_type_follows_sources() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let total = builder
            .add_property(order, "Total", PropertyType::required(ScalarType::Int64), false, DataAnnotation)
            .unwrap()
            .unwrap();

        let again = builder
            .add_property(order, "Total", PropertyType::required(ScalarType::Int64), false, Convention)
            .unwrap();
        assert_eq!(again, Some(total));

        let retyped = builder
            .add_property(order, "Total", PropertyType::required(ScalarType::Float64), false, Convention)
            .unwrap();
        assert_eq!(retyped, None);
        assert!(builder
            .set_property_type(total, PropertyType::required(ScalarType::Float64), Explicit)
            .unwrap());
        assert_eq!(
            builder.metadata().property(total).unwrap().property_type(),
            PropertyType::required(ScalarType::Float64)
        );
    }

    #[test]
    fn test_property_in_use_cannot_be_removed() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let id = builder
            .add_property(order, "Id", PropertyType::required(ScalarType::Int64), false, Explicit)
            .unwrap()
            .unwrap();
        builder.add_key(order, &["Id"], Explicit).unwrap();

        let err = builder.remove_property(id, Explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_unknown_property_in_key() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let err = builder.add_key(order, &["Missing"], Explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
