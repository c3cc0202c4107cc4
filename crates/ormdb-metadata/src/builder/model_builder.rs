//! The model builder: entry point for every graph mutation.

use super::entity::EntityTypeBuilder;
use crate::config::BuilderConfig;
use crate::convention::{AnnotationChange, ConventionSet};
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityType, EntityTypeId, Model, ModelSnapshot, Value};
use crate::source::{ConfigurationSource, SetOutcome};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Builds a [`Model`] under source-precedence rules.
///
/// Every accepted mutation is reported to the registered conventions before
/// the call returns. Rejected writes are not errors; they return `Ok(None)`,
/// `Ok(false)` or a rejected [`SetOutcome`].
pub struct ModelBuilder {
    pub(crate) model: Model,
    pub(crate) conventions: Arc<ConventionSet>,
    pub(crate) config: BuilderConfig,
    pub(crate) depth: usize,
}

impl ModelBuilder {
    /// Create a builder over an empty model with default configuration.
    pub fn new(conventions: ConventionSet) -> Self {
        Self::with_config(conventions, BuilderConfig::default())
    }

    /// Create a builder over an empty model.
    pub fn with_config(conventions: ConventionSet, config: BuilderConfig) -> Self {
        Self::from_model(Model::new(), conventions, config)
    }

    /// Continue building an existing, still mutable model.
    pub fn from_model(mut model: Model, conventions: ConventionSet, config: BuilderConfig) -> Self {
        model.provider_prefix = config.provider_prefix.clone();
        Self {
            model,
            conventions: Arc::new(conventions),
            config,
            depth: 0,
        }
    }

    /// The model under construction.
    pub fn metadata(&self) -> &Model {
        &self.model
    }

    /// Builder configuration.
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Registered conventions.
    pub fn conventions(&self) -> &ConventionSet {
        &self.conventions
    }

    /// Capture a name-keyed snapshot of the current model.
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::capture(&self.model)
    }

    pub(crate) fn ensure_mutable(&self) -> Result<()> {
        if self.model.read_only {
            return Err(MetadataError::ReadOnly);
        }
        Ok(())
    }

    pub(crate) fn allow_same_source(&self) -> bool {
        self.config.allow_same_source_overwrite
    }

    /// Add an entity type, or return the existing one with the same name.
    ///
    /// Returns `Ok(None)` when a convention removed the new entity type.
    pub fn add_entity_type(
        &mut self,
        name: &str,
        source: ConfigurationSource,
    ) -> Result<Option<EntityTypeId>> {
        self.ensure_mutable()?;
        if name.is_empty() {
            return Err(MetadataError::EmptyName {
                element: "entity type".to_string(),
                facet: "name",
            });
        }

        if let Some(id) = self.model.find_entity_type(name) {
            let entity = self.model.entity_type_mut(id)?;
            entity.source = entity.source.max(source);
            return Ok(Some(id));
        }

        let id = self.model.entity_types.insert(EntityType::new(name, source));
        debug!(entity = name, %source, "entity type added");
        self.dispatch_entity_type_added(id)
    }

    /// Remove an entity type that no longer declares or anchors anything.
    ///
    /// Returns `Ok(false)` when a stronger source added or configured it.
    pub fn remove_entity_type(
        &mut self,
        entity: EntityTypeId,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let entity_type = self.model.entity_type_or_err(entity)?;
        if !source.overrides(self.model.strongest_source(ElementRef::EntityType(entity)), true) {
            return Ok(false);
        }

        let used_by = if !entity_type.is_bare() {
            Some(format!("members declared on {}", entity_type.name))
        } else if let Some(fk) = self.model.referencing_foreign_keys(entity).first() {
            Some(self.model.display_name(ElementRef::ForeignKey(*fk)))
        } else {
            self.model
                .derived_types(entity)
                .first()
                .map(|derived| self.model.entity_name(*derived))
        };
        if let Some(used_by) = used_by {
            return Err(MetadataError::ElementInUse {
                element: self.model.entity_name(entity),
                used_by,
            });
        }

        if let Some(removed) = self.model.entity_types.remove(entity) {
            debug!(entity = %removed.name, %source, "entity type removed");
        }
        Ok(true)
    }

    /// Handle for configuring the entity type named `name`, adding it if needed.
    pub fn entity(
        &mut self,
        name: &str,
        source: ConfigurationSource,
    ) -> Result<Option<EntityTypeBuilder<'_>>> {
        let id = self.add_entity_type(name, source)?;
        Ok(id.map(|id| EntityTypeBuilder::new(self, id)))
    }

    /// Handle for configuring an existing entity type.
    pub fn entity_builder(&mut self, entity: EntityTypeId) -> Result<EntityTypeBuilder<'_>> {
        self.model.entity_type_or_err(entity)?;
        Ok(EntityTypeBuilder::new(self, entity))
    }

    /// Set, replace or remove (`None`) an annotation on any element.
    ///
    /// Accepted changes are dispatched to the conventions registered for the
    /// element kind. The returned outcome reports the value in place after
    /// dispatch, and whether a convention removed the element meanwhile.
    pub fn set_annotation(
        &mut self,
        element: ElementRef,
        name: &str,
        value: Option<Value>,
        source: ConfigurationSource,
    ) -> Result<SetOutcome<Option<Value>>> {
        self.ensure_mutable()?;
        let allow_same_source = self.allow_same_source();
        let annotations = self.annotations_or_err(element)?;
        let current = annotations.value(name).cloned();

        if !annotations.can_set(name, value.as_ref(), source, allow_same_source) {
            debug!(
                element = %self.model.display_name(element),
                annotation = name,
                %source,
                "annotation write rejected"
            );
            return Ok(SetOutcome::rejected(current));
        }

        let previous = match self.model.annotations_of_mut(element) {
            Some(annotations) => annotations.set(name, value.clone(), source),
            None => return Err(self.element_not_found(element)),
        };

        let mut removed = false;
        if value != previous {
            trace!(
                element = %self.model.display_name(element),
                annotation = name,
                %source,
                "annotation changed"
            );
            removed = self
                .dispatch_annotation_set(AnnotationChange {
                    element,
                    name: name.to_string(),
                    new_value: value,
                    old_value: previous.clone(),
                })?
                .is_none();
        }

        let current = self
            .model
            .annotations_of(element)
            .and_then(|annotations| annotations.value(name).cloned());
        Ok(SetOutcome {
            accepted: true,
            current,
            previous,
            removed,
        })
    }

    /// Downgrade an annotation to `Convention` so weaker callers may change it.
    ///
    /// The value is kept; a cleared annotation stays cleared. Returns `false`
    /// when the annotation was never configured.
    pub fn reset_configuration_source(&mut self, element: ElementRef, name: &str) -> Result<bool> {
        self.ensure_mutable()?;
        match self.model.annotations_of_mut(element) {
            Some(annotations) => Ok(annotations.reset_source(name)),
            None => Err(self.element_not_found(element)),
        }
    }

    /// Validate the model and freeze it.
    ///
    /// After finalization every mutation fails with [`MetadataError::ReadOnly`].
    #[instrument(skip(self))]
    pub fn finalize(mut self) -> Result<Model> {
        self.ensure_mutable()?;
        let entities: Vec<EntityTypeId> = self.model.entity_types().map(|(id, _)| id).collect();
        for entity in &entities {
            self.model.table_sharing_ownership(*entity)?;
        }

        self.model.read_only = true;
        info!(
            entity_types = entities.len(),
            foreign_keys = self.model.foreign_keys.len(),
            "model finalized"
        );
        Ok(self.model)
    }

    fn annotations_or_err(&self, element: ElementRef) -> Result<&crate::model::Annotations> {
        self.model
            .annotations_of(element)
            .ok_or_else(|| self.element_not_found(element))
    }

    pub(crate) fn element_not_found(&self, element: ElementRef) -> MetadataError {
        MetadataError::ElementNotFound {
            element: self.model.display_name(element),
        }
    }
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("entity_types", &self.model.entity_types.len())
            .field("conventions", &self.conventions)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::{CapabilitySet, Convention};
    use crate::error::ErrorKind;
    use crate::model::{PropertyType, ScalarType};
    use ConfigurationSource::*;

    /// Removes an index once it is annotated as obsolete.
    struct DropObsoleteIndex;

    impl Convention for DropObsoleteIndex {
        fn name(&self) -> &str {
            "DropObsoleteIndex"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::INDEX_ANNOTATION_SET
        }

        fn annotation_set(
            &self,
            builder: &mut ModelBuilder,
            change: &AnnotationChange,
        ) -> Result<Option<ElementRef>> {
            match change.element {
                ElementRef::Index(index) if change.name == "Obsolete" => {
                    builder.remove_index(index, Explicit)?;
                    Ok(None)
                }
                element => Ok(Some(element)),
            }
        }
    }

    fn builder() -> ModelBuilder {
        ModelBuilder::new(ConventionSet::new())
    }

    #[test]
    fn test_add_entity_type_upgrades_source() {
        let mut builder = builder();
        let first = builder.add_entity_type("Order", Convention).unwrap().unwrap();
        let second = builder.add_entity_type("Order", Explicit).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(builder.metadata().entity_type(first).unwrap().source(), Explicit);
        assert!(!builder.remove_entity_type(first, Convention).unwrap());
        assert!(builder.remove_entity_type(first, Explicit).unwrap());
        assert!(builder.metadata().find_entity_type("Order").is_none());
    }

    #[test]
    fn test_empty_entity_name_rejected() {
        let err = builder().add_entity_type("", Explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DomainValidation);
    }

    #[test]
    fn test_annotation_tie_rule() {
        let mut builder = ModelBuilder::with_config(
            ConventionSet::new(),
            BuilderConfig::new().with_same_source_overwrite(false),
        );
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let element = ElementRef::EntityType(order);

        let first = builder
            .set_annotation(element, "Comment", Some(Value::from("a")), DataAnnotation)
            .unwrap();
        assert!(first.accepted);
        assert_eq!(first.previous, None);

        let same = builder
            .set_annotation(element, "Comment", Some(Value::from("a")), DataAnnotation)
            .unwrap();
        assert!(same.accepted);
        assert!(!same.changed());

        let other = builder
            .set_annotation(element, "Comment", Some(Value::from("b")), DataAnnotation)
            .unwrap();
        assert!(!other.accepted);
        assert_eq!(other.current, Some(Value::from("a")));

        let weaker = builder
            .set_annotation(element, "Comment", Some(Value::from("a")), Convention)
            .unwrap();
        assert!(!weaker.accepted);
    }

    #[test]
    fn test_reset_configuration_source() {
        let mut builder = builder();
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let element = ElementRef::EntityType(order);
        builder
            .set_annotation(element, "Comment", Some(Value::from("a")), Explicit)
            .unwrap();

        assert!(builder.reset_configuration_source(element, "Comment").unwrap());
        let outcome = builder
            .set_annotation(element, "Comment", Some(Value::from("b")), DataAnnotation)
            .unwrap();
        assert!(outcome.accepted);
        assert!(!builder.reset_configuration_source(element, "Missing").unwrap());
    }

    #[test]
    fn test_finalize_freezes_model() {
        let mut builder = builder();
        builder.add_entity_type("Order", Explicit).unwrap();
        let model = builder.finalize().unwrap();
        assert!(model.is_read_only());

        let mut builder = ModelBuilder::from_model(model, ConventionSet::new(), BuilderConfig::new());
        let err = builder.add_entity_type("Line", Explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_annotation_outcome_reports_removal() {
        let mut builder = ModelBuilder::new(ConventionSet::new().with(DropObsoleteIndex));
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        builder
            .add_property(order, "Number", PropertyType::required(ScalarType::String), false, Explicit)
            .unwrap();
        let index = builder.add_index(order, &["Number"], Convention).unwrap().unwrap();
        let element = ElementRef::Index(index);

        let kept = builder
            .set_annotation(element, "Comment", Some(Value::from("lookup")), Convention)
            .unwrap();
        assert!(kept.accepted && !kept.removed);

        let dropped = builder
            .set_annotation(element, "Obsolete", Some(Value::Bool(true)), Convention)
            .unwrap();
        assert!(dropped.accepted);
        assert!(dropped.removed);
        assert_eq!(dropped.current, None);
        assert!(builder.metadata().index(index).is_none());
    }

    #[test]
    fn test_cleared_annotation_blocks_weaker_source() {
        let mut builder = builder();
        let order = builder.add_entity_type("Order", Explicit).unwrap().unwrap();
        let element = ElementRef::EntityType(order);
        builder
            .set_annotation(element, "Comment", Some(Value::from("a")), Explicit)
            .unwrap();
        assert!(builder.set_annotation(element, "Comment", None, Explicit).unwrap().accepted);

        let weaker = builder
            .set_annotation(element, "Comment", Some(Value::from("c")), Convention)
            .unwrap();
        assert!(!weaker.accepted);
        assert_eq!(weaker.current, None);

        assert!(builder.reset_configuration_source(element, "Comment").unwrap());
        let after_reset = builder
            .set_annotation(element, "Comment", Some(Value::from("c")), Convention)
            .unwrap();
        assert!(after_reset.accepted);
    }
}
