//! Synchronous, re-entrant convention dispatch.
//!
//! Every accepted graph mutation calls into the dispatcher before the
//! mutating builder call returns. Conventions run in registration order and
//! may mutate the graph again; nested mutations dispatch on the same call
//! stack and resolve fully before the outer callback resumes. Errors are
//! never caught here.

use super::capability::{AnnotationChange, Capability, Convention};
use crate::builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, ForeignKeyId};
use std::sync::Arc;
use tracing::{debug, trace};

impl ModelBuilder {
    fn conventions_for(&self, capability: Capability) -> Vec<Arc<dyn Convention>> {
        self.conventions.for_capability(capability)
    }

    /// Run one callback one level deeper, failing if the depth limit is hit.
    fn invoke<T>(
        &mut self,
        convention: &dyn Convention,
        call: impl FnOnce(&mut ModelBuilder) -> Result<T>,
    ) -> Result<T> {
        if self.depth >= self.config.max_dispatch_depth {
            return Err(MetadataError::DispatchDepthExceeded {
                depth: self.config.max_dispatch_depth,
                convention: convention.name().to_string(),
            });
        }
        self.depth += 1;
        let result = call(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn dispatch_entity_type_added(
        &mut self,
        entity: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        let mut current = entity;
        for convention in self.conventions_for(Capability::EntityTypeAdded) {
            trace!(convention = convention.name(), depth = self.depth, "entity type added");
            let next =
                self.invoke(&*convention, |b| convention.entity_type_added(b, current))?;
            match next {
                Some(next) if self.model.entity_types.contains(next) => current = next,
                _ => {
                    debug!(convention = convention.name(), "entity type removed by convention");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub(crate) fn dispatch_annotation_set(
        &mut self,
        change: AnnotationChange,
    ) -> Result<Option<ElementRef>> {
        let capability = Capability::annotation_set_for(&change.element);
        let mut change = change;
        for convention in self.conventions_for(capability) {
            trace!(
                convention = convention.name(),
                annotation = %change.name,
                depth = self.depth,
                "annotation set"
            );
            let next = self.invoke(&*convention, |b| convention.annotation_set(b, &change))?;
            match next {
                Some(next) if self.model.contains(next) => change.element = next,
                _ => {
                    debug!(convention = convention.name(), "annotated element removed by convention");
                    return Ok(None);
                }
            }
        }
        Ok(Some(change.element))
    }

    pub(crate) fn dispatch_foreign_key_added(
        &mut self,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        self.dispatch_foreign_key(Capability::ForeignKeyAdded, foreign_key, |c, b, fk| {
            c.foreign_key_added(b, fk)
        })
    }

    pub(crate) fn dispatch_foreign_key_ownership_changed(
        &mut self,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        self.dispatch_foreign_key(
            Capability::ForeignKeyOwnershipChanged,
            foreign_key,
            |c, b, fk| c.foreign_key_ownership_changed(b, fk),
        )
    }

    pub(crate) fn dispatch_foreign_key_uniqueness_changed(
        &mut self,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        self.dispatch_foreign_key(
            Capability::ForeignKeyUniquenessChanged,
            foreign_key,
            |c, b, fk| c.foreign_key_uniqueness_changed(b, fk),
        )
    }

    fn dispatch_foreign_key(
        &mut self,
        capability: Capability,
        foreign_key: ForeignKeyId,
        call: impl Fn(&dyn Convention, &mut ModelBuilder, ForeignKeyId) -> Result<Option<ForeignKeyId>>,
    ) -> Result<Option<ForeignKeyId>> {
        let mut current = foreign_key;
        for convention in self.conventions_for(capability) {
            trace!(convention = convention.name(), ?capability, depth = self.depth, "foreign key");
            let next = self.invoke(&*convention, |b| call(&*convention, b, current))?;
            match next {
                Some(next) if self.model.foreign_keys.contains(next) => current = next,
                _ => {
                    debug!(convention = convention.name(), "foreign key removed by convention");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub(crate) fn dispatch_foreign_key_removed(
        &mut self,
        declaring: EntityTypeId,
        foreign_key: ForeignKeyId,
    ) -> Result<()> {
        for convention in self.conventions_for(Capability::ForeignKeyRemoved) {
            if !self.model.entity_types.contains(declaring) {
                break;
            }
            trace!(convention = convention.name(), depth = self.depth, "foreign key removed");
            self.invoke(&*convention, |b| {
                convention.foreign_key_removed(b, declaring, foreign_key)
            })?;
        }
        Ok(())
    }

    pub(crate) fn dispatch_base_type_changed(
        &mut self,
        entity: EntityTypeId,
        previous: Option<EntityTypeId>,
    ) -> Result<Option<EntityTypeId>> {
        let mut current = entity;
        for convention in self.conventions_for(Capability::BaseTypeChanged) {
            trace!(convention = convention.name(), depth = self.depth, "base type changed");
            let next = self.invoke(&*convention, |b| {
                convention.base_type_changed(b, current, previous)
            })?;
            match next {
                Some(next) if self.model.entity_types.contains(next) => current = next,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

#[cfg(test)]
mod tests {
    use crate::convention::{AnnotationChange, CapabilitySet, Convention, ConventionSet};
    use crate::error::{ErrorKind, Result};
    use crate::model::{ElementRef, EntityTypeId, Value};
    use crate::source::ConfigurationSource;
    use crate::{BuilderConfig, ModelBuilder};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Appends its tag to a shared log on every entity type added.
    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Convention for Recorder {
        fn name(&self) -> &str {
            self.tag
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::ENTITY_TYPE_ADDED
        }

        fn entity_type_added(
            &self,
            builder: &mut ModelBuilder,
            entity: EntityTypeId,
        ) -> Result<Option<EntityTypeId>> {
            let name = builder.metadata().entity_name(entity);
            self.log.lock().push(format!("{}:{}", self.tag, name));
            Ok(Some(entity))
        }
    }

    /// Removes every entity type named "Transient" as soon as it is added.
    struct RemoveTransient;

    impl Convention for RemoveTransient {
        fn name(&self) -> &str {
            "RemoveTransient"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::ENTITY_TYPE_ADDED
        }

        fn entity_type_added(
            &self,
            builder: &mut ModelBuilder,
            entity: EntityTypeId,
        ) -> Result<Option<EntityTypeId>> {
            if builder.metadata().entity_name(entity) == "Transient" {
                builder.remove_entity_type(entity, ConfigurationSource::Explicit)?;
                return Ok(None);
            }
            Ok(Some(entity))
        }
    }

    /// Rewrites every annotation it sees with a fresh value.
    struct Flapper;

    impl Convention for Flapper {
        fn name(&self) -> &str {
            "Flapper"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::ENTITY_TYPE_ANNOTATION_SET
        }

        fn annotation_set(
            &self,
            builder: &mut ModelBuilder,
            change: &AnnotationChange,
        ) -> Result<Option<ElementRef>> {
            let next = change.new_value.as_ref().and_then(Value::as_i64).unwrap_or(0) + 1;
            builder.set_annotation(
                change.element,
                &change.name,
                Some(Value::Int64(next)),
                ConfigurationSource::Convention,
            )?;
            Ok(Some(change.element))
        }
    }

    #[test]
    fn test_registration_order_is_dispatch_order() {
        for _ in 0..3 {
            let log = Arc::new(Mutex::new(Vec::new()));
            let conventions = ConventionSet::new()
                .with(Recorder {
                    tag: "C1",
                    log: log.clone(),
                })
                .with(Recorder {
                    tag: "C2",
                    log: log.clone(),
                });
            let mut builder = ModelBuilder::new(conventions);
            builder
                .add_entity_type("Person", ConfigurationSource::Explicit)
                .unwrap();

            assert_eq!(*log.lock(), vec!["C1:Person", "C2:Person"]);
        }
    }

    #[test]
    fn test_removal_stops_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let conventions = ConventionSet::new().with(RemoveTransient).with(Recorder {
            tag: "after",
            log: log.clone(),
        });
        let mut builder = ModelBuilder::new(conventions);

        let result = builder
            .add_entity_type("Transient", ConfigurationSource::Convention)
            .unwrap();
        assert!(result.is_none());
        assert!(builder.metadata().find_entity_type("Transient").is_none());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let config = BuilderConfig::new().with_max_dispatch_depth(8);
        let mut builder = ModelBuilder::with_config(ConventionSet::new().with(Flapper), config);
        let person = builder
            .add_entity_type("Person", ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();

        let err = builder
            .set_annotation(
                ElementRef::EntityType(person),
                "Counter",
                Some(Value::Int64(0)),
                ConfigurationSource::Convention,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
