//! Table sharing for owned one-to-one dependents.
//!
//! A dependent reached through a unique ownership foreign key maps to its
//! owner's table. The mapping is written at `Convention`, so any data
//! annotation or explicit configuration on the dependent wins.

use super::capability::{AnnotationChange, CapabilitySet, Convention};
use crate::builder::ModelBuilder;
use crate::error::Result;
use crate::model::{ElementRef, EntityTypeId, ForeignKeyId, Model};
use crate::relational::RelationalFacet;
use crate::source::ConfigurationSource;
use tracing::{debug, warn};

/// How an entity type's table name was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAssignment {
    /// No table name is configured; the default applies.
    Unset,
    /// Copied from the owner by table sharing.
    InheritedFromOwner,
    /// Configured for the entity type itself.
    OwnTable,
}

/// Keeps the table of table-sharing dependents equal to their owner's.
#[derive(Debug, Default)]
pub struct SharedTableConvention;

impl SharedTableConvention {
    /// Create the convention.
    pub fn new() -> Self {
        Self
    }

    /// Classify the table mapping of `entity`.
    pub fn table_assignment(model: &Model, entity: EntityTypeId) -> TableAssignment {
        let view = model.relational_entity(entity);
        let Some(table) = view.configured_table_name() else {
            return TableAssignment::Unset;
        };
        if view.table_name_source() != Some(ConfigurationSource::Convention) {
            return TableAssignment::OwnTable;
        }

        let owner = match model.table_sharing_ownership(entity) {
            Ok(Some(fk)) => model.foreign_key(fk).map(|fk| fk.principal_entity_type()),
            _ => None,
        };
        match owner {
            Some(owner) if model.relational_entity(owner).table_name() == table => {
                TableAssignment::InheritedFromOwner
            }
            _ => TableAssignment::OwnTable,
        }
    }

    /// Re-derive the table mapping of `entity` from its ownership.
    fn sync(&self, builder: &mut ModelBuilder, entity: EntityTypeId) -> Result<()> {
        let ownership = match builder.metadata().table_sharing_ownership(entity) {
            Ok(ownership) => ownership,
            Err(err) => {
                warn!(entity = %builder.metadata().display_name(ElementRef::EntityType(entity)), error = %err, "conflicting table sharing");
                return Err(err);
            }
        };
        match ownership {
            Some(fk) => self.share_owner_table(builder, fk),
            None => self.clear_table(builder, entity),
        }
    }

    fn share_owner_table(&self, builder: &mut ModelBuilder, foreign_key: ForeignKeyId) -> Result<()> {
        let model = builder.metadata();
        let Some(fk) = model.foreign_key(foreign_key) else {
            return Ok(());
        };
        let (owner, dependent) = (fk.principal_entity_type(), fk.declaring_entity_type());
        let owner_view = model.relational_entity(owner);
        let table = owner_view.table_name();
        let schema = owner_view.schema();

        let accepted = builder
            .relational_entity(dependent, ConfigurationSource::Convention)
            .to_table_in_schema(Some(&table), schema.as_deref())?;
        debug!(
            dependent = %builder.metadata().display_name(ElementRef::EntityType(dependent)),
            table = %table,
            accepted,
            "shared owner table"
        );
        Ok(())
    }

    fn clear_table(&self, builder: &mut ModelBuilder, entity: EntityTypeId) -> Result<()> {
        if Self::table_assignment(builder.metadata(), entity) == TableAssignment::Unset
            && builder
                .metadata()
                .relational_entity(entity)
                .configured_schema()
                .is_none()
        {
            return Ok(());
        }
        let mut relational = builder.relational_entity(entity, ConfigurationSource::Convention);
        relational.to_table(None)?;
        relational.schema(None)?;
        Ok(())
    }

    /// Table-sharing dependents of `owner`.
    fn dependents(model: &Model, owner: EntityTypeId) -> Vec<ForeignKeyId> {
        model
            .referencing_foreign_keys(owner)
            .into_iter()
            .filter(|fk| model.foreign_key(*fk).is_some_and(|fk| fk.is_table_sharing()))
            .collect()
    }
}

impl Convention for SharedTableConvention {
    fn name(&self) -> &str {
        "SharedTableConvention"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::ENTITY_TYPE_ADDED
            | CapabilitySet::ENTITY_TYPE_ANNOTATION_SET
            | CapabilitySet::FOREIGN_KEY_ADDED
            | CapabilitySet::FOREIGN_KEY_REMOVED
            | CapabilitySet::FOREIGN_KEY_OWNERSHIP_CHANGED
            | CapabilitySet::FOREIGN_KEY_UNIQUENESS_CHANGED
    }

    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        if let Some(fk) = builder.metadata().table_sharing_ownership(entity)? {
            self.share_owner_table(builder, fk)?;
        }
        Ok(Some(entity))
    }

    fn annotation_set(
        &self,
        builder: &mut ModelBuilder,
        change: &AnnotationChange,
    ) -> Result<Option<ElementRef>> {
        let ElementRef::EntityType(owner) = change.element else {
            return Ok(Some(change.element));
        };
        let provider = builder.config().provider_prefix.clone();
        let provider = provider.as_deref();
        if !RelationalFacet::TableName.matches(&change.name, provider)
            && !RelationalFacet::Schema.matches(&change.name, provider)
        {
            return Ok(Some(change.element));
        }

        for fk in Self::dependents(builder.metadata(), owner) {
            self.share_owner_table(builder, fk)?;
        }
        Ok(Some(change.element))
    }

    fn foreign_key_added(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        let declaring = builder.metadata().foreign_key_or_err(foreign_key)?.declaring_entity_type();
        self.sync(builder, declaring)?;
        Ok(Some(foreign_key))
    }

    fn foreign_key_removed(
        &self,
        builder: &mut ModelBuilder,
        declaring: EntityTypeId,
        _foreign_key: ForeignKeyId,
    ) -> Result<()> {
        self.sync(builder, declaring)
    }

    fn foreign_key_ownership_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        let declaring = builder.metadata().foreign_key_or_err(foreign_key)?.declaring_entity_type();
        self.sync(builder, declaring)?;
        Ok(Some(foreign_key))
    }

    fn foreign_key_uniqueness_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        let declaring = builder.metadata().foreign_key_or_err(foreign_key)?.declaring_entity_type();
        self.sync(builder, declaring)?;
        Ok(Some(foreign_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::ConventionSet;
    use crate::model::{PropertyType, ScalarType};
    use ConfigurationSource::*;

    fn owned_pair() -> (ModelBuilder, EntityTypeId, EntityTypeId, ForeignKeyId) {
        let mut builder = ModelBuilder::new(ConventionSet::relational());
        let person = builder.add_entity_type("Person", Explicit).unwrap().unwrap();
        let address = builder.add_entity_type("Address", Explicit).unwrap().unwrap();
        builder
            .add_property(address, "PersonId", PropertyType::required(ScalarType::Int64), false, Explicit)
            .unwrap();
        let fk = builder
            .add_foreign_key(address, person, &["PersonId"], Explicit)
            .unwrap()
            .unwrap();
        (builder, person, address, fk)
    }

    #[test]
    fn test_dependent_follows_owner() {
        let (mut builder, person, address, fk) = owned_pair();
        builder.relationship(fk).unwrap().owned_one_to_one(Explicit).unwrap();

        assert_eq!(builder.metadata().relational_entity(address).table_name(), "Person");
        assert_eq!(
            SharedTableConvention::table_assignment(builder.metadata(), address),
            TableAssignment::InheritedFromOwner
        );

        builder
            .relational_entity(person, Explicit)
            .to_table_in_schema(Some("People"), Some("crm"))
            .unwrap();
        let view = builder.metadata().relational_entity(address);
        assert_eq!(view.table_name(), "People");
        assert_eq!(view.schema().as_deref(), Some("crm"));
    }

    #[test]
    fn test_explicit_dependent_table_wins() {
        let (mut builder, _, address, fk) = owned_pair();
        builder
            .relational_entity(address, DataAnnotation)
            .to_table(Some("Addresses"))
            .unwrap();
        builder.relationship(fk).unwrap().owned_one_to_one(Explicit).unwrap();

        assert_eq!(builder.metadata().relational_entity(address).table_name(), "Addresses");
        assert_eq!(
            SharedTableConvention::table_assignment(builder.metadata(), address),
            TableAssignment::OwnTable
        );
    }

    #[test]
    fn test_dropping_ownership_clears_table() {
        let (mut builder, _, address, fk) = owned_pair();
        builder.relationship(fk).unwrap().owned_one_to_one(Explicit).unwrap();
        builder.set_foreign_key_unique(fk, false, Explicit).unwrap();

        let view = builder.metadata().relational_entity(address);
        assert_eq!(view.configured_table_name(), None);
        assert_eq!(view.table_name(), "Address");
        assert_eq!(
            SharedTableConvention::table_assignment(builder.metadata(), address),
            TableAssignment::Unset
        );
    }
}
