//! Foreign key configuration.

use super::model_builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, ForeignKey, ForeignKeyId};
use crate::relational::RelationalNameBuilder;
use crate::source::{ConfigurationSource, Tracked};
use tracing::{debug, trace};

impl ModelBuilder {
    /// Add a foreign key from `properties` on `declaring` to `principal`.
    ///
    /// The foreign key targets the first key of the principal hierarchy root,
    /// if one exists. Returns `Ok(None)` when a convention removed it.
    pub fn add_foreign_key(
        &mut self,
        declaring: EntityTypeId,
        principal: EntityTypeId,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<ForeignKeyId>> {
        self.ensure_mutable()?;
        self.model.entity_type_or_err(principal)?;
        let properties = self.resolve_properties(declaring, properties)?;
        let existing = self
            .model
            .entity_type_or_err(declaring)?
            .foreign_keys
            .iter()
            .copied()
            .find(|id| {
                self.model
                    .foreign_keys
                    .get(*id)
                    .is_some_and(|fk| fk.principal == principal && fk.properties == properties)
            });

        if let Some(id) = existing {
            let foreign_key = self.model.foreign_key_mut(id)?;
            foreign_key.source = foreign_key.source.max(source);
            return Ok(Some(id));
        }

        let principal_key = self
            .model
            .entity_type(self.model.root_type(principal))
            .and_then(|root| root.keys.first().copied());
        let id = self.model.foreign_keys.insert(ForeignKey::new(
            declaring,
            principal,
            properties,
            principal_key,
            source,
        ));
        self.model.entity_type_mut(declaring)?.foreign_keys.push(id);
        debug!(foreign_key = %self.model.display_name(ElementRef::ForeignKey(id)), %source, "foreign key added");
        self.dispatch_foreign_key_added(id)
    }

    /// Remove a foreign key and notify conventions with its former declaring type.
    pub fn remove_foreign_key(
        &mut self,
        foreign_key: ForeignKeyId,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let existing = self.model.foreign_key_or_err(foreign_key)?;
        if !source.overrides(self.model.strongest_source(ElementRef::ForeignKey(foreign_key)), true) {
            debug!(foreign_key = %self.model.display_name(ElementRef::ForeignKey(foreign_key)), %source, "foreign key removal rejected");
            return Ok(false);
        }

        let declaring = existing.declaring;
        debug!(foreign_key = %self.model.display_name(ElementRef::ForeignKey(foreign_key)), %source, "foreign key removed");
        self.model.foreign_keys.remove(foreign_key);
        if let Some(entity) = self.model.entity_types.get_mut(declaring) {
            entity.foreign_keys.retain(|id| *id != foreign_key);
        }
        self.dispatch_foreign_key_removed(declaring, foreign_key)?;
        Ok(true)
    }

    /// Mark a foreign key unique (one-to-one) or not.
    ///
    /// Returns `Ok(Some(false))` when the write is rejected and `Ok(None)` when
    /// a convention removed the foreign key in reaction to it.
    pub fn set_foreign_key_unique(
        &mut self,
        foreign_key: ForeignKeyId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Result<Option<bool>> {
        self.ensure_mutable()?;
        let current = self.model.foreign_key_or_err(foreign_key)?.is_unique.clone();
        let same = current.value == unique;
        if !source.accepts(current.source, same, self.allow_same_source()) {
            return Ok(Some(false));
        }

        self.model.foreign_key_mut(foreign_key)?.is_unique =
            Tracked::new(unique, source.max_with(current.source));
        if !same {
            trace!(foreign_key = %self.model.display_name(ElementRef::ForeignKey(foreign_key)), unique, "uniqueness changed");
            if self.dispatch_foreign_key_uniqueness_changed(foreign_key)?.is_none() {
                return Ok(None);
            }
        }
        Ok(Some(true))
    }

    /// Mark a foreign key as an ownership or not.
    ///
    /// A dependent entity type can be owned through at most one foreign key.
    /// Returns `Ok(None)` when a convention removed the foreign key.
    pub fn set_foreign_key_ownership(
        &mut self,
        foreign_key: ForeignKeyId,
        ownership: bool,
        source: ConfigurationSource,
    ) -> Result<Option<bool>> {
        self.ensure_mutable()?;
        let existing = self.model.foreign_key_or_err(foreign_key)?;
        let current = existing.is_ownership.clone();
        let declaring = existing.declaring;
        let same = current.value == ownership;
        if !source.accepts(current.source, same, self.allow_same_source()) {
            return Ok(Some(false));
        }

        if ownership && !same {
            let owned_elsewhere = self
                .model
                .entity_type_or_err(declaring)?
                .foreign_keys
                .iter()
                .filter(|id| **id != foreign_key)
                .filter(|id| self.model.foreign_keys.get(**id).is_some_and(|fk| fk.is_ownership()))
                .count();
            if owned_elsewhere > 0 {
                return Err(MetadataError::MultipleOwnerships {
                    entity: self.model.entity_name(declaring),
                    count: owned_elsewhere + 1,
                });
            }
        }

        self.model.foreign_key_mut(foreign_key)?.is_ownership =
            Tracked::new(ownership, source.max_with(current.source));
        if !same {
            trace!(foreign_key = %self.model.display_name(ElementRef::ForeignKey(foreign_key)), ownership, "ownership changed");
            if self.dispatch_foreign_key_ownership_changed(foreign_key)?.is_none() {
                return Ok(None);
            }
        }
        Ok(Some(true))
    }

    /// Handle for configuring an existing foreign key.
    pub fn relationship(&mut self, foreign_key: ForeignKeyId) -> Result<RelationshipBuilder<'_>> {
        self.model.foreign_key_or_err(foreign_key)?;
        Ok(RelationshipBuilder::new(self, foreign_key))
    }
}

/// Configures one foreign key.
pub struct RelationshipBuilder<'a> {
    builder: &'a mut ModelBuilder,
    foreign_key: ForeignKeyId,
}

impl<'a> RelationshipBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ModelBuilder, foreign_key: ForeignKeyId) -> Self {
        Self {
            builder,
            foreign_key,
        }
    }

    /// Id of the configured foreign key.
    pub fn id(&self) -> ForeignKeyId {
        self.foreign_key
    }

    /// Current metadata of the foreign key.
    pub fn metadata(&self) -> Result<&ForeignKey> {
        self.builder.model.foreign_key_or_err(self.foreign_key)
    }

    /// Mark the relationship one-to-one or not.
    pub fn unique(&mut self, unique: bool, source: ConfigurationSource) -> Result<Option<bool>> {
        self.builder
            .set_foreign_key_unique(self.foreign_key, unique, source)
    }

    /// Mark the relationship as an ownership or not.
    pub fn ownership(
        &mut self,
        ownership: bool,
        source: ConfigurationSource,
    ) -> Result<Option<bool>> {
        self.builder
            .set_foreign_key_ownership(self.foreign_key, ownership, source)
    }

    /// Make the principal own the dependent one-to-one.
    ///
    /// Both flags are written at `source`; the call reports whether both
    /// writes were accepted, or `None` once a convention removed the foreign key.
    pub fn owned_one_to_one(&mut self, source: ConfigurationSource) -> Result<Option<bool>> {
        let Some(ownership) = self.ownership(true, source)? else {
            return Ok(None);
        };
        let Some(unique) = self.unique(true, source)? else {
            return Ok(None);
        };
        Ok(Some(ownership && unique))
    }

    /// Relational facets of this foreign key.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalNameBuilder<'_> {
        RelationalNameBuilder::new(
            self.builder,
            ElementRef::ForeignKey(self.foreign_key),
            source,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::convention::{CapabilitySet, Convention, ConventionSet};
    use crate::error::{ErrorKind, Result};
    use crate::model::{ForeignKeyId, PropertyType, ScalarType};
    use crate::source::ConfigurationSource::*;
    use crate::ModelBuilder;

    /// Drops every foreign key as soon as it becomes an ownership.
    struct DropOwned;

    impl Convention for DropOwned {
        fn name(&self) -> &str {
            "DropOwned"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::FOREIGN_KEY_OWNERSHIP_CHANGED
        }

        fn foreign_key_ownership_changed(
            &self,
            builder: &mut ModelBuilder,
            foreign_key: ForeignKeyId,
        ) -> Result<Option<ForeignKeyId>> {
            if builder.metadata().foreign_key(foreign_key).is_some_and(|fk| fk.is_ownership()) {
                builder.remove_foreign_key(foreign_key, Explicit)?;
                return Ok(None);
            }
            Ok(Some(foreign_key))
        }
    }

    fn two_owners() -> (ModelBuilder, [ForeignKeyId; 2]) {
        two_owners_with(ConventionSet::new())
    }

    fn two_owners_with(conventions: ConventionSet) -> (ModelBuilder, [ForeignKeyId; 2]) {
        let mut builder = ModelBuilder::new(conventions);
        let person = builder.add_entity_type("Person", Explicit).unwrap().unwrap();
        let company = builder.add_entity_type("Company", Explicit).unwrap().unwrap();
        let address = builder.add_entity_type("Address", Explicit).unwrap().unwrap();
        for name in ["PersonId", "CompanyId"] {
            builder
                .add_property(address, name, PropertyType::required(ScalarType::Int64), false, Explicit)
                .unwrap();
        }
        let a = builder
            .add_foreign_key(address, person, &["PersonId"], Explicit)
            .unwrap()
            .unwrap();
        let b = builder
            .add_foreign_key(address, company, &["CompanyId"], Explicit)
            .unwrap()
            .unwrap();
        (builder, [a, b])
    }

    #[test]
    fn test_second_ownership_rejected() {
        let (mut builder, [a, b]) = two_owners();
        assert_eq!(builder.set_foreign_key_ownership(a, true, Explicit).unwrap(), Some(true));
        let err = builder.set_foreign_key_ownership(b, true, Explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_remove_foreign_key() {
        let (mut builder, [a, _]) = two_owners();
        assert!(!builder.remove_foreign_key(a, Convention).unwrap());
        assert!(builder.remove_foreign_key(a, Explicit).unwrap());
        assert!(builder.metadata().foreign_key(a).is_none());

        let person = builder.metadata().find_entity_type("Person").unwrap();
        assert!(builder.metadata().referencing_foreign_keys(person).is_empty());
    }

    #[test]
    fn test_owned_one_to_one() {
        let (mut builder, [a, _]) = two_owners();
        let mut relationship = builder.relationship(a).unwrap();
        assert_eq!(relationship.owned_one_to_one(Convention).unwrap(), Some(true));
        assert!(relationship.metadata().unwrap().is_table_sharing());
    }

    #[test]
    fn test_configured_foreign_key_survives_weaker_removal() {
        let mut builder = ModelBuilder::new(ConventionSet::new());
        let person = builder.add_entity_type("Person", Explicit).unwrap().unwrap();
        let address = builder.add_entity_type("Address", Explicit).unwrap().unwrap();
        builder
            .add_property(address, "PersonId", PropertyType::required(ScalarType::Int64), false, Explicit)
            .unwrap();
        let fk = builder
            .add_foreign_key(address, person, &["PersonId"], Convention)
            .unwrap()
            .unwrap();
        builder.relationship(fk).unwrap().owned_one_to_one(Explicit).unwrap();

        assert!(!builder.remove_foreign_key(fk, Convention).unwrap());
        assert!(!builder.remove_foreign_key(fk, DataAnnotation).unwrap());
        assert!(builder.metadata().foreign_key(fk).is_some());
        assert!(builder.remove_foreign_key(fk, Explicit).unwrap());
    }

    #[test]
    fn test_removal_by_convention_reaches_caller() {
        let (mut builder, [a, b]) = two_owners_with(ConventionSet::new().with(DropOwned));

        assert_eq!(builder.set_foreign_key_ownership(a, true, Explicit).unwrap(), None);
        assert!(builder.metadata().foreign_key(a).is_none());

        let mut relationship = builder.relationship(b).unwrap();
        assert_eq!(relationship.owned_one_to_one(Explicit).unwrap(), None);
        assert!(builder.metadata().foreign_key(b).is_none());
    }
}
