//! Key and index configuration.

use super::model_builder::ModelBuilder;
use crate::error::{MetadataError, Result};
use crate::model::{ElementRef, EntityTypeId, Index, IndexId, Key, KeyId};
use crate::relational::RelationalNameBuilder;
use crate::source::{ConfigurationSource, Tracked};
use tracing::trace;

impl ModelBuilder {
    /// Add a key over the named properties, or return the matching one.
    pub fn add_key(
        &mut self,
        entity: EntityTypeId,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<KeyId>> {
        self.ensure_mutable()?;
        let properties = self.resolve_properties(entity, properties)?;
        let existing = self
            .model
            .entity_type_or_err(entity)?
            .keys
            .iter()
            .copied()
            .find(|id| self.model.keys.get(*id).is_some_and(|k| k.properties == properties));

        if let Some(id) = existing {
            if let Some(key) = self.model.keys.get_mut(id) {
                key.source = key.source.max(source);
            }
            return Ok(Some(id));
        }

        let id = self.model.keys.insert(Key::new(entity, properties, source));
        self.model.entity_type_mut(entity)?.keys.push(id);
        trace!(key = %self.model.display_name(ElementRef::Key(id)), %source, "key added");
        Ok(Some(id))
    }

    /// Remove a key no foreign key targets.
    pub fn remove_key(&mut self, key: KeyId, source: ConfigurationSource) -> Result<bool> {
        self.ensure_mutable()?;
        let existing = self
            .model
            .keys
            .get(key)
            .ok_or_else(|| self.element_not_found(ElementRef::Key(key)))?;
        if !source.overrides(self.model.strongest_source(ElementRef::Key(key)), true) {
            return Ok(false);
        }
        if let Some((fk, _)) = self
            .model
            .foreign_keys
            .iter()
            .find(|(_, fk)| fk.principal_key == Some(key))
        {
            return Err(MetadataError::ElementInUse {
                element: self.model.display_name(ElementRef::Key(key)),
                used_by: self.model.display_name(ElementRef::ForeignKey(fk)),
            });
        }

        let declaring = existing.declaring;
        self.model.keys.remove(key);
        if let Some(entity) = self.model.entity_types.get_mut(declaring) {
            entity.keys.retain(|id| *id != key);
        }
        Ok(true)
    }

    /// Add an index over the named properties, or return the matching one.
    pub fn add_index(
        &mut self,
        entity: EntityTypeId,
        properties: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<IndexId>> {
        self.ensure_mutable()?;
        let properties = self.resolve_properties(entity, properties)?;
        let existing = self
            .model
            .entity_type_or_err(entity)?
            .indexes
            .iter()
            .copied()
            .find(|id| self.model.indexes.get(*id).is_some_and(|i| i.properties == properties));

        if let Some(id) = existing {
            if let Some(index) = self.model.indexes.get_mut(id) {
                index.source = index.source.max(source);
            }
            return Ok(Some(id));
        }

        let id = self.model.indexes.insert(Index::new(entity, properties, source));
        self.model.entity_type_mut(entity)?.indexes.push(id);
        trace!(index = %self.model.display_name(ElementRef::Index(id)), %source, "index added");
        Ok(Some(id))
    }

    /// Remove an index.
    ///
    /// Returns `Ok(false)` when a stronger source added or configured it.
    pub fn remove_index(&mut self, index: IndexId, source: ConfigurationSource) -> Result<bool> {
        self.ensure_mutable()?;
        let existing = self
            .model
            .indexes
            .get(index)
            .ok_or_else(|| self.element_not_found(ElementRef::Index(index)))?;
        if !source.overrides(self.model.strongest_source(ElementRef::Index(index)), true) {
            return Ok(false);
        }

        let declaring = existing.declaring;
        self.model.indexes.remove(index);
        if let Some(entity) = self.model.entity_types.get_mut(declaring) {
            entity.indexes.retain(|id| *id != index);
        }
        Ok(true)
    }

    /// Mark an index unique or not.
    pub fn set_index_unique(
        &mut self,
        index: IndexId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.ensure_mutable()?;
        let allow_same_source = self.allow_same_source();
        let existing = self
            .model
            .indexes
            .get_mut(index)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("index #{}", index.index()),
            })?;
        let current = existing.is_unique.clone();
        if !source.accepts(current.source, current.value == unique, allow_same_source) {
            return Ok(false);
        }
        existing.is_unique = Tracked::new(unique, source.max_with(current.source));
        Ok(true)
    }
}

/// Configures one key.
pub struct KeyBuilder<'a> {
    builder: &'a mut ModelBuilder,
    key: KeyId,
}

impl<'a> KeyBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ModelBuilder, key: KeyId) -> Self {
        Self { builder, key }
    }

    /// Id of the configured key.
    pub fn id(&self) -> KeyId {
        self.key
    }

    /// Relational facets of this key.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalNameBuilder<'_> {
        RelationalNameBuilder::new(self.builder, ElementRef::Key(self.key), source)
    }
}

/// Configures one index.
pub struct IndexBuilder<'a> {
    builder: &'a mut ModelBuilder,
    index: IndexId,
}

impl<'a> IndexBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ModelBuilder, index: IndexId) -> Self {
        Self { builder, index }
    }

    /// Id of the configured index.
    pub fn id(&self) -> IndexId {
        self.index
    }

    /// Mark the index unique or not.
    pub fn unique(&mut self, unique: bool, source: ConfigurationSource) -> Result<bool> {
        self.builder.set_index_unique(self.index, unique, source)
    }

    /// Relational facets of this index.
    pub fn relational(&mut self, source: ConfigurationSource) -> RelationalNameBuilder<'_> {
        RelationalNameBuilder::new(self.builder, ElementRef::Index(self.index), source)
    }
}
