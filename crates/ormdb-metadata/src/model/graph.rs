//! The metadata graph.

use super::annotation::Annotations;
use super::arena::{Arena, EntityTypeId, ForeignKeyId, IndexId, KeyId, PropertyId};
use super::entity::EntityType;
use super::foreign_key::ForeignKey;
use super::key::{Index, Key};
use super::property::Property;
use crate::error::{MetadataError, Result};
use crate::source::ConfigurationSource;
use serde::{Deserialize, Serialize};

/// Reference to any annotatable element of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementRef {
    /// The model itself.
    Model,
    /// An entity type.
    EntityType(EntityTypeId),
    /// A property.
    Property(PropertyId),
    /// A key.
    Key(KeyId),
    /// An index.
    Index(IndexId),
    /// A foreign key.
    ForeignKey(ForeignKeyId),
}

/// The object-relational mapping model under construction.
///
/// Elements live in typed arenas; the referencing-foreign-key view of an
/// entity type is derived from the declared forward lists on demand.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) entity_types: Arena<EntityTypeId, EntityType>,
    pub(crate) properties: Arena<PropertyId, Property>,
    pub(crate) keys: Arena<KeyId, Key>,
    pub(crate) indexes: Arena<IndexId, Index>,
    pub(crate) foreign_keys: Arena<ForeignKeyId, ForeignKey>,
    pub(crate) annotations: Annotations,
    pub(crate) provider_prefix: Option<String>,
    pub(crate) read_only: bool,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider annotation prefix the model reads first, if any.
    pub fn provider_prefix(&self) -> Option<&str> {
        self.provider_prefix.as_deref()
    }

    /// Whether the model has been finalized.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Model-level annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Get an entity type.
    pub fn entity_type(&self, id: EntityTypeId) -> Option<&EntityType> {
        self.entity_types.get(id)
    }

    /// Find an entity type by name.
    pub fn find_entity_type(&self, name: &str) -> Option<EntityTypeId> {
        self.entity_types
            .iter()
            .find(|(_, entity)| entity.name == name)
            .map(|(id, _)| id)
    }

    /// All entity types in insertion order.
    pub fn entity_types(&self) -> impl Iterator<Item = (EntityTypeId, &EntityType)> {
        self.entity_types.iter()
    }

    /// Get a property.
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Find a property declared on `entity` or inherited from its base types.
    pub fn find_property(&self, entity: EntityTypeId, name: &str) -> Option<PropertyId> {
        let mut current = Some(entity);
        while let Some(id) = current {
            if let Some(found) = self.find_declared_property(id, name) {
                return Some(found);
            }
            current = self.entity_types.get(id)?.base_type();
        }
        None
    }

    /// Find a property declared directly on `entity`.
    pub fn find_declared_property(&self, entity: EntityTypeId, name: &str) -> Option<PropertyId> {
        self.entity_types
            .get(entity)?
            .properties
            .iter()
            .copied()
            .find(|id| self.properties.get(*id).is_some_and(|p| p.name == name))
    }

    /// Get a key.
    pub fn key(&self, id: KeyId) -> Option<&Key> {
        self.keys.get(id)
    }

    /// Get an index.
    pub fn index(&self, id: IndexId) -> Option<&Index> {
        self.indexes.get(id)
    }

    /// Get a foreign key.
    pub fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey> {
        self.foreign_keys.get(id)
    }

    /// Foreign keys whose principal is `entity`.
    pub fn referencing_foreign_keys(&self, entity: EntityTypeId) -> Vec<ForeignKeyId> {
        self.entity_types
            .iter()
            .flat_map(|(_, e)| e.foreign_keys.iter().copied())
            .filter(|fk| {
                self.foreign_keys
                    .get(*fk)
                    .is_some_and(|fk| fk.principal == entity)
            })
            .collect()
    }

    /// Direct derived types of `entity`.
    pub fn derived_types(&self, entity: EntityTypeId) -> Vec<EntityTypeId> {
        self.entity_types
            .iter()
            .filter(|(_, e)| e.base_type() == Some(entity))
            .map(|(id, _)| id)
            .collect()
    }

    /// `entity` followed by all of its transitive derived types.
    pub fn hierarchy(&self, root: EntityTypeId) -> Vec<EntityTypeId> {
        let mut members = vec![root];
        let mut next = 0;
        while next < members.len() {
            let derived = self.derived_types(members[next]);
            members.extend(derived);
            next += 1;
        }
        members
    }

    /// Root of the inheritance hierarchy containing `entity`.
    pub fn root_type(&self, entity: EntityTypeId) -> EntityTypeId {
        let mut current = entity;
        while let Some(base) = self.entity_types.get(current).and_then(EntityType::base_type) {
            current = base;
        }
        current
    }

    /// Whether `entity` is `ancestor` or derives from it.
    pub fn is_same_or_derived(&self, entity: EntityTypeId, ancestor: EntityTypeId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entity_types.get(id).and_then(EntityType::base_type);
        }
        false
    }

    /// The single ownership foreign key that makes `entity` share its owner's table.
    ///
    /// More than one such foreign key is a configuration conflict.
    pub fn table_sharing_ownership(&self, entity: EntityTypeId) -> Result<Option<ForeignKeyId>> {
        let entity_type = self.entity_type_or_err(entity)?;
        let candidates: Vec<ForeignKeyId> = entity_type
            .foreign_keys
            .iter()
            .copied()
            .filter(|id| {
                self.foreign_keys
                    .get(*id)
                    .is_some_and(ForeignKey::is_table_sharing)
            })
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            many => Err(MetadataError::MultipleOwnerships {
                entity: entity_type.name.clone(),
                count: many.len(),
            }),
        }
    }

    /// Strongest source recorded anywhere on an element.
    ///
    /// Covers the source that added the element, every configured facet and
    /// every annotation, cleared ones included. `None` for a missing element.
    pub fn strongest_source(&self, element: ElementRef) -> Option<ConfigurationSource> {
        let recorded: Vec<Option<ConfigurationSource>> = match element {
            ElementRef::Model => Vec::new(),
            ElementRef::EntityType(id) => {
                let entity = self.entity_types.get(id)?;
                let mut recorded = vec![Some(entity.source), entity.base_type.source];
                recorded.extend(entity.ignored.values().copied().map(Some));
                recorded
            }
            ElementRef::Property(id) => {
                let property = self.properties.get(id)?;
                vec![Some(property.source), property.property_type.source]
            }
            ElementRef::Key(id) => vec![Some(self.keys.get(id)?.source)],
            ElementRef::Index(id) => {
                let index = self.indexes.get(id)?;
                vec![Some(index.source), index.is_unique.source]
            }
            ElementRef::ForeignKey(id) => {
                let fk = self.foreign_keys.get(id)?;
                vec![Some(fk.source), fk.is_unique.source, fk.is_ownership.source]
            }
        };
        let annotations = self
            .annotations_of(element)
            .and_then(Annotations::strongest_source);
        recorded.into_iter().flatten().chain(annotations).max()
    }

    /// Check whether an element id still resolves.
    pub fn contains(&self, element: ElementRef) -> bool {
        self.annotations_of(element).is_some()
    }

    /// Annotations of an element.
    pub fn annotations_of(&self, element: ElementRef) -> Option<&Annotations> {
        match element {
            ElementRef::Model => Some(&self.annotations),
            ElementRef::EntityType(id) => self.entity_types.get(id).map(|e| &e.annotations),
            ElementRef::Property(id) => self.properties.get(id).map(|p| &p.annotations),
            ElementRef::Key(id) => self.keys.get(id).map(|k| &k.annotations),
            ElementRef::Index(id) => self.indexes.get(id).map(|i| &i.annotations),
            ElementRef::ForeignKey(id) => self.foreign_keys.get(id).map(|fk| &fk.annotations),
        }
    }

    pub(crate) fn annotations_of_mut(&mut self, element: ElementRef) -> Option<&mut Annotations> {
        match element {
            ElementRef::Model => Some(&mut self.annotations),
            ElementRef::EntityType(id) => {
                self.entity_types.get_mut(id).map(|e| &mut e.annotations)
            }
            ElementRef::Property(id) => self.properties.get_mut(id).map(|p| &mut p.annotations),
            ElementRef::Key(id) => self.keys.get_mut(id).map(|k| &mut k.annotations),
            ElementRef::Index(id) => self.indexes.get_mut(id).map(|i| &mut i.annotations),
            ElementRef::ForeignKey(id) => {
                self.foreign_keys.get_mut(id).map(|fk| &mut fk.annotations)
            }
        }
    }

    /// Human-readable name of an element, used in errors and logs.
    pub fn display_name(&self, element: ElementRef) -> String {
        match element {
            ElementRef::Model => "model".to_string(),
            ElementRef::EntityType(id) => self.entity_name(id),
            ElementRef::Property(id) => match self.properties.get(id) {
                Some(p) => format!("{}.{}", self.entity_name(p.declaring), p.name),
                None => format!("property #{}", id.index()),
            },
            ElementRef::Key(id) => match self.keys.get(id) {
                Some(k) => format!(
                    "key {}({})",
                    self.entity_name(k.declaring),
                    self.property_names(&k.properties).join(", ")
                ),
                None => format!("key #{}", id.index()),
            },
            ElementRef::Index(id) => match self.indexes.get(id) {
                Some(i) => format!(
                    "index {}({})",
                    self.entity_name(i.declaring),
                    self.property_names(&i.properties).join(", ")
                ),
                None => format!("index #{}", id.index()),
            },
            ElementRef::ForeignKey(id) => match self.foreign_keys.get(id) {
                Some(fk) => format!(
                    "foreign key {}({}) -> {}",
                    self.entity_name(fk.declaring),
                    self.property_names(&fk.properties).join(", "),
                    self.entity_name(fk.principal)
                ),
                None => format!("foreign key #{}", id.index()),
            },
        }
    }

    pub(crate) fn entity_name(&self, id: EntityTypeId) -> String {
        self.entity_types
            .get(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| format!("entity type #{}", id.index()))
    }

    pub(crate) fn property_names(&self, ids: &[PropertyId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.properties.get(*id).map(|p| p.name.clone()))
            .collect()
    }

    pub(crate) fn entity_type_or_err(&self, id: EntityTypeId) -> Result<&EntityType> {
        self.entity_types
            .get(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("entity type #{}", id.index()),
            })
    }

    pub(crate) fn entity_type_mut(&mut self, id: EntityTypeId) -> Result<&mut EntityType> {
        self.entity_types
            .get_mut(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("entity type #{}", id.index()),
            })
    }

    pub(crate) fn foreign_key_or_err(&self, id: ForeignKeyId) -> Result<&ForeignKey> {
        self.foreign_keys
            .get(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("foreign key #{}", id.index()),
            })
    }

    pub(crate) fn foreign_key_mut(&mut self, id: ForeignKeyId) -> Result<&mut ForeignKey> {
        self.foreign_keys
            .get_mut(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("foreign key #{}", id.index()),
            })
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> Result<&mut Property> {
        self.properties
            .get_mut(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("property #{}", id.index()),
            })
    }

    pub(crate) fn property_or_err(&self, id: PropertyId) -> Result<&Property> {
        self.properties
            .get(id)
            .ok_or_else(|| MetadataError::ElementNotFound {
                element: format!("property #{}", id.index()),
            })
    }

    /// Elements still using a property, for removal checks.
    pub(crate) fn property_users(&self, property: PropertyId) -> Option<ElementRef> {
        if let Some((id, _)) = self
            .keys
            .iter()
            .find(|(_, k)| k.properties.contains(&property))
        {
            return Some(ElementRef::Key(id));
        }
        if let Some((id, _)) = self
            .indexes
            .iter()
            .find(|(_, i)| i.properties.contains(&property))
        {
            return Some(ElementRef::Index(id));
        }
        self.foreign_keys
            .iter()
            .find(|(_, fk)| fk.properties.contains(&property))
            .map(|(id, _)| ElementRef::ForeignKey(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyType, ScalarType};
    use crate::source::{ConfigurationSource, Tracked};

    fn entity(model: &mut Model, name: &str, base: Option<EntityTypeId>) -> EntityTypeId {
        let mut entity = EntityType::new(name, ConfigurationSource::Explicit);
        entity.base_type = Tracked::new(base, ConfigurationSource::Explicit);
        model.entity_types.insert(entity)
    }

    #[test]
    fn test_hierarchy_queries() {
        let mut model = Model::new();
        let animal = entity(&mut model, "Animal", None);
        let dog = entity(&mut model, "Dog", Some(animal));
        let puppy = entity(&mut model, "Puppy", Some(dog));
        let rock = entity(&mut model, "Rock", None);

        assert_eq!(model.root_type(puppy), animal);
        assert!(model.is_same_or_derived(puppy, animal));
        assert!(!model.is_same_or_derived(rock, animal));
        assert_eq!(model.hierarchy(animal), vec![animal, dog, puppy]);
        assert_eq!(model.find_entity_type("Dog"), Some(dog));
    }

    #[test]
    fn test_find_inherited_property() {
        let mut model = Model::new();
        let animal = entity(&mut model, "Animal", None);
        let dog = entity(&mut model, "Dog", Some(animal));
        let kind = model.properties.insert(Property::new(
            "Kind",
            animal,
            PropertyType::required(ScalarType::String),
            true,
            ConfigurationSource::Convention,
        ));
        model.entity_types.get_mut(animal).unwrap().properties.push(kind);

        assert_eq!(model.find_property(dog, "Kind"), Some(kind));
        assert_eq!(model.find_property(dog, "Name"), None);
        assert_eq!(model.display_name(ElementRef::Property(kind)), "Animal.Kind");
    }

    #[test]
    fn test_referencing_foreign_keys() {
        let mut model = Model::new();
        let person = entity(&mut model, "Person", None);
        let address = entity(&mut model, "Address", None);
        let fk = model.foreign_keys.insert(ForeignKey::new(
            address,
            person,
            Vec::new(),
            None,
            ConfigurationSource::Explicit,
        ));
        model.entity_types.get_mut(address).unwrap().foreign_keys.push(fk);

        assert_eq!(model.referencing_foreign_keys(person), vec![fk]);
        assert!(model.referencing_foreign_keys(address).is_empty());
        assert_eq!(model.table_sharing_ownership(address).unwrap(), None);
    }

    #[test]
    fn test_strongest_source_covers_facets() {
        let mut model = Model::new();
        let person = entity(&mut model, "Person", None);
        let address = entity(&mut model, "Address", None);
        let fk = model.foreign_keys.insert(ForeignKey::new(
            address,
            person,
            Vec::new(),
            None,
            ConfigurationSource::Convention,
        ));
        let element = ElementRef::ForeignKey(fk);
        assert_eq!(model.strongest_source(element), Some(ConfigurationSource::Convention));

        model.foreign_keys.get_mut(fk).unwrap().is_ownership =
            Tracked::new(true, ConfigurationSource::DataAnnotation);
        assert_eq!(model.strongest_source(element), Some(ConfigurationSource::DataAnnotation));

        model.annotations_of_mut(element).unwrap().set(
            "Relational:Name",
            None,
            ConfigurationSource::Explicit,
        );
        assert_eq!(model.strongest_source(element), Some(ConfigurationSource::Explicit));
        assert_eq!(model.strongest_source(ElementRef::ForeignKey(ForeignKeyId::from(99))), None);
    }
}
