//! Convention capabilities and the convention trait.

use crate::builder::ModelBuilder;
use crate::error::Result;
use crate::model::{ElementRef, EntityTypeId, ForeignKeyId, Value};

/// A kind of graph mutation a convention can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// An entity type was added.
    EntityTypeAdded,
    /// An annotation changed on the model.
    ModelAnnotationSet,
    /// An annotation changed on an entity type.
    EntityTypeAnnotationSet,
    /// An annotation changed on a property.
    PropertyAnnotationSet,
    /// An annotation changed on a key.
    KeyAnnotationSet,
    /// An annotation changed on an index.
    IndexAnnotationSet,
    /// An annotation changed on a foreign key.
    ForeignKeyAnnotationSet,
    /// A foreign key was added.
    ForeignKeyAdded,
    /// A foreign key was removed.
    ForeignKeyRemoved,
    /// A foreign key's ownership flag changed.
    ForeignKeyOwnershipChanged,
    /// A foreign key's uniqueness flag changed.
    ForeignKeyUniquenessChanged,
    /// An entity type's base type changed.
    BaseTypeChanged,
}

bitflags::bitflags! {
    /// A set of convention capabilities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilitySet: u32 {
        /// Entity type added.
        const ENTITY_TYPE_ADDED = 1 << 0;
        /// Model annotation set.
        const MODEL_ANNOTATION_SET = 1 << 1;
        /// Entity type annotation set.
        const ENTITY_TYPE_ANNOTATION_SET = 1 << 2;
        /// Property annotation set.
        const PROPERTY_ANNOTATION_SET = 1 << 3;
        /// Key annotation set.
        const KEY_ANNOTATION_SET = 1 << 4;
        /// Index annotation set.
        const INDEX_ANNOTATION_SET = 1 << 5;
        /// Foreign key annotation set.
        const FOREIGN_KEY_ANNOTATION_SET = 1 << 6;
        /// Foreign key added.
        const FOREIGN_KEY_ADDED = 1 << 7;
        /// Foreign key removed.
        const FOREIGN_KEY_REMOVED = 1 << 8;
        /// Foreign key ownership changed.
        const FOREIGN_KEY_OWNERSHIP_CHANGED = 1 << 9;
        /// Foreign key uniqueness changed.
        const FOREIGN_KEY_UNIQUENESS_CHANGED = 1 << 10;
        /// Base type changed.
        const BASE_TYPE_CHANGED = 1 << 11;
    }
}

impl Capability {
    /// Returns the bitflag for this capability.
    pub const fn as_set(self) -> CapabilitySet {
        match self {
            Self::EntityTypeAdded => CapabilitySet::ENTITY_TYPE_ADDED,
            Self::ModelAnnotationSet => CapabilitySet::MODEL_ANNOTATION_SET,
            Self::EntityTypeAnnotationSet => CapabilitySet::ENTITY_TYPE_ANNOTATION_SET,
            Self::PropertyAnnotationSet => CapabilitySet::PROPERTY_ANNOTATION_SET,
            Self::KeyAnnotationSet => CapabilitySet::KEY_ANNOTATION_SET,
            Self::IndexAnnotationSet => CapabilitySet::INDEX_ANNOTATION_SET,
            Self::ForeignKeyAnnotationSet => CapabilitySet::FOREIGN_KEY_ANNOTATION_SET,
            Self::ForeignKeyAdded => CapabilitySet::FOREIGN_KEY_ADDED,
            Self::ForeignKeyRemoved => CapabilitySet::FOREIGN_KEY_REMOVED,
            Self::ForeignKeyOwnershipChanged => CapabilitySet::FOREIGN_KEY_OWNERSHIP_CHANGED,
            Self::ForeignKeyUniquenessChanged => CapabilitySet::FOREIGN_KEY_UNIQUENESS_CHANGED,
            Self::BaseTypeChanged => CapabilitySet::BASE_TYPE_CHANGED,
        }
    }

    /// The annotation-set capability scoped to `element`.
    pub const fn annotation_set_for(element: &ElementRef) -> Capability {
        match element {
            ElementRef::Model => Self::ModelAnnotationSet,
            ElementRef::EntityType(_) => Self::EntityTypeAnnotationSet,
            ElementRef::Property(_) => Self::PropertyAnnotationSet,
            ElementRef::Key(_) => Self::KeyAnnotationSet,
            ElementRef::Index(_) => Self::IndexAnnotationSet,
            ElementRef::ForeignKey(_) => Self::ForeignKeyAnnotationSet,
        }
    }
}

impl From<Capability> for CapabilitySet {
    fn from(cap: Capability) -> Self {
        cap.as_set()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set |= cap.as_set();
        }
        set
    }
}

/// An annotation change delivered to conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationChange {
    /// Element carrying the annotation.
    pub element: ElementRef,
    /// Annotation name.
    pub name: String,
    /// New value, `None` when the annotation was removed.
    pub new_value: Option<Value>,
    /// Previous value, `None` when the annotation was created.
    pub old_value: Option<Value>,
}

/// A rule reacting to metadata graph mutations.
///
/// The dispatcher only calls the methods whose capability is present in
/// [`Convention::capabilities`]. Callbacks run synchronously inside the
/// mutating builder call and may mutate the graph further. Returning
/// `Ok(None)` reports that the element was removed; remaining conventions are
/// skipped for that mutation.
pub trait Convention: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Mutations this convention reacts to.
    fn capabilities(&self) -> CapabilitySet;

    /// An entity type was added.
    fn entity_type_added(
        &self,
        _builder: &mut ModelBuilder,
        entity: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        Ok(Some(entity))
    }

    /// An annotation was created, changed or removed.
    fn annotation_set(
        &self,
        _builder: &mut ModelBuilder,
        change: &AnnotationChange,
    ) -> Result<Option<ElementRef>> {
        Ok(Some(change.element))
    }

    /// A foreign key was added.
    fn foreign_key_added(
        &self,
        _builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        Ok(Some(foreign_key))
    }

    /// A foreign key declared on `declaring` was removed.
    fn foreign_key_removed(
        &self,
        _builder: &mut ModelBuilder,
        _declaring: EntityTypeId,
        _foreign_key: ForeignKeyId,
    ) -> Result<()> {
        Ok(())
    }

    /// A foreign key's ownership flag changed.
    fn foreign_key_ownership_changed(
        &self,
        _builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        Ok(Some(foreign_key))
    }

    /// A foreign key's uniqueness flag changed.
    fn foreign_key_uniqueness_changed(
        &self,
        _builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        Ok(Some(foreign_key))
    }

    /// An entity type's base type changed from `previous`.
    fn base_type_changed(
        &self,
        _builder: &mut ModelBuilder,
        entity: EntityTypeId,
        _previous: Option<EntityTypeId>,
    ) -> Result<Option<EntityTypeId>> {
        Ok(Some(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_from_iter() {
        let set: CapabilitySet = [Capability::EntityTypeAdded, Capability::ForeignKeyAdded]
            .into_iter()
            .collect();

        assert!(set.contains(CapabilitySet::ENTITY_TYPE_ADDED));
        assert!(set.contains(Capability::ForeignKeyAdded.into()));
        assert!(!set.contains(CapabilitySet::BASE_TYPE_CHANGED));
    }

    #[test]
    fn test_annotation_scope() {
        assert_eq!(
            Capability::annotation_set_for(&ElementRef::Model),
            Capability::ModelAnnotationSet
        );
        assert_eq!(
            Capability::annotation_set_for(&ElementRef::EntityType(EntityTypeId(0))),
            Capability::EntityTypeAnnotationSet
        );
    }
}
