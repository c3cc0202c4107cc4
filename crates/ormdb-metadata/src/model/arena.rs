//! Typed arenas holding metadata elements.
//!
//! Elements refer to each other through copyable ids instead of pointers.
//! Removed slots stay vacant so ids are never reused within one model.

use serde::{Deserialize, Serialize};

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw slot index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

element_id!(
    /// Id of an entity type.
    EntityTypeId
);
element_id!(
    /// Id of a property.
    PropertyId
);
element_id!(
    /// Id of a key.
    KeyId
);
element_id!(
    /// Id of an index.
    IndexId
);
element_id!(
    /// Id of a foreign key.
    ForeignKeyId
);

/// Slot storage for one element kind.
#[derive(Debug, Clone)]
pub struct Arena<I, T> {
    slots: Vec<Option<T>>,
    _id: std::marker::PhantomData<I>,
}

impl<I, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            _id: std::marker::PhantomData,
        }
    }
}

impl<I, T> Arena<I, T>
where
    I: Copy + From<usize> + Into<usize>,
{
    /// Store an element and return its id.
    pub fn insert(&mut self, element: T) -> I {
        self.slots.push(Some(element));
        I::from(self.slots.len() - 1)
    }

    /// Look up a live element.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.into()).and_then(Option::as_ref)
    }

    /// Look up a live element mutably.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.into()).and_then(Option::as_mut)
    }

    /// Vacate a slot, returning the element that lived there.
    pub fn remove(&mut self, id: I) -> Option<T> {
        self.slots.get_mut(id.into()).and_then(Option::take)
    }

    /// Check whether the id still resolves.
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Iterate live elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|element| (I::from(index), element)))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check whether no element is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! id_into_usize {
    ($($name:ident),*) => {
        $(impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.index()
            }
        })*
    };
}

id_into_usize!(EntityTypeId, PropertyId, KeyId, IndexId, ForeignKeyId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_insert_remove() {
        let mut arena: Arena<KeyId, &str> = Arena::default();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);

        // Vacated slots are not reused.
        let c = arena.insert("c");
        assert_ne!(c, a);
        assert_eq!(arena.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![b, c]);
    }
}
