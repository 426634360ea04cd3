//! Ordered entity storage.
//!
//! Records are kept in insertion order, which is also iteration and
//! collision-check order. Ids are assigned from a counter shared by all
//! collections and never reused, so a handle held across compaction
//! either still resolves to the same record or resolves to nothing.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Particle, Projectile, Unit};

/// Records that can live in [`EntityStorage`].
pub trait Stored {
    /// Storage handle of this record.
    fn id(&self) -> EntityId;

    /// Assign the storage handle. Called once, on insert.
    fn set_id(&mut self, id: EntityId);
}

impl Stored for Unit {
    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Stored for Projectile {
    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Stored for Particle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

/// Source of entity ids shared across collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdAllocator {
    next_id: EntityId,
}

impl IdAllocator {
    /// Create an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Insertion-ordered collection of one record type.
///
/// Ids in storage order are strictly increasing, so lookup by id is a
/// binary search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityStorage<T> {
    items: Vec<T>,
}

impl<T: Stored> EntityStorage<T> {
    /// Create empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a record, assigning it a fresh id.
    pub fn insert(&mut self, ids: &mut IdAllocator, mut item: T) -> EntityId {
        let id = ids.allocate();
        item.set_id(id);
        self.items.push(item);
        id
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.items.binary_search_by_key(&id, Stored::id).ok()
    }

    /// Get a record by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.index_of(id).map(|index| &self.items[index])
    }

    /// Get a mutable record by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.index_of(id).map(move |index| &mut self.items[index])
    }

    /// Check if an id resolves.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of records, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids in storage order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(Stored::id).collect()
    }

    /// Iterate in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate mutably in storage order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Records as a slice, in storage order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Drop every record failing `keep`, preserving the order of the rest.
    ///
    /// Returns the ids that were removed.
    pub fn compact<F>(&mut self, mut keep: F) -> Vec<EntityId>
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        self.items.retain(|item| {
            let kept = keep(item);
            if !kept {
                removed.push(item.id());
            }
            kept
        });
        removed
    }
}

impl<T: Stored> Default for EntityStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a EntityStorage<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
