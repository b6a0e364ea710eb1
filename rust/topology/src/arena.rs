// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index-stable storage with monotonic integer IDs.
//!
//! [`IdArena`] is the building block of every entity collection in the model
//! store. Entities live in an ordered map keyed by their ID newtype, so
//! iteration is always in ascending ID order and every algorithm that walks
//! the store is deterministic.
//!
//! ## ID allocation
//!
//! IDs are allocated from a per-arena counter that only ever grows. Removing
//! an entity does not free its ID, and inserting at an explicit ID moves the
//! counter past it. Modifiers that mutate while they walk take a snapshot of
//! the IDs first ([`IdArena::ids`]) and re-check membership before touching
//! an entry, so removals during a pass never invalidate anything.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::keys::EntityId;

/// Ordered entity storage with monotonic ID allocation.
///
/// # Example
///
/// ```
/// use beamheal_topology::arena::IdArena;
/// use beamheal_topology::NodeId;
///
/// let mut arena: IdArena<NodeId, &str> = IdArena::new();
/// let a = arena.insert_new("a");
/// let b = arena.insert_new("b");
/// arena.remove(a);
/// let c = arena.insert_new("c");
///
/// assert_eq!(a.get(), 1);
/// assert_eq!(b.get(), 2);
/// assert_eq!(c.get(), 3); // never recycled
/// ```
#[derive(Debug, Clone)]
pub struct IdArena<K: EntityId, V> {
    items: BTreeMap<K, V>,
    next_id: u32,
}

impl<K: EntityId, V> IdArena<K, V> {
    /// Creates an empty arena allocating from ID 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an empty arena allocating from `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: first,
        }
    }

    /// Stores `value` under the next free ID and returns that ID.
    pub fn insert_new(&mut self, value: V) -> K {
        let id = K::from(self.next_id);
        self.next_id += 1;
        self.items.insert(id, value);
        id
    }

    /// Stores `value` under `id`, replacing and returning any previous value.
    pub fn insert_with_id(&mut self, id: K, value: V) -> Option<V> {
        let raw: u32 = id.into();
        if raw >= self.next_id {
            self.next_id = raw + 1;
        }
        self.items.insert(id, value)
    }

    /// Removes the entity with `id`, returning its value.
    pub fn remove(&mut self, id: K) -> Option<V> {
        self.items.remove(&id)
    }

    /// Returns the value for `id`, or `None` if not present.
    pub fn get(&self, id: K) -> Option<&V> {
        self.items.get(&id)
    }

    /// Returns a mutable reference to the value for `id`.
    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.items.get_mut(&id)
    }

    /// Returns the value for `id`, or a [`Error::NotFound`] naming it.
    pub fn try_get(&self, id: K) -> Result<&V> {
        self.items.get(&id).ok_or(Error::NotFound(id.key()))
    }

    /// Returns `true` if an entity with `id` exists.
    pub fn contains(&self, id: K) -> bool {
        self.items.contains_key(&id)
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena holds no entities.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns a snapshot of all IDs in ascending order.
    pub fn ids(&self) -> Vec<K> {
        self.items.keys().copied().collect()
    }

    /// Iterates `(id, value)` pairs in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.items.iter().map(|(&id, v)| (id, v))
    }

    /// Iterates values in ascending ID order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.items.values()
    }

    /// Returns the ID the next [`insert_new`](Self::insert_new) will use.
    pub fn peek_next_id(&self) -> K {
        K::from(self.next_id)
    }

    /// Removes every entity. The ID counter is left untouched.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<K: EntityId, V> Default for IdArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{ElementId, EntityKey, RigidId, RIGID_ID_BASE};

    #[test]
    fn new_arena_is_empty() {
        let arena: IdArena<ElementId, u8> = IdArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.peek_next_id(), ElementId::new(1));
    }

    #[test]
    fn ids_are_monotonic_after_removal() {
        let mut arena: IdArena<ElementId, u8> = IdArena::new();
        let a = arena.insert_new(1);
        arena.remove(a);
        let b = arena.insert_new(2);
        assert_eq!(b, ElementId::new(2));
        assert!(!arena.contains(a));
    }

    #[test]
    fn insert_with_id_bumps_counter() {
        let mut arena: IdArena<ElementId, u8> = IdArena::new();
        assert!(arena.insert_with_id(ElementId::new(10), 1).is_none());
        assert_eq!(arena.insert_new(2), ElementId::new(11));

        // Overwriting keeps the counter and returns the old value.
        assert_eq!(arena.insert_with_id(ElementId::new(10), 3), Some(1));
        assert_eq!(arena.get(ElementId::new(10)), Some(&3));
        assert_eq!(arena.peek_next_id(), ElementId::new(12));
    }

    #[test]
    fn insert_below_counter_does_not_rewind() {
        let mut arena: IdArena<ElementId, u8> = IdArena::new();
        arena.insert_new(0);
        arena.insert_new(0);
        arena.insert_with_id(ElementId::new(1), 9);
        assert_eq!(arena.peek_next_id(), ElementId::new(3));
    }

    #[test]
    fn iteration_is_ordered() {
        let mut arena: IdArena<ElementId, &str> = IdArena::new();
        arena.insert_with_id(ElementId::new(5), "five");
        arena.insert_with_id(ElementId::new(2), "two");
        arena.insert_with_id(ElementId::new(9), "nine");
        let ids: Vec<u32> = arena.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(arena.ids().len(), 3);
    }

    #[test]
    fn try_get_reports_missing_key() {
        let arena: IdArena<ElementId, u8> = IdArena::new();
        match arena.try_get(ElementId::new(4)) {
            Err(Error::NotFound(key)) => assert_eq!(key, EntityKey::Element(ElementId::new(4))),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn custom_start() {
        let mut arena: IdArena<RigidId, ()> = IdArena::starting_at(RIGID_ID_BASE);
        assert_eq!(arena.insert_new(()), RigidId::new(9_000_001));
        assert_eq!(arena.insert_new(()), RigidId::new(9_000_002));
    }
}
