// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node storage with exact-coordinate lookup.
//!
//! Elements reference nodes by ID, never by value, so relocating a node with
//! [`Nodes::add_with_id`] moves every element attached to it. A side table
//! keyed by the coordinate bit pattern backs [`Nodes::add_or_get`]. It lists
//! every node at a coordinate in arrival order, so removing one hands the
//! lookup to the next without a scan.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::arena::IdArena;
use crate::error::Result;
use crate::keys::NodeId;

type CoordKey = (u64, u64, u64);

/// `-0.0 + 0.0` is `+0.0`, so both zeros share one key.
fn coord_key(p: &Point3<f64>) -> CoordKey {
    (
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    )
}

/// All nodes of a model.
#[derive(Debug, Clone, Default)]
pub struct Nodes {
    arena: IdArena<NodeId, Point3<f64>>,
    by_coord: FxHashMap<CoordKey, Vec<NodeId>>,
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node at exactly `p`, creating one if none exists.
    pub fn add_or_get(&mut self, p: Point3<f64>) -> NodeId {
        if let Some(id) = self.find_at(&p) {
            return id;
        }
        self.add_new(p)
    }

    /// Creates a new node at `p` even if another node already sits there.
    pub fn add_new(&mut self, p: Point3<f64>) -> NodeId {
        let id = self.arena.insert_new(p);
        self.link_coord(id, &p);
        id
    }

    /// Stores `p` under `id`, relocating the node if it already exists.
    pub fn add_with_id(&mut self, id: NodeId, p: Point3<f64>) {
        if let Some(old) = self.arena.insert_with_id(id, p) {
            self.unlink_coord(id, &old);
        }
        self.link_coord(id, &p);
    }

    /// Removes a node, returning its last position.
    pub fn remove(&mut self, id: NodeId) -> Option<Point3<f64>> {
        let old = self.arena.remove(id)?;
        self.unlink_coord(id, &old);
        Some(old)
    }

    fn link_coord(&mut self, id: NodeId, p: &Point3<f64>) {
        self.by_coord.entry(coord_key(p)).or_default().push(id);
    }

    /// Drops `id` from the coordinate entry at `old`.
    fn unlink_coord(&mut self, id: NodeId, old: &Point3<f64>) {
        let key = coord_key(old);
        let Some(twins) = self.by_coord.get_mut(&key) else {
            return;
        };
        twins.retain(|&other| other != id);
        if twins.is_empty() {
            self.by_coord.remove(&key);
        }
    }

    /// Returns the node at exactly `p`, if any.
    pub fn find_at(&self, p: &Point3<f64>) -> Option<NodeId> {
        self.by_coord
            .get(&coord_key(p))
            .and_then(|twins| twins.first())
            .copied()
    }

    pub fn get(&self, id: NodeId) -> Option<Point3<f64>> {
        self.arena.get(id).copied()
    }

    /// Returns the position of `id`, or a not-found error.
    pub fn try_get(&self, id: NodeId) -> Result<Point3<f64>> {
        self.arena.try_get(id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Snapshot of all node IDs, ascending.
    pub fn ids(&self) -> Vec<NodeId> {
        self.arena.ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Point3<f64>)> + '_ {
        self.arena.iter().map(|(id, p)| (id, *p))
    }

    /// ID the next new node will receive.
    pub fn peek_next_id(&self) -> NodeId {
        self.arena.peek_next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_or_get_reuses_exact_coordinates() {
        let mut nodes = Nodes::new();
        let a = nodes.add_or_get(Point3::new(1.0, 2.0, 3.0));
        let b = nodes.add_or_get(Point3::new(1.0, 2.0, 3.0));
        let c = nodes.add_or_get(Point3::new(1.0, 2.0, 3.0000001));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn signed_zero_is_one_coordinate() {
        let mut nodes = Nodes::new();
        let a = nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = nodes.add_or_get(Point3::new(-0.0, 0.0, -0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn relocation_updates_lookup() {
        let mut nodes = Nodes::new();
        let a = nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        nodes.add_with_id(a, Point3::new(5.0, 0.0, 0.0));

        assert_eq!(nodes.find_at(&Point3::new(0.0, 0.0, 0.0)), None);
        assert_eq!(nodes.find_at(&Point3::new(5.0, 0.0, 0.0)), Some(a));
        assert_eq!(nodes.get(a), Some(Point3::new(5.0, 0.0, 0.0)));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn remove_hands_lookup_to_twin() {
        let mut nodes = Nodes::new();
        let p = Point3::new(3.0, 3.0, 3.0);
        let a = nodes.add_or_get(p);
        let b = nodes.add_new(p);
        assert_ne!(a, b);
        assert_eq!(nodes.find_at(&p), Some(a));

        nodes.remove(a);
        assert_eq!(nodes.find_at(&p), Some(b));
        nodes.remove(b);
        assert_eq!(nodes.find_at(&p), None);
        assert!(nodes.is_empty());
    }

    #[test]
    fn relocating_twin_keeps_the_other_findable() {
        let mut nodes = Nodes::new();
        let p = Point3::new(1.0, 1.0, 1.0);
        let a = nodes.add_or_get(p);
        let b = nodes.add_new(p);
        let c = nodes.add_new(p);

        nodes.add_with_id(a, Point3::new(9.0, 9.0, 9.0));
        assert_eq!(nodes.find_at(&p), Some(b));
        nodes.remove(b);
        assert_eq!(nodes.find_at(&p), Some(c));
        assert_eq!(nodes.add_or_get(p), c);
    }

    #[test]
    fn ids_are_not_recycled() {
        let mut nodes = Nodes::new();
        let a = nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        nodes.remove(a);
        let b = nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(b, NodeId::new(2));
    }

    #[test]
    fn explicit_id_moves_counter() {
        let mut nodes = Nodes::new();
        nodes.add_with_id(NodeId::new(100), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(nodes.peek_next_id(), NodeId::new(101));
        assert!(nodes.try_get(NodeId::new(7)).is_err());
    }
}
