// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-node line elements.

use serde::{Deserialize, Serialize};

use crate::arena::IdArena;
use crate::error::Result;
use crate::keys::{ElementId, NodeId, PropertyId};
use crate::metadata::ElementMeta;

/// A straight line element between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Start and end node. Order matters for orientation and splitting.
    pub nodes: [NodeId; 2],
    pub property: PropertyId,
    #[serde(default)]
    pub meta: ElementMeta,
}

impl Element {
    pub fn new(start: NodeId, end: NodeId, property: PropertyId, meta: ElementMeta) -> Self {
        Self {
            nodes: [start, end],
            property,
            meta,
        }
    }

    pub fn start(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn end(&self) -> NodeId {
        self.nodes[1]
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes[0] == node || self.nodes[1] == node
    }

    /// Returns the opposite endpoint of `node`, or `None` if `node` is not
    /// an endpoint.
    pub fn other_node(&self, node: NodeId) -> Option<NodeId> {
        if self.nodes[0] == node {
            Some(self.nodes[1])
        } else if self.nodes[1] == node {
            Some(self.nodes[0])
        } else {
            None
        }
    }

    /// Both ends reference the same node.
    pub fn is_degenerate(&self) -> bool {
        self.nodes[0] == self.nodes[1]
    }

    /// Rewires every occurrence of `from` to `to`. Returns `true` if anything
    /// changed.
    pub fn replace_node(&mut self, from: NodeId, to: NodeId) -> bool {
        let mut changed = false;
        for n in &mut self.nodes {
            if *n == from {
                *n = to;
                changed = true;
            }
        }
        changed
    }

    /// Endpoint pair in ascending order, for orientation-independent
    /// comparison.
    pub fn sorted_nodes(&self) -> (NodeId, NodeId) {
        let [a, b] = self.nodes;
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// All elements of a model.
#[derive(Debug, Clone, Default)]
pub struct Elements {
    arena: IdArena<ElementId, Element>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `element` under the next free ID.
    pub fn add_new(&mut self, element: Element) -> ElementId {
        self.arena.insert_new(element)
    }

    /// Stores `element` under `id`, replacing any element already there.
    pub fn add_with_id(&mut self, id: ElementId, element: Element) {
        self.arena.insert_with_id(id, element);
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.arena.remove(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.arena.get_mut(id)
    }

    pub fn try_get(&self, id: ElementId) -> Result<&Element> {
        self.arena.try_get(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Snapshot of all element IDs, ascending.
    pub fn ids(&self) -> Vec<ElementId> {
        self.arena.ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> + '_ {
        self.arena.iter()
    }

    /// IDs of every element with `node` as an endpoint.
    pub fn referencing(&self, node: NodeId) -> Vec<ElementId> {
        self.arena
            .iter()
            .filter(|(_, e)| e.contains_node(node))
            .map(|(id, _)| id)
            .collect()
    }
}
