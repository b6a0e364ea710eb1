// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid translation of node sets.
//!
//! Node positions are overwritten in place through
//! [`Nodes::add_with_id`], so IDs survive and every element attached to a
//! moved node follows it.

use std::collections::BTreeSet;

use nalgebra::Vector3;

use crate::context::FeModelContext;
use crate::keys::{ElementId, NodeId};
use crate::nodes::Nodes;

impl Nodes {
    /// Moves every listed node by `offset`. Missing IDs are skipped.
    ///
    /// Returns the number of nodes moved.
    pub fn translate(&mut self, ids: &[NodeId], offset: &Vector3<f64>) -> usize {
        let mut moved = 0;
        for &id in ids {
            if let Some(p) = self.get(id) {
                self.add_with_id(id, p + offset);
                moved += 1;
            }
        }
        moved
    }
}

impl FeModelContext {
    /// Distinct nodes referenced by the given elements, ascending.
    pub fn collect_nodes(&self, elements: &[ElementId]) -> Vec<NodeId> {
        let set: BTreeSet<NodeId> = elements
            .iter()
            .filter_map(|&eid| self.elements.get(eid))
            .flat_map(|e| e.nodes)
            .collect();
        set.into_iter().collect()
    }

    /// Translates all nodes of an element group by `offset`, keeping the
    /// group's shape. Returns the number of nodes moved.
    pub fn translate_elements(&mut self, elements: &[ElementId], offset: &Vector3<f64>) -> usize {
        let nodes = self.collect_nodes(elements);
        self.nodes.translate(&nodes, offset)
    }
}
