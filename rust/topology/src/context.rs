// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The aggregate model store.
//!
//! [`FeModelContext`] owns one collection of each entity kind and is the only
//! mutable state the repair pipeline works on. Every modifier and inspector
//! takes it by reference and mutates it in place.

use nalgebra::Point3;

use crate::elements::Elements;
use crate::error::{Error, Result};
use crate::keys::{ElementId, EntityId, NodeId, RigidId};
use crate::nodes::Nodes;
use crate::properties::{Materials, Properties, Property};
use crate::rigids::Rigids;

/// Nodes, elements, properties, materials and rigids of one model.
#[derive(Debug, Clone, Default)]
pub struct FeModelContext {
    pub nodes: Nodes,
    pub elements: Elements,
    pub properties: Properties,
    pub materials: Materials,
    pub rigids: Rigids,
}

/// Entity counts of a model, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelSummary {
    pub nodes: usize,
    pub elements: usize,
    pub properties: usize,
    pub materials: usize,
    pub rigids: usize,
}

/// What [`FeModelContext::merge_node_into`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Elements now referencing the kept node.
    pub rewired: Vec<ElementId>,
    /// Elements deleted because both ends became the kept node.
    pub removed_elements: Vec<ElementId>,
    /// Rigids deleted because they lost their last slave.
    pub removed_rigids: Vec<RigidId>,
}

impl FeModelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            nodes: self.nodes.len(),
            elements: self.elements.len(),
            properties: self.properties.len(),
            materials: self.materials.len(),
            rigids: self.rigids.len(),
        }
    }

    /// Start and end position of an element. `None` if the element or one of
    /// its nodes is missing.
    pub fn element_points(&self, id: ElementId) -> Option<(Point3<f64>, Point3<f64>)> {
        let e = self.elements.get(id)?;
        Some((self.nodes.get(e.start())?, self.nodes.get(e.end())?))
    }

    /// Length of an element, or `None` if it cannot be resolved.
    pub fn element_length(&self, id: ElementId) -> Option<f64> {
        self.element_points(id).map(|(a, b)| (b - a).norm())
    }

    /// Property of an element.
    pub fn element_property(&self, id: ElementId) -> Result<&Property> {
        let e = self.elements.try_get(id)?;
        self.properties.try_get(e.property)
    }

    /// Largest cross-section dimension of an element's property.
    pub fn search_dimension(&self, id: ElementId) -> Result<f64> {
        self.element_property(id).map(Property::max_dimension)
    }

    /// Replaces node `remove` by node `keep` everywhere, then deletes
    /// `remove`.
    ///
    /// Elements that end up with both ends on `keep` are deleted. Rigids are
    /// rewired the same way and deleted once they have no slave left.
    pub fn merge_node_into(&mut self, remove: NodeId, keep: NodeId) -> Result<MergeOutcome> {
        let attached = self.elements.referencing(remove);
        self.merge_attached_node_into(remove, keep, &attached)
    }

    /// [`merge_node_into`](Self::merge_node_into) for callers that already
    /// know which elements reference `remove`, typically from a node
    /// adjacency built once per sweep. `attached` must list all of them.
    pub fn merge_attached_node_into(
        &mut self,
        remove: NodeId,
        keep: NodeId,
        attached: &[ElementId],
    ) -> Result<MergeOutcome> {
        if !self.nodes.contains(keep) {
            return Err(Error::NotFound(keep.key()));
        }
        let mut outcome = MergeOutcome::default();
        if remove == keep {
            return Ok(outcome);
        }

        for &eid in attached {
            let degenerate = match self.elements.get_mut(eid) {
                Some(e) => {
                    e.replace_node(remove, keep);
                    e.is_degenerate()
                }
                None => continue,
            };
            if degenerate {
                self.elements.remove(eid);
                outcome.removed_elements.push(eid);
            } else {
                outcome.rewired.push(eid);
            }
        }

        for rid in self.rigids.ids() {
            let empty = match self.rigids.get_mut(rid) {
                Some(r) => r.replace_node(remove, keep) && r.slaves.is_empty(),
                None => continue,
            };
            if empty {
                self.rigids.remove(rid);
                outcome.removed_rigids.push(rid);
            }
        }

        self.nodes.remove(remove);
        Ok(outcome)
    }
}
