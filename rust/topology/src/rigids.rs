// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid (master/slave) couplings.
//!
//! A rigid ties the motion of one or more slave nodes to a master node over
//! a fixed DOF code. IDs start at [`RIGID_ID_BASE`] so they never collide
//! with element IDs in the exported deck.

use serde::{Deserialize, Serialize};

use crate::arena::IdArena;
use crate::error::Result;
use crate::keys::{NodeId, RigidId, RIGID_ID_BASE};

/// DOF code coupling all six degrees of freedom.
pub const DEFAULT_RIGID_DOF: &str = "123456";

/// A master node and the slaves that follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidInfo {
    /// Independent node.
    pub master: NodeId,
    /// Dependent nodes, in insertion order.
    pub slaves: Vec<NodeId>,
    /// Coupled components, e.g. `"123456"`.
    pub dof: String,
}

impl RigidInfo {
    pub fn new(master: NodeId, slaves: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            master,
            slaves: slaves.into_iter().collect(),
            dof: DEFAULT_RIGID_DOF.to_string(),
        }
    }

    #[must_use]
    pub fn with_dof(mut self, dof: impl Into<String>) -> Self {
        self.dof = dof.into();
        self
    }

    pub fn references(&self, node: NodeId) -> bool {
        self.master == node || self.slaves.contains(&node)
    }

    /// Master followed by slaves.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.master).chain(self.slaves.iter().copied())
    }

    /// Rewires `from` to `to`, then drops duplicate slaves and any slave
    /// equal to the master. Returns `true` if anything changed.
    pub fn replace_node(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.references(from) {
            return false;
        }
        if self.master == from {
            self.master = to;
        }
        let master = self.master;
        let mut seen = Vec::with_capacity(self.slaves.len());
        for s in self.slaves.drain(..) {
            let s = if s == from { to } else { s };
            if s != master && !seen.contains(&s) {
                seen.push(s);
            }
        }
        self.slaves = seen;
        true
    }
}

/// All rigids of a model.
#[derive(Debug, Clone)]
pub struct Rigids {
    arena: IdArena<RigidId, RigidInfo>,
}

impl Default for Rigids {
    fn default() -> Self {
        Self {
            arena: IdArena::starting_at(RIGID_ID_BASE),
        }
    }
}

impl Rigids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rigid with the default DOF code.
    pub fn add_new(&mut self, master: NodeId, slaves: impl IntoIterator<Item = NodeId>) -> RigidId {
        self.arena.insert_new(RigidInfo::new(master, slaves))
    }

    pub fn add_with_id(&mut self, id: RigidId, rigid: RigidInfo) {
        self.arena.insert_with_id(id, rigid);
    }

    pub fn remove(&mut self, id: RigidId) -> Option<RigidInfo> {
        self.arena.remove(id)
    }

    pub fn get(&self, id: RigidId) -> Option<&RigidInfo> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: RigidId) -> Option<&mut RigidInfo> {
        self.arena.get_mut(id)
    }

    pub fn try_get(&self, id: RigidId) -> Result<&RigidInfo> {
        self.arena.try_get(id)
    }

    pub fn contains(&self, id: RigidId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self) -> Vec<RigidId> {
        self.arena.ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RigidId, &RigidInfo)> + '_ {
        self.arena.iter()
    }

    /// `true` if `node` is a slave of any rigid.
    pub fn is_slave(&self, node: NodeId) -> bool {
        self.arena.values().any(|r| r.slaves.contains(&node))
    }

    /// `true` if any rigid references `node`.
    pub fn references(&self, node: NodeId) -> bool {
        self.arena.values().any(|r| r.references(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_base() {
        let mut rigids = Rigids::new();
        let a = rigids.add_new(NodeId::new(1), [NodeId::new(2)]);
        let b = rigids.add_new(NodeId::new(3), [NodeId::new(4)]);
        assert_eq!(a.get(), 9_000_001);
        assert_eq!(b.get(), 9_000_002);
        assert_eq!(rigids.get(a).map(|r| r.dof.as_str()), Some("123456"));
    }

    #[test]
    fn slave_and_reference_queries() {
        let mut rigids = Rigids::new();
        rigids.add_new(NodeId::new(1), [NodeId::new(2), NodeId::new(3)]);
        assert!(rigids.is_slave(NodeId::new(3)));
        assert!(!rigids.is_slave(NodeId::new(1)));
        assert!(rigids.references(NodeId::new(1)));
        assert!(!rigids.references(NodeId::new(9)));
    }

    #[test]
    fn replace_node_drops_self_coupling() {
        let mut rigid = RigidInfo::new(NodeId::new(1), [NodeId::new(2), NodeId::new(3)]);
        assert!(rigid.replace_node(NodeId::new(2), NodeId::new(1)));
        assert_eq!(rigid.slaves, vec![NodeId::new(3)]);

        assert!(rigid.replace_node(NodeId::new(1), NodeId::new(5)));
        assert_eq!(rigid.master, NodeId::new(5));
        assert!(!rigid.replace_node(NodeId::new(42), NodeId::new(1)));
    }

    #[test]
    fn explicit_id_and_custom_dof() {
        let mut rigids = Rigids::new();
        let id = RigidId::new(9_000_010);
        rigids.add_with_id(id, RigidInfo::new(NodeId::new(1), [NodeId::new(2)]).with_dof("123"));
        assert_eq!(rigids.try_get(id).map(|r| r.dof.clone()).ok(), Some("123".to_string()));
        assert_eq!(rigids.add_new(NodeId::new(1), [NodeId::new(4)]).get(), 9_000_011);
    }
}
