// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dangling reference detection and repair.

use beamheal_topology::{ElementId, FeModelContext, RigidId};

/// What [`repair_integrity`] deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityRepair {
    pub elements: Vec<ElementId>,
    pub rigids: Vec<RigidId>,
}

impl IntegrityRepair {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.rigids.is_empty()
    }
}

/// Elements referencing a missing node or property, or whose property
/// references a missing material.
pub fn find_invalid_elements(ctx: &FeModelContext) -> Vec<ElementId> {
    ctx.elements
        .iter()
        .filter(|(_, e)| {
            if e.nodes.iter().any(|&n| !ctx.nodes.contains(n)) {
                return true;
            }
            match ctx.properties.get(e.property) {
                Some(prop) => !ctx.materials.contains(prop.material),
                None => true,
            }
        })
        .map(|(eid, _)| eid)
        .collect()
}

/// Rigids whose master or one of whose slaves is missing.
pub fn find_invalid_rigids(ctx: &FeModelContext) -> Vec<RigidId> {
    ctx.rigids
        .iter()
        .filter(|(_, r)| r.nodes().any(|n| !ctx.nodes.contains(n)))
        .map(|(rid, _)| rid)
        .collect()
}

/// Deletes every invalid element and rigid.
pub fn repair_integrity(ctx: &mut FeModelContext) -> IntegrityRepair {
    let repair = IntegrityRepair {
        elements: find_invalid_elements(ctx),
        rigids: find_invalid_rigids(ctx),
    };
    for &eid in &repair.elements {
        ctx.elements.remove(eid);
    }
    for &rid in &repair.rigids {
        ctx.rigids.remove(rid);
    }
    repair
}
