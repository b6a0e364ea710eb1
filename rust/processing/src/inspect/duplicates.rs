// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Duplicate element detection.

use std::collections::BTreeMap;

use beamheal_topology::{ElementId, FeModelContext, NodeId};

/// Sets of elements connecting the same two nodes, regardless of direction.
/// Each set is ascending; sets are ordered by their node pair.
pub fn find_duplicate_groups(ctx: &FeModelContext) -> Vec<Vec<ElementId>> {
    let mut by_nodes: BTreeMap<(NodeId, NodeId), Vec<ElementId>> = BTreeMap::new();
    for (eid, e) in ctx.elements.iter() {
        by_nodes.entry(e.sorted_nodes()).or_default().push(eid);
    }
    by_nodes.into_values().filter(|g| g.len() > 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::{Element, ElementMeta, Point3, PropertyId};

    #[test]
    fn reversed_elements_are_duplicates() {
        let mut ctx = FeModelContext::new();
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(1.0, 0.0, 0.0));
        let c = ctx.nodes.add_or_get(Point3::new(2.0, 0.0, 0.0));
        let p = PropertyId::new(1);
        let e1 = ctx.elements.add_new(Element::new(a, b, p, ElementMeta::default()));
        ctx.elements.add_new(Element::new(b, c, p, ElementMeta::default()));
        let e3 = ctx.elements.add_new(Element::new(b, a, p, ElementMeta::default()));

        assert_eq!(find_duplicate_groups(&ctx), vec![vec![e1, e3]]);
    }
}
