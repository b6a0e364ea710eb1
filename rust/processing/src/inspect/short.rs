// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Short element detection.

use beamheal_topology::{ElementId, FeModelContext, NodeId};

/// An element shorter than the inspection threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortElement {
    pub element: ElementId,
    pub nodes: [NodeId; 2],
    pub length: f64,
}

/// Elements shorter than `threshold`, ascending. Elements with a missing
/// node are skipped; the integrity check deals with those.
pub fn find_short_elements(ctx: &FeModelContext, threshold: f64) -> Vec<ShortElement> {
    ctx.elements
        .iter()
        .filter_map(|(eid, e)| {
            let length = ctx.element_length(eid)?;
            (length < threshold).then_some(ShortElement {
                element: eid,
                nodes: e.nodes,
                length,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::{Element, ElementMeta, Point3, PropertyId};

    #[test]
    fn reports_only_short_resolvable_elements() {
        let mut ctx = FeModelContext::new();
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(0.5, 0.0, 0.0));
        let c = ctx.nodes.add_or_get(Point3::new(10.0, 0.0, 0.0));
        let p = PropertyId::new(1);
        let short = ctx.elements.add_new(Element::new(a, b, p, ElementMeta::default()));
        ctx.elements.add_new(Element::new(b, c, p, ElementMeta::default()));
        ctx.elements
            .add_new(Element::new(a, NodeId::new(99), p, ElementMeta::default()));

        let found = find_short_elements(&ctx, 1.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element, short);
        assert_eq!(found[0].nodes, [a, b]);
    }
}
