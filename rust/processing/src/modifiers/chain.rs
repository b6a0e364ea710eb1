// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rewriting one element as a chain of fragments.

use beamheal_topology::{Element, ElementId, FeModelContext, NodeId, Result};

/// Result of [`split_into_chain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChainSplit {
    /// Fragments created under new IDs.
    pub added: Vec<ElementId>,
    /// The element was deleted because no fragment was long enough.
    pub removed: bool,
}

/// Replaces element `eid` by the chain `start → via… → end`.
///
/// The first fragment keeps `eid` and its metadata. Later fragments get new
/// IDs and a copy of the metadata. Fragments shorter than `min_len` are not
/// created.
pub(crate) fn split_into_chain(
    ctx: &mut FeModelContext,
    eid: ElementId,
    via: &[NodeId],
    min_len: f64,
) -> Result<ChainSplit> {
    let original = ctx.elements.try_get(eid)?.clone();

    let mut sequence = Vec::with_capacity(via.len() + 2);
    sequence.push(original.start());
    sequence.extend_from_slice(via);
    sequence.push(original.end());

    let mut links = Vec::with_capacity(sequence.len() - 1);
    for pair in sequence.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a == b {
            continue;
        }
        let pa = ctx.nodes.try_get(a)?;
        let pb = ctx.nodes.try_get(b)?;
        if (pb - pa).norm() < min_len {
            continue;
        }
        links.push((a, b));
    }

    let mut split = ChainSplit::default();
    let Some((&(a, b), rest)) = links.split_first() else {
        ctx.elements.remove(eid);
        split.removed = true;
        return Ok(split);
    };

    ctx.elements.add_with_id(
        eid,
        Element::new(a, b, original.property, original.meta.clone()),
    );
    for &(a, b) in rest {
        let id = ctx
            .elements
            .add_new(Element::new(a, b, original.property, original.meta.clone()));
        split.added.push(id);
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::{ElementMeta, Point3, PropertyId};

    fn line() -> (FeModelContext, ElementId, [NodeId; 4]) {
        let mut ctx = FeModelContext::new();
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let m1 = ctx.nodes.add_or_get(Point3::new(3.0, 0.0, 0.0));
        let m2 = ctx.nodes.add_or_get(Point3::new(6.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(10.0, 0.0, 0.0));
        let eid = ctx.elements.add_new(Element::new(
            a,
            b,
            PropertyId::new(1),
            ElementMeta::named("M1"),
        ));
        (ctx, eid, [a, m1, m2, b])
    }

    #[test]
    fn first_fragment_keeps_id_and_meta() {
        let (mut ctx, eid, [a, m1, m2, b]) = line();
        let split = split_into_chain(&mut ctx, eid, &[m1, m2], 1e-6).unwrap();

        assert_eq!(split.added.len(), 2);
        assert!(!split.removed);
        assert_eq!(ctx.elements.get(eid).map(|e| e.nodes), Some([a, m1]));
        let tail: Vec<[NodeId; 2]> = split
            .added
            .iter()
            .filter_map(|id| ctx.elements.get(*id).map(|e| e.nodes))
            .collect();
        assert_eq!(tail, vec![[m1, m2], [m2, b]]);
        for id in split.added {
            let meta = ctx.elements.get(id).map(|e| e.meta.source_name.clone());
            assert_eq!(meta, Some(Some("M1".to_string())));
        }
    }

    #[test]
    fn short_links_are_dropped() {
        let (mut ctx, eid, [_, m1, _, _]) = line();
        let split = split_into_chain(&mut ctx, eid, &[m1], 5.0).unwrap();
        // 0→3 is too short, 3→10 survives under the original ID.
        assert!(split.added.is_empty());
        assert_eq!(ctx.elements.get(eid).map(|e| e.start()), Some(m1));
    }

    #[test]
    fn element_is_removed_when_nothing_survives() {
        let (mut ctx, eid, _) = line();
        let split = split_into_chain(&mut ctx, eid, &[], 100.0).unwrap();
        assert!(split.removed);
        assert!(!ctx.elements.contains(eid));
    }
}
