// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Removes short elements hanging off the structure by a free end.

use beamheal_topology::connectivity::build_node_degree;
use beamheal_topology::{ElementId, FeModelContext};
use tracing::{debug, info};

use crate::config::DanglingShortOptions;

/// Deletes every element that has an endpoint of degree 1 and is shorter
/// than `length_threshold`. Degrees are computed once before removal, so a
/// stub that becomes dangling only after this pass survives until the next
/// one. Returns the removed IDs in ascending order.
pub fn remove_dangling_short(
    ctx: &mut FeModelContext,
    opts: &DanglingShortOptions,
) -> Vec<ElementId> {
    let degree = build_node_degree(ctx);
    let is_free = |n| degree.get(&n).copied() == Some(1);

    let doomed: Vec<ElementId> = ctx
        .elements
        .iter()
        .filter(|(_, e)| e.nodes.iter().any(|&n| is_free(n)))
        .filter(|&(eid, _)| {
            ctx.element_length(eid)
                .is_some_and(|len| len < opts.length_threshold)
        })
        .map(|(eid, _)| eid)
        .collect();

    for &eid in &doomed {
        ctx.elements.remove(eid);
        debug!(element = %eid, "removed dangling element");
    }
    info!(removed = doomed.len(), threshold = opts.length_threshold, "dangling short removal");
    doomed
}
