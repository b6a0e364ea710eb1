// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merges free ends into a nearby node lying along their own member's axis.

use beamheal_topology::connectivity::{build_node_adjacency, record_merge};
use beamheal_topology::geometry::angle_between_deg;
use beamheal_topology::{FeModelContext, NodeId, NodeSpatialHash};
use tracing::{debug, info};

use crate::config::CollinearMergeOptions;
use crate::error::Result;

/// For every free node F on element A–F, looks for nodes K within
/// `distance_tolerance` of F whose direction from A deviates less than
/// `angle_tolerance_deg` from A→F, and merges F into the nearest one.
///
/// Returns the number of merged free nodes.
pub fn merge_collinear_nodes(
    ctx: &mut FeModelContext,
    opts: &CollinearMergeOptions,
) -> Result<usize> {
    let grid = NodeSpatialHash::build(&ctx.nodes, opts.distance_tolerance.max(1.0));
    let mut adjacency = build_node_adjacency(ctx);
    let mut merged = 0;

    for free in ctx.nodes.ids() {
        let Some(&[eid]) = adjacency.get(&free).map(Vec::as_slice) else {
            continue;
        };
        let Some(anchor) = ctx.elements.get(eid).and_then(|e| e.other_node(free)) else {
            continue;
        };
        if anchor == free {
            continue;
        }
        let (Some(pf), Some(pa)) = (ctx.nodes.get(free), ctx.nodes.get(anchor)) else {
            continue;
        };
        let axis = pf - pa;

        let mut best: Option<(NodeId, f64)> = None;
        for k in grid.within(&ctx.nodes, &pf, opts.distance_tolerance) {
            if k == free || k == anchor {
                continue;
            }
            let Some(pk) = ctx.nodes.get(k) else {
                continue;
            };
            let Some(angle) = angle_between_deg(&axis, &(pk - pa)) else {
                continue;
            };
            if angle >= opts.angle_tolerance_deg {
                continue;
            }
            let dist = (pk - pf).norm();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((k, dist));
            }
        }

        if let Some((keep, dist)) = best {
            let outcome = ctx.merge_attached_node_into(free, keep, &[eid])?;
            record_merge(&mut adjacency, free, keep, &outcome);
            merged += 1;
            debug!(node = %free, into = %keep, distance = dist, "merged collinear free end");
        }
    }

    info!(merged, "collinear node merge");
    Ok(merged)
}
