// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Splits elements at existing nodes that lie on them.
//!
//! For each element A–B, nodes found by the node hash inside the inflated
//! segment box are projected onto the line through A and B. A node is a hit
//! when it projects strictly inside the segment, away from both endpoints,
//! and within `distance_tol` of the line. Hits closer than `merge_tol_along`
//! to each other along the axis collapse to the one nearest the line. The
//! element is then rewritten as the chain A → hits → B.

use std::collections::BTreeMap;

use beamheal_topology::geometry::{project_point_to_line, BoundingBox};
use beamheal_topology::{ElementId, FeModelContext, NodeId, NodeSpatialHash};
use tracing::{debug, info};

use super::chain::split_into_chain;
use crate::config::SplitByNodesOptions;
use crate::error::Result;

/// Summary of one split pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub scanned: usize,
    /// Elements with at least one hit.
    pub candidates: usize,
    pub split: usize,
    /// Elements deleted because no fragment survived.
    pub removed: usize,
    /// Fragments created under new IDs.
    pub added: usize,
}

#[derive(Debug, Clone, Copy)]
struct NodeHit {
    node: NodeId,
    along: f64,
    offset: f64,
}

/// Runs one split pass over every element.
pub fn split_by_existing_nodes(
    ctx: &mut FeModelContext,
    opts: &SplitByNodesOptions,
) -> Result<SplitReport> {
    let grid = NodeSpatialHash::build(&ctx.nodes, opts.grid_cell_size);
    let (scanned, candidates) = find_candidates(ctx, &grid, opts);

    let mut report = SplitReport {
        scanned,
        candidates: candidates.len(),
        ..SplitReport::default()
    };

    for (eid, via) in candidates {
        if !ctx.elements.contains(eid) {
            continue;
        }
        let outcome = split_into_chain(ctx, eid, &via, opts.min_seg_len)?;
        if outcome.removed {
            report.removed += 1;
        } else {
            report.split += 1;
        }
        report.added += outcome.added.len();
        debug!(element = %eid, nodes = ?via, added = outcome.added.len(), "split at existing nodes");
    }

    info!(
        scanned = report.scanned,
        split = report.split,
        added = report.added,
        removed = report.removed,
        "split by existing nodes"
    );
    Ok(report)
}

fn find_candidates(
    ctx: &FeModelContext,
    grid: &NodeSpatialHash,
    opts: &SplitByNodesOptions,
) -> (usize, BTreeMap<ElementId, Vec<NodeId>>) {
    let mut scanned = 0;
    let mut candidates = BTreeMap::new();

    for (eid, element) in ctx.elements.iter() {
        scanned += 1;
        let Some((a, b)) = ctx.element_points(eid) else {
            continue;
        };
        let len = (b - a).norm();
        if len <= 1e-9 {
            continue;
        }

        let bbox = BoundingBox::from_segment(&a, &b, opts.distance_tol);
        let mut hits = Vec::new();
        for nid in grid.query(&bbox) {
            if element.contains_node(nid) {
                continue;
            }
            let Some(p) = ctx.nodes.get(nid) else {
                continue;
            };
            let Some(proj) = project_point_to_line(&p, &a, &b) else {
                continue;
            };
            if proj.t <= opts.param_tol || proj.t >= 1.0 - opts.param_tol {
                continue;
            }
            if proj.distance > opts.distance_tol {
                continue;
            }
            let along = proj.t * len;
            if along <= opts.merge_tol_along || len - along <= opts.merge_tol_along {
                continue;
            }
            hits.push(NodeHit {
                node: nid,
                along,
                offset: proj.distance,
            });
        }

        if hits.is_empty() {
            continue;
        }
        hits.sort_by(|x, y| x.along.total_cmp(&y.along));
        let via: Vec<NodeId> = merge_close_hits(&hits, opts.merge_tol_along)
            .into_iter()
            .map(|h| h.node)
            .collect();
        candidates.insert(eid, via);
    }

    (scanned, candidates)
}

/// Collapses runs of hits closer than `tol` along the axis, keeping the one
/// nearest the line. `hits` must be sorted by `along`.
fn merge_close_hits(hits: &[NodeHit], tol: f64) -> Vec<NodeHit> {
    let mut merged: Vec<NodeHit> = Vec::with_capacity(hits.len());
    for &h in hits {
        match merged.last_mut() {
            Some(cur) if (h.along - cur.along).abs() <= tol => {
                if h.offset < cur.offset {
                    *cur = h;
                }
            }
            _ => merged.push(h),
        }
    }
    merged
}
