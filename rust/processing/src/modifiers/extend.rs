// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extends (or trims) free ends onto the nearest member ahead of them.
//!
//! The ray starts at the free node and points away from the other node of
//! its element. Each target segment is tested with its own acceptance
//! radius, the largest cross-section dimension of its property plus
//! `extra_margin`. A hit is accepted when
//!
//! - the ray passes within the radius of the target line,
//! - `min_extension < |s| <= radius`,
//! - the segment parameter lies in `[-t_slack, 1 + t_slack]`,
//! - the free node would move at most the radius.
//!
//! The nearest accepted hit (smallest `|s|`) wins. When it lands within
//! `endpoint_merge_tol` of a target endpoint that is itself within the
//! radius of the free node, the free node is merged into that endpoint;
//! otherwise it is relocated onto the target, keeping its ID.

use beamheal_topology::connectivity::{build_node_adjacency, record_merge};
use beamheal_topology::geometry::{normalize_or_zero, ray_segment_closest, BoundingBox};
use beamheal_topology::{ElementId, ElementSpatialHash, FeModelContext, NodeId, Point3};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::ExtendOptions;
use crate::error::Result;

/// Summary of one extension sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendReport {
    /// Free ends examined.
    pub scanned: usize,
    /// Free ends relocated onto a target segment.
    pub relocated: usize,
    /// Free ends merged into a target endpoint.
    pub merged: usize,
}

impl ExtendReport {
    /// Free ends that changed in any way.
    pub fn moved(&self) -> usize {
        self.relocated + self.merged
    }
}

#[derive(Debug, Clone, Copy)]
struct Extension {
    target: ElementId,
    along: f64,
    point: Point3<f64>,
    /// Acceptance radius of the target; also bounds the snapped position.
    radius: f64,
}

/// One sweep over all free ends.
///
/// Node adjacency and the element hash are built once and patched after
/// every move, so later free ends see earlier results.
pub fn extend_free_ends(ctx: &mut FeModelContext, opts: &ExtendOptions) -> Result<ExtendReport> {
    let search = 2.0 * (ctx.properties.max_dimension() + opts.extra_margin);
    let cell = ElementSpatialHash::suggest_cell_size(ctx, search.max(1.0));
    let mut hash = ElementSpatialHash::build(ctx, cell, 0.0);
    let mut adjacency = build_node_adjacency(ctx);
    let mut report = ExtendReport::default();

    for free in ctx.nodes.ids() {
        let Some((eid, anchor)) = single_attachment(ctx, &adjacency, free) else {
            continue;
        };
        report.scanned += 1;
        let Some(best) = best_extension(ctx, &hash, free, anchor, search, opts) else {
            continue;
        };
        let Some(origin) = ctx.nodes.get(free) else {
            continue;
        };

        let snap = ctx.elements.get(best.target).and_then(|target| {
            target.nodes.into_iter().find(|&n| {
                ctx.nodes.get(n).is_some_and(|p| {
                    (p - best.point).norm() <= opts.endpoint_merge_tol
                        && (p - origin).norm() <= best.radius
                })
            })
        });

        match snap {
            Some(end) => {
                let outcome = ctx.merge_attached_node_into(free, end, &[eid])?;
                record_merge(&mut adjacency, free, end, &outcome);
                report.merged += 1;
                debug!(node = %free, element = %eid, target = %best.target, into = %end, "extended onto endpoint");
            }
            None => {
                ctx.nodes.add_with_id(free, best.point);
                report.relocated += 1;
                debug!(node = %free, element = %eid, target = %best.target, s = best.along, "extended onto member");
            }
        }
        hash.refresh(ctx, eid);
    }

    info!(
        scanned = report.scanned,
        relocated = report.relocated,
        merged = report.merged,
        "extend to intersect"
    );
    Ok(report)
}

/// The only element attached to `node` and its other endpoint.
fn single_attachment(
    ctx: &FeModelContext,
    adjacency: &FxHashMap<NodeId, Vec<ElementId>>,
    node: NodeId,
) -> Option<(ElementId, NodeId)> {
    let [eid] = adjacency.get(&node)?.as_slice() else {
        return None;
    };
    let anchor = ctx.elements.get(*eid)?.other_node(node)?;
    (anchor != node).then_some((*eid, anchor))
}

fn best_extension(
    ctx: &FeModelContext,
    hash: &ElementSpatialHash,
    free: NodeId,
    anchor: NodeId,
    search: f64,
    opts: &ExtendOptions,
) -> Option<Extension> {
    let origin = ctx.nodes.get(free)?;
    let dir = normalize_or_zero(&(origin - ctx.nodes.get(anchor)?));
    if dir.norm_squared() == 0.0 {
        return None;
    }

    let mut best: Option<Extension> = None;
    for target in hash.query_bbox(&BoundingBox::around(&origin, search)) {
        let Some(element) = ctx.elements.get(target) else {
            continue;
        };
        if element.contains_node(free) || element.contains_node(anchor) {
            continue;
        }
        let Ok(dim) = ctx.search_dimension(target) else {
            continue;
        };
        let radius = dim + opts.extra_margin;
        let Some((a, b)) = ctx.element_points(target) else {
            continue;
        };
        let Some(hit) = ray_segment_closest(&origin, &dir, &a, &b, radius) else {
            continue;
        };

        let along = hit.s.abs();
        if hit.miss > radius || along <= opts.min_extension || along > radius {
            continue;
        }
        if hit.t < -opts.t_slack || hit.t > 1.0 + opts.t_slack {
            continue;
        }
        if (hit.segment_point - origin).norm() > radius {
            continue;
        }
        if best.map_or(true, |b| along < b.along) {
            best = Some(Extension {
                target,
                along,
                point: hit.segment_point,
                radius,
            });
        }
    }
    best
}
