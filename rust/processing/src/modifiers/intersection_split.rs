// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Splits pairs of elements that cross without sharing a node.
//!
//! Two elements cross when their closest approach is within `distance_tol`
//! and both closest points lie inside their segments, further than
//! `distance_tol` from every endpoint. A node is placed at the midpoint of
//! the two closest points and both elements are split there.

use std::collections::BTreeMap;

use beamheal_topology::geometry::segment_segment_closest;
use beamheal_topology::{ElementId, ElementSpatialHash, FeModelContext, NodeId, Point3};
use tracing::{debug, info};

use super::chain::split_into_chain;
use crate::config::IntersectionSplitOptions;
use crate::error::Result;

/// Summary of one intersection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectionReport {
    /// Candidate pairs tested.
    pub pairs_tested: usize,
    pub crossings: usize,
    /// Elements rewritten as chains.
    pub split: usize,
    pub added: usize,
    pub removed: usize,
}

struct Crossing {
    first: (ElementId, f64),
    second: (ElementId, f64),
    point: Point3<f64>,
}

/// Finds every crossing pair and splits both members at the crossing.
pub fn split_intersections(
    ctx: &mut FeModelContext,
    opts: &IntersectionSplitOptions,
) -> Result<IntersectionReport> {
    let mut report = IntersectionReport::default();
    let crossings = find_crossings(ctx, opts, &mut report.pairs_tested);
    report.crossings = crossings.len();

    let mut cuts: BTreeMap<ElementId, Vec<(f64, NodeId)>> = BTreeMap::new();
    for crossing in &crossings {
        let node = ctx.nodes.add_or_get(crossing.point);
        for (eid, param) in [crossing.first, crossing.second] {
            cuts.entry(eid).or_default().push((param, node));
        }
    }

    for (eid, mut along) in cuts {
        along.sort_by(|x, y| x.0.total_cmp(&y.0));
        let mut via: Vec<NodeId> = along.into_iter().map(|(_, n)| n).collect();
        via.dedup();
        let outcome = split_into_chain(ctx, eid, &via, opts.min_seg_len)?;
        if outcome.removed {
            report.removed += 1;
        } else {
            report.split += 1;
        }
        report.added += outcome.added.len();
        debug!(element = %eid, nodes = ?via, "split at crossing");
    }

    info!(
        pairs = report.pairs_tested,
        crossings = report.crossings,
        split = report.split,
        added = report.added,
        "split at intersections"
    );
    Ok(report)
}

fn find_crossings(
    ctx: &FeModelContext,
    opts: &IntersectionSplitOptions,
    tested: &mut usize,
) -> Vec<Crossing> {
    let tol = opts.distance_tol;
    let cell = ElementSpatialHash::suggest_cell_size(ctx, tol.max(1.0));
    let hash = ElementSpatialHash::build(ctx, cell, tol);

    let mut crossings = Vec::new();
    for (eid, element) in ctx.elements.iter() {
        let Some((p1, q1)) = ctx.element_points(eid) else {
            continue;
        };
        let len1 = (q1 - p1).norm();
        for other in hash.query_candidates(eid) {
            if other <= eid {
                continue;
            }
            let Some(second) = ctx.elements.get(other) else {
                continue;
            };
            if second.nodes.iter().any(|&n| element.contains_node(n)) {
                continue;
            }
            let Some((p2, q2)) = ctx.element_points(other) else {
                continue;
            };
            *tested += 1;

            let closest = segment_segment_closest(&p1, &q1, &p2, &q2);
            if closest.distance > tol {
                continue;
            }
            let len2 = (q2 - p2).norm();
            if !is_interior(closest.s, len1, tol) || !is_interior(closest.t, len2, tol) {
                continue;
            }
            crossings.push(Crossing {
                first: (eid, closest.s),
                second: (other, closest.t),
                point: nalgebra::center(&closest.p, &closest.q),
            });
        }
    }
    crossings
}

fn is_interior(param: f64, len: f64, tol: f64) -> bool {
    let along = param * len;
    along > tol && len - along > tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use beamheal_topology::connectivity::build_node_degree;
    use beamheal_topology::{Element, ElementMeta, PropertyId};

    fn beam(ctx: &mut FeModelContext, a: [f64; 3], b: [f64; 3]) -> ElementId {
        let na = ctx.nodes.add_or_get(Point3::from(a));
        let nb = ctx.nodes.add_or_get(Point3::from(b));
        ctx.elements
            .add_new(Element::new(na, nb, PropertyId::new(1), ElementMeta::default()))
    }

    #[test]
    fn crossing_beams_share_a_new_node() {
        let mut ctx = FeModelContext::new();
        let e1 = beam(&mut ctx, [0.0, 0.0, 0.0], [10.0, 0.0, 0.0]);
        let e2 = beam(&mut ctx, [5.0, -5.0, 0.4], [5.0, 5.0, 0.4]);

        let report = split_intersections(&mut ctx, &IntersectionSplitOptions::default()).unwrap();

        assert_eq!(report.crossings, 1);
        assert_eq!(report.split, 2);
        assert_eq!(ctx.elements.len(), 4);

        let mid = ctx.elements.get(e1).map(|e| e.end()).unwrap();
        let p = ctx.nodes.get(mid).unwrap();
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, 0.2, epsilon = 1e-9);
        assert_eq!(ctx.elements.get(e2).map(|e| e.end()), Some(mid));
        assert_eq!(build_node_degree(&ctx).get(&mid), Some(&4));
    }

    #[test]
    fn distant_or_touching_pairs_are_left_alone() {
        let mut ctx = FeModelContext::new();
        beam(&mut ctx, [0.0, 0.0, 0.0], [10.0, 0.0, 0.0]);
        // passes 3 units above
        beam(&mut ctx, [5.0, -5.0, 3.0], [5.0, 5.0, 3.0]);
        // shares the start node
        beam(&mut ctx, [0.0, 0.0, 0.0], [0.0, 10.0, 0.0]);
        // crosses right next to an endpoint
        beam(&mut ctx, [9.5, -5.0, 0.0], [9.5, 5.0, 0.0]);

        let report = split_intersections(&mut ctx, &IntersectionSplitOptions::default()).unwrap();
        assert_eq!(report.crossings, 0);
        assert_eq!(ctx.elements.len(), 4);
    }

    #[test]
    fn several_crossings_on_one_element_are_ordered() {
        let mut ctx = FeModelContext::new();
        let main = beam(&mut ctx, [0.0, 0.0, 0.0], [30.0, 0.0, 0.0]);
        beam(&mut ctx, [20.0, -5.0, 0.0], [20.0, 5.0, 0.0]);
        beam(&mut ctx, [10.0, -5.0, 0.0], [10.0, 5.0, 0.0]);

        split_intersections(&mut ctx, &IntersectionSplitOptions::default()).unwrap();

        assert_eq!(ctx.elements.len(), 7);
        let first_end = ctx.elements.get(main).map(|e| e.end()).unwrap();
        assert_relative_eq!(ctx.nodes.get(first_end).unwrap().x, 10.0, epsilon = 1e-9);
    }
}
