// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stitches remaining free ends to nearby members with RBE2 rigid links.
//!
//! No existing node moves. For each free end the nearest perpendicular foot
//! on another member is found. A node is placed there (or an existing one
//! reused) and a rigid link is registered with the foot as master and the
//! free end as its slave. Split-on-existing-node has to run afterwards so the
//! target member actually passes through the new master node, which is why a
//! foot within `endpoint_snap_tol` of an endpoint or of another master on the
//! same member reuses that node instead.

use beamheal_topology::connectivity::free_end_nodes;
use beamheal_topology::geometry::{project_point_to_segment, BoundingBox};
use beamheal_topology::{ElementId, ElementSpatialHash, FeModelContext, NodeId, Point3, RigidId};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::RbeOptions;

/// Rigid links created by one stitching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RbeReport {
    pub scanned: usize,
    pub created: Vec<RigidId>,
}

#[derive(Debug, Clone, Copy)]
struct Foot {
    target: ElementId,
    point: Point3<f64>,
    distance: f64,
}

/// Creates one rigid link per stitchable free end.
pub fn stitch_free_ends(ctx: &mut FeModelContext, opts: &RbeOptions) -> RbeReport {
    let search = ctx.properties.max_dimension() + opts.extra_margin;
    let cell = ElementSpatialHash::suggest_cell_size(ctx, search.max(1.0));
    let hash = ElementSpatialHash::build(ctx, cell, 0.0);
    let mut placed: FxHashMap<ElementId, Vec<NodeId>> = FxHashMap::default();
    let mut report = RbeReport::default();

    for free in free_end_nodes(ctx) {
        if ctx.rigids.is_slave(free) {
            continue;
        }
        report.scanned += 1;
        let Some(foot) = nearest_foot(ctx, &hash, free, search, opts) else {
            continue;
        };
        if foot.distance <= opts.min_distance {
            continue;
        }

        let on_target = placed.entry(foot.target).or_default();
        let reused = reuse_master(
            ctx,
            foot.target,
            &foot.point,
            &on_target[..],
            opts.endpoint_snap_tol,
        );
        let master = match reused {
            Some(existing) => existing,
            None => {
                let node = ctx.nodes.add_or_get(foot.point);
                on_target.push(node);
                node
            }
        };
        let rid = ctx.rigids.add_new(master, [free]);
        report.created.push(rid);
        debug!(rigid = %rid, master = %master, slave = %free, target = %foot.target, distance = foot.distance, "created rigid link");
    }

    info!(scanned = report.scanned, created = report.created.len(), "rbe stitching");
    report
}

fn nearest_foot(
    ctx: &FeModelContext,
    hash: &ElementSpatialHash,
    free: NodeId,
    search: f64,
    opts: &RbeOptions,
) -> Option<Foot> {
    let p = ctx.nodes.get(free)?;
    let mut best: Option<Foot> = None;
    for target in hash.query_bbox(&BoundingBox::around(&p, search)) {
        let Some(element) = ctx.elements.get(target) else {
            continue;
        };
        if element.contains_node(free) {
            continue;
        }
        let (Some((a, b)), Ok(dim)) = (ctx.element_points(target), ctx.search_dimension(target))
        else {
            continue;
        };
        let proj = project_point_to_segment(&p, &a, &b);
        if proj.t < -opts.t_slack || proj.t > 1.0 + opts.t_slack {
            continue;
        }
        if proj.distance > dim + opts.extra_margin {
            continue;
        }
        if best.map_or(true, |f| proj.distance < f.distance) {
            best = Some(Foot {
                target,
                point: proj.point,
                distance: proj.distance,
            });
        }
    }
    best
}

/// An endpoint of `target`, or a master already placed on it, within `tol`
/// of `point`.
fn reuse_master(
    ctx: &FeModelContext,
    target: ElementId,
    point: &Point3<f64>,
    placed: &[NodeId],
    tol: f64,
) -> Option<NodeId> {
    let ends = ctx.elements.get(target)?.nodes;
    ends.into_iter().chain(placed.iter().copied()).find(|&n| {
        ctx.nodes
            .get(n)
            .is_some_and(|p| (p - point).norm() <= tol)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitByNodesOptions;
    use crate::modifiers::split_by_existing_nodes;
    use approx::assert_relative_eq;
    use beamheal_topology::{CrossSection, Element, ElementMeta, PropertyId};

    fn model() -> (FeModelContext, PropertyId) {
        let mut ctx = FeModelContext::new();
        let m = ctx.materials.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
        let p = ctx.properties.add_or_get(CrossSection::Rod, &[10.0], m);
        (ctx, p)
    }

    fn beam(ctx: &mut FeModelContext, p: PropertyId, a: [f64; 3], b: [f64; 3]) -> ElementId {
        let na = ctx.nodes.add_or_get(Point3::from(a));
        let nb = ctx.nodes.add_or_get(Point3::from(b));
        ctx.elements.add_new(Element::new(na, nb, p, ElementMeta::default()))
    }

    #[test]
    fn free_end_gets_rigid_to_perpendicular_foot() {
        let (mut ctx, p) = model();
        beam(&mut ctx, p, [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        let stub = beam(&mut ctx, p, [40.0, 8.0, 0.0], [40.0, 80.0, 0.0]);
        let before = ctx.nodes.len();

        let report = stitch_free_ends(&mut ctx, &RbeOptions::default());

        assert_eq!(report.created.len(), 1);
        let rigid = ctx.rigids.get(report.created[0]).cloned().unwrap();
        let slave = ctx.elements.get(stub).map(|e| e.start()).unwrap();
        assert_eq!(rigid.slaves, vec![slave]);
        let foot = ctx.nodes.get(rigid.master).unwrap();
        assert_relative_eq!(foot.x, 40.0, epsilon = 1e-9);
        assert_relative_eq!(foot.y, 0.0, epsilon = 1e-9);
        assert_eq!(ctx.nodes.len(), before + 1);
        assert!(report.created[0].get() >= beamheal_topology::RIGID_ID_BASE);
    }

    #[test]
    fn foot_near_endpoint_reuses_node() {
        let (mut ctx, p) = model();
        let main = beam(&mut ctx, p, [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        beam(&mut ctx, p, [100.0, 5.0, 0.0], [100.0, 90.0, 0.0]);
        beam(&mut ctx, p, [100.0, 0.0, 0.0], [100.0, 0.0, -90.0]);

        let report = stitch_free_ends(&mut ctx, &RbeOptions::default());

        let end = ctx.elements.get(main).map(|e| e.end()).unwrap();
        let masters: Vec<NodeId> = report
            .created
            .iter()
            .filter_map(|r| ctx.rigids.get(*r).map(|r| r.master))
            .collect();
        assert!(masters.contains(&end));
    }

    /// Every master must end up on an element once the split has run.
    fn assert_masters_attached(ctx: &FeModelContext) {
        for (rid, rigid) in ctx.rigids.iter() {
            assert!(
                !ctx.elements.referencing(rigid.master).is_empty(),
                "master of {rid} is on no element"
            );
        }
    }

    #[test]
    fn foot_just_inside_member_end_uses_the_end() {
        let (mut ctx, p) = model();
        let main = beam(&mut ctx, p, [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        beam(&mut ctx, p, [99.98, 8.0, 0.0], [99.98, 80.0, 0.0]);

        let report = stitch_free_ends(&mut ctx, &RbeOptions::default());
        split_by_existing_nodes(&mut ctx, &SplitByNodesOptions::default()).unwrap();

        assert_eq!(report.created.len(), 1);
        let master = ctx.rigids.get(report.created[0]).map(|r| r.master);
        assert_eq!(master, ctx.elements.get(main).map(|e| e.end()));
        assert_masters_attached(&ctx);
    }

    #[test]
    fn close_feet_share_one_master() {
        let (mut ctx, p) = model();
        let main = beam(&mut ctx, p, [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        beam(&mut ctx, p, [40.0, 8.0, 0.0], [40.0, 80.0, 0.0]);
        beam(&mut ctx, p, [40.03, -8.0, 0.0], [40.03, -80.0, 0.0]);

        let report = stitch_free_ends(&mut ctx, &RbeOptions::default());
        split_by_existing_nodes(&mut ctx, &SplitByNodesOptions::default()).unwrap();

        let masters: Vec<NodeId> = report
            .created
            .iter()
            .filter_map(|r| ctx.rigids.get(*r).map(|r| r.master))
            .collect();
        assert_eq!(masters.len(), 2);
        assert_eq!(masters[0], masters[1]);
        assert_eq!(ctx.elements.get(main).map(|e| e.end()), Some(masters[0]));
        assert_masters_attached(&ctx);
    }

    #[test]
    fn existing_slaves_and_touching_ends_are_skipped() {
        let (mut ctx, p) = model();
        beam(&mut ctx, p, [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        let stub = beam(&mut ctx, p, [40.0, 8.0, 0.0], [40.0, 80.0, 0.0]);
        stitch_free_ends(&mut ctx, &RbeOptions::default());
        let rigids = ctx.rigids.len();

        let again = stitch_free_ends(&mut ctx, &RbeOptions::default());
        assert!(again.created.is_empty());
        assert_eq!(ctx.rigids.len(), rigids);
        assert!(ctx.elements.contains(stub));
    }
}
