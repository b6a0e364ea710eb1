// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moves disconnected sub-assemblies onto the main structure.
//!
//! The largest connected group is the master; every other group is a slave.
//! For each slave group the free end closest to any master segment (within
//! that segment's dimension plus `extra_margin`) decides a single offset,
//! and the whole group is translated by it. The group keeps its shape.

use beamheal_topology::connectivity::{
    build_node_degree, find_connected_element_groups, largest_group_index,
};
use beamheal_topology::geometry::{project_point_to_segment, BoundingBox};
use beamheal_topology::{ElementId, ElementSpatialHash, FeModelContext, NodeId, Point3, Vector3};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::config::GroupTranslationOptions;
use crate::error::Result;

/// Summary of one translation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub groups: usize,
    /// Slave groups that were moved.
    pub translated: usize,
    /// Moved free ends merged into a master node.
    pub merged: usize,
}

#[derive(Debug, Clone, Copy)]
struct Landing {
    free: NodeId,
    target: ElementId,
    point: Point3<f64>,
    distance: f64,
}

/// Translates each slave group whose nearest free end is within reach of the
/// master group.
pub fn translate_groups(
    ctx: &mut FeModelContext,
    opts: &GroupTranslationOptions,
) -> Result<TranslationReport> {
    let groups = find_connected_element_groups(ctx);
    let mut report = TranslationReport {
        groups: groups.len(),
        ..TranslationReport::default()
    };
    let Some(master_index) = largest_group_index(&groups).filter(|_| groups.len() > 1) else {
        info!(groups = report.groups, "group translation: nothing to do");
        return Ok(report);
    };

    let master: FxHashSet<ElementId> = groups[master_index].iter().copied().collect();
    let search = ctx.properties.max_dimension() + opts.extra_margin;
    let cell = ElementSpatialHash::suggest_cell_size(ctx, search.max(1.0));
    let hash = ElementSpatialHash::build(ctx, cell, 0.0);
    let degree = build_node_degree(ctx);

    for (index, group) in groups.iter().enumerate() {
        if index == master_index {
            continue;
        }
        let free_nodes: Vec<NodeId> = ctx
            .collect_nodes(group)
            .into_iter()
            .filter(|n| degree.get(n).copied() == Some(1))
            .collect();

        let mut best: Option<Landing> = None;
        for free in free_nodes {
            let Some(p) = ctx.nodes.get(free) else {
                continue;
            };
            for target in hash.query_bbox(&BoundingBox::around(&p, search)) {
                if !master.contains(&target) {
                    continue;
                }
                let (Some((a, b)), Ok(dim)) =
                    (ctx.element_points(target), ctx.search_dimension(target))
                else {
                    continue;
                };
                let proj = project_point_to_segment(&p, &a, &b);
                if proj.distance > dim + opts.extra_margin {
                    continue;
                }
                if best.map_or(true, |l| proj.distance < l.distance) {
                    best = Some(Landing {
                        free,
                        target,
                        point: proj.point,
                        distance: proj.distance,
                    });
                }
            }
        }

        let Some(landing) = best else {
            continue;
        };
        if landing.distance <= opts.min_offset {
            continue;
        }
        let Some(from) = ctx.nodes.get(landing.free) else {
            continue;
        };
        let offset: Vector3<f64> = landing.point - from;
        let moved = ctx.translate_elements(group, &offset);
        report.translated += 1;
        debug!(
            group = index,
            elements = group.len(),
            nodes = moved,
            target = %landing.target,
            distance = landing.distance,
            "translated group"
        );

        if let Some(end) = master_endpoint_near(ctx, landing.target, &landing.point, opts) {
            ctx.merge_node_into(landing.free, end)?;
            report.merged += 1;
        }
    }

    info!(
        groups = report.groups,
        translated = report.translated,
        merged = report.merged,
        "group translation"
    );
    Ok(report)
}

fn master_endpoint_near(
    ctx: &FeModelContext,
    target: ElementId,
    point: &Point3<f64>,
    opts: &GroupTranslationOptions,
) -> Option<NodeId> {
    let element = ctx.elements.get(target)?;
    element.nodes.into_iter().find(|&n| {
        ctx.nodes
            .get(n)
            .is_some_and(|p| (p - point).norm() <= opts.endpoint_merge_tol)
    })
}
