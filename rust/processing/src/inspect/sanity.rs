// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite sanity check run after every pipeline stage.

use beamheal_topology::connectivity::{build_node_degree, find_connected_element_groups};
use beamheal_topology::{ElementId, FeModelContext, NodeId};
use tracing::{info, warn};

use super::{
    find_coincident_groups, find_duplicate_groups, find_invalid_elements, find_invalid_rigids,
    find_isolated_elements, find_short_elements, repair_integrity, summarize_ids, IntegrityRepair,
    ShortElement,
};
use crate::config::SanityOptions;

/// Findings of one sanity run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanityReport {
    /// Connected element groups.
    pub groups: usize,
    /// Nodes with degree 1 after all repairs, ascending.
    pub free_end_nodes: Vec<NodeId>,
    pub orphans_removed: Vec<NodeId>,
    pub short_elements: Vec<ShortElement>,
    pub coincident_groups: Vec<Vec<NodeId>>,
    pub duplicate_groups: Vec<Vec<ElementId>>,
    pub integrity: IntegrityRepair,
    pub isolated: Vec<ElementId>,
}

/// Runs the checks in order:
///
/// 1. connectivity groups
/// 2. node degree, deleting orphan nodes
/// 3. short elements
/// 4. coincident nodes
/// 5. duplicate elements
/// 6. reference integrity, deleting broken elements and rigids
/// 7. isolated elements
///
/// Nodes referenced by a rigid are never treated as orphans. If step 6
/// deleted anything, orphan removal runs again and the free-end list is
/// recomputed.
pub fn inspect(ctx: &mut FeModelContext, opts: &SanityOptions) -> SanityReport {
    let limit = opts.max_listed;
    let mut report = SanityReport::default();

    report.groups = find_connected_element_groups(ctx).len();
    if report.groups > 1 {
        warn!(groups = report.groups, "model is split into disconnected groups");
    } else {
        info!(groups = report.groups, "connectivity ok");
    }

    report.free_end_nodes = check_degree(ctx, opts, &mut report.orphans_removed);

    report.short_elements = find_short_elements(ctx, opts.short_threshold);
    if !report.short_elements.is_empty() {
        let ids: Vec<ElementId> = report.short_elements.iter().map(|s| s.element).collect();
        warn!(
            count = ids.len(),
            threshold = opts.short_threshold,
            ids = %summarize_ids(&ids, limit),
            "short elements"
        );
    }

    report.coincident_groups = find_coincident_groups(ctx, opts.equivalence_tol);
    for group in report.coincident_groups.iter().take(limit) {
        let at = group.first().and_then(|&n| ctx.nodes.get(n));
        warn!(ids = %summarize_ids(group, limit), position = ?at, "coincident nodes");
    }

    report.duplicate_groups = find_duplicate_groups(ctx);
    for group in report.duplicate_groups.iter().take(limit) {
        warn!(ids = %summarize_ids(group, limit), "duplicate elements");
    }

    if opts.repair_integrity {
        report.integrity = repair_integrity(ctx);
        if !report.integrity.is_empty() {
            info!(
                elements = %summarize_ids(&report.integrity.elements, limit),
                rigids = %summarize_ids(&report.integrity.rigids, limit),
                "removed entities with dangling references"
            );
            report.free_end_nodes = check_degree(ctx, opts, &mut report.orphans_removed);
        }
    } else {
        let elements = find_invalid_elements(ctx);
        let rigids = find_invalid_rigids(ctx);
        if !elements.is_empty() || !rigids.is_empty() {
            warn!(
                elements = %summarize_ids(&elements, limit),
                rigids = %summarize_ids(&rigids, limit),
                "entities with dangling references"
            );
        }
    }

    report.isolated = find_isolated_elements(ctx);
    if !report.isolated.is_empty() {
        warn!(
            count = report.isolated.len(),
            ids = %summarize_ids(&report.isolated, limit),
            "elements isolated from the main structure"
        );
    }

    info!(
        free_ends = report.free_end_nodes.len(),
        orphans_removed = report.orphans_removed.len(),
        short = report.short_elements.len(),
        coincident = report.coincident_groups.len(),
        duplicates = report.duplicate_groups.len(),
        isolated = report.isolated.len(),
        "sanity inspection finished"
    );
    report
}

/// Returns the free ends and, when enabled, removes orphan nodes, appending
/// them to `removed`.
fn check_degree(
    ctx: &mut FeModelContext,
    opts: &SanityOptions,
    removed: &mut Vec<NodeId>,
) -> Vec<NodeId> {
    let degree = build_node_degree(ctx);
    let free_ends: Vec<NodeId> = degree
        .iter()
        .filter(|&(_, &d)| d == 1)
        .map(|(&n, _)| n)
        .collect();
    let orphans: Vec<NodeId> = degree
        .iter()
        .filter(|&(&n, &d)| d == 0 && !ctx.rigids.references(n))
        .map(|(&n, _)| n)
        .collect();

    if !free_ends.is_empty() {
        warn!(
            count = free_ends.len(),
            ids = %summarize_ids(&free_ends, opts.max_listed),
            "free end nodes"
        );
    }
    if !orphans.is_empty() {
        if opts.remove_orphans {
            for &n in &orphans {
                ctx.nodes.remove(n);
            }
            info!(count = orphans.len(), ids = %summarize_ids(&orphans, opts.max_listed), "removed orphan nodes");
            removed.extend(orphans);
        } else {
            warn!(count = orphans.len(), ids = %summarize_ids(&orphans, opts.max_listed), "orphan nodes");
        }
    }
    free_ends
}
