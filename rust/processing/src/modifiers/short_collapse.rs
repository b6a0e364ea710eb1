// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collapses elements shorter than a tolerance onto their start node.

use beamheal_topology::FeModelContext;
use tracing::{debug, info};

use crate::config::ShortCollapseOptions;
use crate::error::Result;

/// Summary of one collapse pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    pub collapsed: usize,
    /// Neighbors removed because they became zero-length.
    pub degenerate_removed: usize,
    pub nodes_removed: usize,
}

/// For each element shorter than `tolerance`, deletes it and merges its end
/// node into its start node, rewiring every other reference. Neighbors that
/// end up with both ends on the kept node are deleted too.
pub fn collapse_short_elements(
    ctx: &mut FeModelContext,
    opts: &ShortCollapseOptions,
) -> Result<CollapseReport> {
    let mut report = CollapseReport::default();

    for eid in ctx.elements.ids() {
        let Some(element) = ctx.elements.get(eid) else {
            continue;
        };
        let [keep, drop] = element.nodes;
        let Some(len) = ctx.element_length(eid) else {
            continue;
        };
        if len >= opts.tolerance {
            continue;
        }

        ctx.elements.remove(eid);
        report.collapsed += 1;
        if keep == drop {
            continue;
        }
        let outcome = ctx.merge_node_into(drop, keep)?;
        report.degenerate_removed += outcome.removed_elements.len();
        report.nodes_removed += 1;
        debug!(element = %eid, kept = %keep, removed = %drop, "collapsed short element");
    }

    info!(
        collapsed = report.collapsed,
        degenerate = report.degenerate_removed,
        tolerance = opts.tolerance,
        "short element collapse"
    );
    Ok(report)
}
