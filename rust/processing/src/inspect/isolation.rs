// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elements cut off from the main structure.

use beamheal_topology::connectivity::{find_connected_element_groups, largest_group_index};
use beamheal_topology::{ElementId, FeModelContext, NodeId};
use rustc_hash::FxHashSet;

/// Elements none of whose nodes belong to the largest connected group,
/// ascending.
pub fn find_isolated_elements(ctx: &FeModelContext) -> Vec<ElementId> {
    let groups = find_connected_element_groups(ctx);
    let Some(main) = largest_group_index(&groups) else {
        return Vec::new();
    };
    let main_nodes: FxHashSet<NodeId> = ctx.collect_nodes(&groups[main]).into_iter().collect();

    ctx.elements
        .iter()
        .filter(|(_, e)| !e.nodes.iter().any(|n| main_nodes.contains(n)))
        .map(|(eid, _)| eid)
        .collect()
}
