// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only connectivity analysis.
//!
//! - [`find_connected_element_groups`]: partitions elements into connected
//!   components through shared nodes (union-find).
//! - [`build_node_degree`]: how many elements reference each node. Degree 1
//!   is a free end, degree 0 an orphan.
//! - [`build_node_adjacency`]: the elements at each node, for sweeps that
//!   would otherwise scan all elements per node. [`record_merge`] keeps it
//!   current across node merges.
//!
//! Both walk the store in ascending ID order and return deterministic
//! results.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::context::{FeModelContext, MergeOutcome};
use crate::keys::{ElementId, NodeId};

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// `n` singleton sets `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already
    /// one set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
        true
    }
}

/// Connected components of the element graph.
///
/// Each group is sorted ascending, and groups are ordered by their smallest
/// element ID. Every element appears in exactly one group. Node existence is
/// not checked: an element pointing at a deleted node still connects through
/// that node ID.
pub fn find_connected_element_groups(ctx: &FeModelContext) -> Vec<Vec<ElementId>> {
    let mut index: FxHashMap<NodeId, usize> = FxHashMap::default();
    for (_, e) in ctx.elements.iter() {
        for n in e.nodes {
            let next = index.len();
            index.entry(n).or_insert(next);
        }
    }
    if index.is_empty() {
        return Vec::new();
    }

    let mut uf = UnionFind::new(index.len());
    for (_, e) in ctx.elements.iter() {
        let base = index[&e.nodes[0]];
        for n in &e.nodes[1..] {
            uf.union(base, index[n]);
        }
    }

    let mut slot_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<ElementId>> = Vec::new();
    for (eid, e) in ctx.elements.iter() {
        let root = uf.find(index[&e.nodes[0]]);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(eid);
    }
    groups
}

/// Index of the largest group. Ties go to the earlier group.
pub fn largest_group_index(groups: &[Vec<ElementId>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, g) in groups.iter().enumerate() {
        if best.map_or(true, |(_, len)| g.len() > len) {
            best = Some((i, g.len()));
        }
    }
    best.map(|(i, _)| i)
}

/// Number of elements referencing each node in the store (0 if none).
///
/// A degenerate element counts once for its single node.
pub fn build_node_degree(ctx: &FeModelContext) -> BTreeMap<NodeId, usize> {
    let mut degree: BTreeMap<NodeId, usize> = ctx.nodes.iter().map(|(id, _)| (id, 0)).collect();
    for (_, e) in ctx.elements.iter() {
        if let Some(d) = degree.get_mut(&e.nodes[0]) {
            *d += 1;
        }
        if !e.is_degenerate() {
            if let Some(d) = degree.get_mut(&e.nodes[1]) {
                *d += 1;
            }
        }
    }
    degree
}

/// Nodes with degree 1, ascending.
pub fn free_end_nodes(ctx: &FeModelContext) -> Vec<NodeId> {
    nodes_with_degree(ctx, 1)
}

/// Nodes no element references, ascending.
pub fn orphan_nodes(ctx: &FeModelContext) -> Vec<NodeId> {
    nodes_with_degree(ctx, 0)
}

fn nodes_with_degree(ctx: &FeModelContext, wanted: usize) -> Vec<NodeId> {
    build_node_degree(ctx)
        .into_iter()
        .filter(|&(_, d)| d == wanted)
        .map(|(id, _)| id)
        .collect()
}

/// Elements attached to each node, in ascending element order.
pub fn build_node_adjacency(ctx: &FeModelContext) -> FxHashMap<NodeId, Vec<ElementId>> {
    let mut adjacency: FxHashMap<NodeId, Vec<ElementId>> = FxHashMap::default();
    for (eid, e) in ctx.elements.iter() {
        adjacency.entry(e.nodes[0]).or_default().push(eid);
        if !e.is_degenerate() {
            adjacency.entry(e.nodes[1]).or_default().push(eid);
        }
    }
    adjacency
}

/// Patches an adjacency from [`build_node_adjacency`] after
/// [`FeModelContext::merge_node_into`] replaced `remove` by `keep`.
pub fn record_merge(
    adjacency: &mut FxHashMap<NodeId, Vec<ElementId>>,
    remove: NodeId,
    keep: NodeId,
    outcome: &MergeOutcome,
) {
    adjacency.remove(&remove);
    let list = adjacency.entry(keep).or_default();
    list.retain(|e| !outcome.removed_elements.contains(e));
    list.extend_from_slice(&outcome.rewired);
    list.sort_unstable();
    list.dedup();
}
