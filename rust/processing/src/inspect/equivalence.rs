// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coincident node detection.

use beamheal_topology::{FeModelContext, NodeId};

/// Groups of nodes closer than `tol` to their neighbor in (x, y, z) sort
/// order. A sweep over sorted coordinates, so only chains of adjacent nodes
/// form a group; groups have at least two members.
pub fn find_coincident_groups(ctx: &FeModelContext, tol: f64) -> Vec<Vec<NodeId>> {
    let mut sorted: Vec<_> = ctx.nodes.iter().collect();
    sorted.sort_by(|(_, p), (_, q)| {
        p.x.total_cmp(&q.x)
            .then(p.y.total_cmp(&q.y))
            .then(p.z.total_cmp(&q.z))
    });

    let mut groups = Vec::new();
    let Some(&(first, _)) = sorted.first() else {
        return groups;
    };
    let mut current = vec![first];

    for pair in sorted.windows(2) {
        let ((_, p), (id, q)) = (pair[0], pair[1]);
        let coincident = (q.x - p.x).abs() <= tol && (q - p).norm_squared() < tol * tol;
        if coincident {
            current.push(id);
        } else {
            if current.len() > 1 {
                groups.push(std::mem::take(&mut current));
            }
            current = vec![id];
        }
    }
    if current.len() > 1 {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::Point3;

    #[test]
    fn near_nodes_group_together() {
        let mut ctx = FeModelContext::new();
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(0.05, 0.0, 0.0));
        ctx.nodes.add_or_get(Point3::new(5.0, 0.0, 0.0));
        let c = ctx.nodes.add_or_get(Point3::new(9.0, 1.0, 0.0));
        let d = ctx.nodes.add_or_get(Point3::new(9.0, 1.0, 0.01));

        let groups = find_coincident_groups(&ctx, 0.1);
        assert_eq!(groups, vec![vec![a, b], vec![c, d]]);
    }

    #[test]
    fn empty_and_sparse_models_have_no_groups() {
        let mut ctx = FeModelContext::new();
        assert!(find_coincident_groups(&ctx, 0.1).is_empty());
        ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        ctx.nodes.add_or_get(Point3::new(1.0, 0.0, 0.0));
        assert!(find_coincident_groups(&ctx, 0.1).is_empty());
    }
}
