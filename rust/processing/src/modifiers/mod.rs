// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric repair operations on a [`beamheal_topology::FeModelContext`].
//!
//! Every modifier takes an ID snapshot up front, rebuilds whatever spatial
//! index it needs from the current model, mutates in place and returns a
//! small report.

mod chain;
pub mod collinear_merge;
pub mod dangling_short;
pub mod extend;
pub mod group_translation;
pub mod intersection_split;
pub mod rbe;
pub mod short_collapse;
pub mod split_by_nodes;

pub use collinear_merge::merge_collinear_nodes;
pub use dangling_short::remove_dangling_short;
pub use extend::{extend_free_ends, ExtendReport};
pub use group_translation::{translate_groups, TranslationReport};
pub use intersection_split::{split_intersections, IntersectionReport};
pub use rbe::{stitch_free_ends, RbeReport};
pub use short_collapse::{collapse_short_elements, CollapseReport};
pub use split_by_nodes::{split_by_existing_nodes, SplitReport};
