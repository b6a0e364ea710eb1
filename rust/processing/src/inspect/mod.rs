// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model checks run between pipeline stages.
//!
//! The individual checks are read-only except [`integrity`], which deletes
//! what it finds. [`sanity`] runs them in order and removes orphan nodes.

pub mod duplicates;
pub mod equivalence;
pub mod integrity;
pub mod isolation;
pub mod sanity;
pub mod short;

use std::fmt::{Display, Write};

pub use duplicates::find_duplicate_groups;
pub use equivalence::find_coincident_groups;
pub use integrity::{find_invalid_elements, find_invalid_rigids, repair_integrity, IntegrityRepair};
pub use isolation::find_isolated_elements;
pub use sanity::{inspect, SanityReport};
pub use short::{find_short_elements, ShortElement};

/// Joins at most `limit` IDs, appending `...` when the list is longer.
pub(crate) fn summarize_ids<T: Display>(ids: &[T], limit: usize) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().take(limit).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{id}");
    }
    if ids.len() > limit {
        out.push_str(", ...");
    }
    out
}
