// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element provenance and local-axis overrides.

use serde::{Deserialize, Serialize};

/// Metadata attached to an element.
///
/// Every field is optional. Fragments produced by splitting inherit a clone
/// of their parent's metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementMeta {
    /// Section type tag as it appeared in the source data (e.g. `ANG`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_type: Option<String>,
    /// Section code after mapping to the FE shape set (e.g. `L`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fe_type: Option<String>,
    /// Name of the member the element was generated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Local-axis orientation vector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<[f64; 3]>,
}

impl ElementMeta {
    /// Creates metadata for a member with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source_name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_types(mut self, origin: impl Into<String>, fe: impl Into<String>) -> Self {
        self.origin_type = Some(origin.into());
        self.fe_type = Some(fe.into());
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: [f64; 3]) -> Self {
        self.orientation = Some(orientation);
        self
    }
}
