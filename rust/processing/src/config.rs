// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration.
//!
//! [`HealConfig`] groups one options struct per modifier plus sanity and
//! pipeline settings. Every field has a default, so a JSON config file only
//! needs the values it changes:
//!
//! ```json
//! { "extend": { "extra_margin": 30.0 }, "pipeline": { "target_stage": 4 } }
//! ```
//!
//! `BEAMHEAL_TARGET_STAGE` and `BEAMHEAL_MAX_ITERATIONS` override the
//! pipeline section from the environment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Index of the last pipeline stage.
pub const LAST_STAGE: usize = 6;

/// Split elements at existing nodes lying on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitByNodesOptions {
    /// Maximum perpendicular distance from the element line.
    pub distance_tol: f64,
    /// Hits this close to `t = 0` or `t = 1` are ignored.
    pub param_tol: f64,
    /// Hits closer than this along the axis are merged, and hits this close
    /// to an endpoint are ignored.
    pub merge_tol_along: f64,
    /// Fragments shorter than this are not created.
    pub min_seg_len: f64,
    pub grid_cell_size: f64,
}

impl Default for SplitByNodesOptions {
    fn default() -> Self {
        Self {
            distance_tol: 1.0,
            param_tol: 1e-9,
            merge_tol_along: 0.05,
            min_seg_len: 1e-6,
            grid_cell_size: 5.0,
        }
    }
}

/// Split crossing element pairs at their crossing point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionSplitOptions {
    /// Maximum gap between the two members at the crossing. Crossings
    /// closer than this to an endpoint are left to node splitting.
    pub distance_tol: f64,
    pub min_seg_len: f64,
}

impl Default for IntersectionSplitOptions {
    fn default() -> Self {
        Self {
            distance_tol: 1.0,
            min_seg_len: 1e-6,
        }
    }
}

/// Remove short elements hanging off a free end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanglingShortOptions {
    pub length_threshold: f64,
}

impl Default for DanglingShortOptions {
    fn default() -> Self {
        Self {
            length_threshold: 50.0,
        }
    }
}

/// Collapse elements shorter than a tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortCollapseOptions {
    pub tolerance: f64,
}

impl Default for ShortCollapseOptions {
    fn default() -> Self {
        Self { tolerance: 1.0 }
    }
}

/// Merge free ends into nearby nodes on their own member axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollinearMergeOptions {
    pub distance_tolerance: f64,
    pub angle_tolerance_deg: f64,
}

impl Default for CollinearMergeOptions {
    fn default() -> Self {
        Self {
            distance_tolerance: 30.0,
            angle_tolerance_deg: 3.0,
        }
    }
}

/// Extend free ends along their member axis onto other members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendOptions {
    /// Added to the target's largest section dimension to get the search
    /// radius.
    pub extra_margin: f64,
    /// Moves shorter than this are not moves.
    pub min_extension: f64,
    /// Slack on the target segment parameter beyond [0, 1].
    pub t_slack: f64,
    /// A hit this close to a target endpoint merges into that node.
    pub endpoint_merge_tol: f64,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        Self {
            extra_margin: 20.0,
            min_extension: 1e-4,
            t_slack: 1e-4,
            endpoint_merge_tol: 1.0,
        }
    }
}

/// Translate detached element groups onto the main structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTranslationOptions {
    pub extra_margin: f64,
    /// Offsets shorter than this are ignored.
    pub min_offset: f64,
    pub endpoint_merge_tol: f64,
}

impl Default for GroupTranslationOptions {
    fn default() -> Self {
        Self {
            extra_margin: 50.0,
            min_offset: 1e-4,
            endpoint_merge_tol: 1.0,
        }
    }
}

/// Stitch remaining free ends with rigid links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbeOptions {
    pub extra_margin: f64,
    pub t_slack: f64,
    /// Free ends already this close to a member are left alone.
    pub min_distance: f64,
    /// A foot of perpendicular this close to an endpoint of its member, or
    /// to a master already placed on that member, reuses that node. Stage 6
    /// raises it to at least `split_by_nodes.merge_tol_along`.
    pub endpoint_snap_tol: f64,
}

impl Default for RbeOptions {
    fn default() -> Self {
        Self {
            extra_margin: 5.0,
            t_slack: 1e-4,
            min_distance: 1e-4,
            endpoint_snap_tol: 0.05,
        }
    }
}

/// Settings of the sanity inspector run after every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityOptions {
    /// Elements shorter than this are reported.
    pub short_threshold: f64,
    /// Nodes closer than this are reported as coincident.
    pub equivalence_tol: f64,
    /// Delete orphan nodes.
    pub remove_orphans: bool,
    /// Delete elements and rigids with dangling references.
    pub repair_integrity: bool,
    /// Maximum number of IDs listed per finding in the log.
    pub max_listed: usize,
}

impl Default for SanityOptions {
    fn default() -> Self {
        Self {
            short_threshold: 1.0,
            equivalence_tol: 0.1,
            remove_orphans: true,
            repair_integrity: true,
            max_listed: 10,
        }
    }
}

/// Stage selection and convergence limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Last stage to run (0 to 6).
    pub target_stage: usize,
    /// Iteration cap of the convergence loops.
    pub max_iterations: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_stage: LAST_STAGE,
            max_iterations: 10,
        }
    }
}

/// Full configuration of a repair run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    pub split_by_nodes: SplitByNodesOptions,
    pub intersection_split: IntersectionSplitOptions,
    pub dangling_short: DanglingShortOptions,
    pub short_collapse: ShortCollapseOptions,
    pub collinear_merge: CollinearMergeOptions,
    pub extend: ExtendOptions,
    pub group_translation: GroupTranslationOptions,
    pub rbe: RbeOptions,
    pub sanity: SanityOptions,
    pub pipeline: PipelineOptions,
}

impl HealConfig {
    /// Parses a JSON configuration. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Applies `BEAMHEAL_TARGET_STAGE` and `BEAMHEAL_MAX_ITERATIONS` from
    /// the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key/value source.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("BEAMHEAL_TARGET_STAGE") {
            self.pipeline.target_stage = parse_env("BEAMHEAL_TARGET_STAGE", &v)?;
        }
        if let Some(v) = lookup("BEAMHEAL_MAX_ITERATIONS") {
            self.pipeline.max_iterations = parse_env("BEAMHEAL_MAX_ITERATIONS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects settings no stage can run with.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.target_stage > LAST_STAGE {
            return Err(Error::InvalidConfig(format!(
                "target_stage {} is beyond the last stage {LAST_STAGE}",
                self.pipeline.target_stage
            )));
        }
        if self.pipeline.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be at least 1".into()));
        }
        let tolerances = [
            ("split_by_nodes.distance_tol", self.split_by_nodes.distance_tol),
            ("split_by_nodes.grid_cell_size", self.split_by_nodes.grid_cell_size),
            ("intersection_split.distance_tol", self.intersection_split.distance_tol),
            ("dangling_short.length_threshold", self.dangling_short.length_threshold),
            ("short_collapse.tolerance", self.short_collapse.tolerance),
            ("collinear_merge.distance_tolerance", self.collinear_merge.distance_tolerance),
            ("collinear_merge.angle_tolerance_deg", self.collinear_merge.angle_tolerance_deg),
            ("extend.extra_margin", self.extend.extra_margin),
            ("group_translation.extra_margin", self.group_translation.extra_margin),
            ("rbe.extra_margin", self.rbe.extra_margin),
            ("sanity.short_threshold", self.sanity.short_threshold),
            ("sanity.equivalence_tol", self.sanity.equivalence_tol),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_env(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key}={value:?} is not a non-negative integer")))
}
