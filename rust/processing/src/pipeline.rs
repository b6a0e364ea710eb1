// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Staged repair pipeline.
//!
//! Stages are cumulative: running through stage `n` applies stages `0..=n`
//! to the same model. Every stage ends with a sanity inspection and a
//! snapshot, so the baseline is exported as well.
//!
//! | Stage | Work |
//! |---|---|
//! | 0 | baseline |
//! | 1 | split at existing nodes |
//! | 2 | split, intersection split, dangling short removal |
//! | 3 | stage 2 work, short collapse, collinear merge (the heal set) |
//! | 4 | extend free ends until nothing moves, healing after each sweep |
//! | 5 | translate detached groups, then heal and extend, until nothing moves |
//! | 6 | rigid links for the remaining free ends, then split |

use beamheal_topology::{FeModelContext, ModelSummary, NodeId};
use tracing::{error, info, info_span, warn};

use crate::config::{HealConfig, RbeOptions, LAST_STAGE};
use crate::error::{Error, Result};
use crate::export::{SnapshotSink, StageSnapshot};
use crate::inspect::{inspect, SanityReport};
use crate::modifiers::{
    collapse_short_elements, extend_free_ends, merge_collinear_nodes, remove_dangling_short,
    split_by_existing_nodes, split_intersections, stitch_free_ends, translate_groups,
};

/// `STAGE_00`, `STAGE_01`, ...
pub fn stage_label(index: usize) -> String {
    format!("STAGE_{index:02}")
}

/// What one stage did.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub index: usize,
    pub label: String,
    /// Outer iterations of the stage's convergence loop, 1 for plain stages.
    pub iterations: usize,
    /// Modifier changes (splits, removals, merges, moves, links) summed
    /// over the stage.
    pub changes: usize,
    /// Model size after the sanity inspection.
    pub model: ModelSummary,
    pub sanity: SanityReport,
}

/// Per-stage summaries of a run, in stage order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub stages: Vec<StageSummary>,
}

impl PipelineReport {
    pub fn last(&self) -> Option<&StageSummary> {
        self.stages.last()
    }

    /// Free ends after the last completed stage.
    pub fn free_end_nodes(&self) -> &[NodeId] {
        self.last()
            .map(|s| s.sanity.free_end_nodes.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StageWork {
    iterations: usize,
    changes: usize,
}

impl StageWork {
    fn once(changes: usize) -> Self {
        Self {
            iterations: 1,
            changes,
        }
    }
}

/// Runs the repair stages with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: HealConfig,
}

impl Pipeline {
    pub fn new(config: HealConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HealConfig {
        &self.config
    }

    /// Runs through the configured target stage.
    pub fn run(&self, ctx: &mut FeModelContext, sink: impl SnapshotSink) -> Result<PipelineReport> {
        self.run_through(ctx, self.config.pipeline.target_stage, sink)
    }

    /// Applies stages `0..=target` and hands each result to `sink`.
    ///
    /// A failing stage aborts the run with [`Error::Stage`]. Snapshots of
    /// the stages before it have already been written.
    pub fn run_through(
        &self,
        ctx: &mut FeModelContext,
        target: usize,
        mut sink: impl SnapshotSink,
    ) -> Result<PipelineReport> {
        if target > LAST_STAGE {
            return Err(Error::InvalidConfig(format!(
                "target stage {target} is beyond the last stage {LAST_STAGE}"
            )));
        }

        let mut report = PipelineReport::default();
        for index in 0..=target {
            let label = stage_label(index);
            let _span = info_span!("stage", index, label = %label).entered();

            match self.complete_stage(ctx, index, &label, &mut sink) {
                Ok(summary) => report.stages.push(summary),
                Err(e) => {
                    error!(
                        stage = index,
                        label = %label,
                        error = %e.chain_message(),
                        "stage failed"
                    );
                    return Err(Error::stage(index, label, e));
                }
            }
        }
        Ok(report)
    }

    fn complete_stage(
        &self,
        ctx: &mut FeModelContext,
        index: usize,
        label: &str,
        sink: &mut impl SnapshotSink,
    ) -> Result<StageSummary> {
        let work = self.apply_stage(ctx, index)?;
        let sanity = inspect(ctx, &self.config.sanity);
        sink.write_stage(&StageSnapshot {
            index,
            label,
            context: ctx,
            free_end_nodes: &sanity.free_end_nodes,
        })?;

        let model = ctx.summary();
        info!(
            iterations = work.iterations,
            changes = work.changes,
            nodes = model.nodes,
            elements = model.elements,
            rigids = model.rigids,
            free_ends = sanity.free_end_nodes.len(),
            "stage finished"
        );
        Ok(StageSummary {
            index,
            label: label.to_string(),
            iterations: work.iterations,
            changes: work.changes,
            model,
            sanity,
        })
    }

    fn apply_stage(&self, ctx: &mut FeModelContext, index: usize) -> Result<StageWork> {
        match index {
            0 => Ok(StageWork::once(0)),
            1 => self.split(ctx).map(StageWork::once),
            2 => self.split_and_prune(ctx).map(StageWork::once),
            3 => self.heal(ctx).map(StageWork::once),
            4 => self.extend_until_stable(ctx),
            5 => self.translate_until_stable(ctx),
            6 => self.stitch(ctx).map(StageWork::once),
            _ => Err(Error::InvalidConfig(format!("unknown stage {index}"))),
        }
    }

    fn split(&self, ctx: &mut FeModelContext) -> Result<usize> {
        Ok(split_by_existing_nodes(ctx, &self.config.split_by_nodes)?.split)
    }

    fn split_and_prune(&self, ctx: &mut FeModelContext) -> Result<usize> {
        let mut changes = self.split(ctx)?;
        changes += split_intersections(ctx, &self.config.intersection_split)?.split;
        changes += remove_dangling_short(ctx, &self.config.dangling_short).len();
        Ok(changes)
    }

    /// The heal set: split and prune, then collapse short elements and merge
    /// collinear free ends.
    fn heal(&self, ctx: &mut FeModelContext) -> Result<usize> {
        let mut changes = self.split_and_prune(ctx)?;
        changes += collapse_short_elements(ctx, &self.config.short_collapse)?.collapsed;
        changes += merge_collinear_nodes(ctx, &self.config.collinear_merge)?;
        Ok(changes)
    }

    fn extend_until_stable(&self, ctx: &mut FeModelContext) -> Result<StageWork> {
        let cap = self.config.pipeline.max_iterations;
        let mut work = StageWork::default();
        loop {
            work.iterations += 1;
            let moved = extend_free_ends(ctx, &self.config.extend)?.moved();
            if moved == 0 {
                break;
            }
            work.changes += moved + self.heal(ctx)?;
            if work.iterations >= cap {
                warn!(cap, moved, "free end extension did not settle");
                break;
            }
        }
        Ok(work)
    }

    fn translate_until_stable(&self, ctx: &mut FeModelContext) -> Result<StageWork> {
        let cap = self.config.pipeline.max_iterations;
        let mut work = StageWork::default();
        loop {
            work.iterations += 1;
            let translated = translate_groups(ctx, &self.config.group_translation)?.translated;
            if translated == 0 {
                break;
            }
            work.changes += translated + self.heal(ctx)?;
            work.changes += self.extend_until_stable(ctx)?.changes;
            if work.iterations >= cap {
                warn!(cap, translated, "group translation did not settle");
                break;
            }
        }
        Ok(work)
    }

    /// Rigid links, then a split so every new master lies on its member.
    fn stitch(&self, ctx: &mut FeModelContext) -> Result<usize> {
        let opts = RbeOptions {
            endpoint_snap_tol: self
                .config
                .rbe
                .endpoint_snap_tol
                .max(self.config.split_by_nodes.merge_tol_along),
            ..self.config.rbe.clone()
        };
        let created = stitch_free_ends(ctx, &opts).created.len();
        if created == 0 {
            return Ok(0);
        }
        Ok(created + self.split(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::NullSink;
    use beamheal_topology::{CrossSection, Element, ElementMeta, Point3};

    #[derive(Default)]
    struct Labels(Vec<String>);

    impl SnapshotSink for Labels {
        fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
            self.0.push(snapshot.label.to_string());
            Ok(())
        }
    }

    /// Fails on one stage, records the others.
    struct FailAt(usize, Vec<usize>);

    impl SnapshotSink for FailAt {
        fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
            if snapshot.index == self.0 {
                return Err(Error::Export {
                    stage: snapshot.label.to_string(),
                    message: "disk full".into(),
                });
            }
            self.1.push(snapshot.index);
            Ok(())
        }
    }

    fn frame() -> FeModelContext {
        let mut ctx = FeModelContext::new();
        let m = ctx.materials.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
        let p = ctx.properties.add_or_get(CrossSection::Rod, &[10.0], m);
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(1000.0, 0.0, 0.0));
        let c = ctx.nodes.add_or_get(Point3::new(1000.0, 1000.0, 0.0));
        ctx.elements.add_new(Element::new(a, b, p, ElementMeta::default()));
        ctx.elements.add_new(Element::new(b, c, p, ElementMeta::default()));
        ctx
    }

    #[test]
    fn labels_are_zero_padded() {
        assert_eq!(stage_label(0), "STAGE_00");
        assert_eq!(stage_label(6), "STAGE_06");
    }

    #[test]
    fn every_stage_is_exported_including_baseline() {
        let mut ctx = frame();
        let mut sink = Labels::default();
        let report = Pipeline::default()
            .run_through(&mut ctx, LAST_STAGE, &mut sink)
            .unwrap();

        let expected: Vec<String> = (0..=LAST_STAGE).map(stage_label).collect();
        assert_eq!(sink.0, expected);
        assert_eq!(report.stages.len(), LAST_STAGE + 1);
        assert_eq!(report.stages[0].changes, 0);
    }

    #[test]
    fn clean_model_passes_unchanged() {
        let mut ctx = frame();
        let before = ctx.to_snapshot();
        let report = Pipeline::default().run_through(&mut ctx, 5, NullSink).unwrap();

        assert_eq!(ctx.to_snapshot(), before);
        assert!(report.stages.iter().all(|s| s.changes == 0));
        assert_eq!(report.free_end_nodes().len(), 2);
    }

    #[test]
    fn target_beyond_last_stage_is_rejected() {
        let mut ctx = frame();
        let err = Pipeline::default()
            .run_through(&mut ctx, LAST_STAGE + 1, NullSink)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn failing_stage_keeps_earlier_snapshots() {
        let mut ctx = frame();
        let mut sink = FailAt(2, Vec::new());
        let err = Pipeline::default()
            .run_through(&mut ctx, LAST_STAGE, &mut sink)
            .unwrap_err();

        assert!(matches!(err, Error::Stage { index: 2, .. }));
        assert_eq!(sink.1, vec![0, 1]);
    }
}
