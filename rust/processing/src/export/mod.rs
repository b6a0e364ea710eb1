// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-stage snapshot output.
//!
//! The pipeline hands every finished stage to a [`SnapshotSink`]. The sinks
//! here write one file per stage into a directory; tests use in-memory sinks.

mod bdf;
mod json;

use std::path::{Path, PathBuf};

use beamheal_topology::{FeModelContext, NodeId};

pub use bdf::{render_deck, BdfSink};
pub use json::JsonSink;

use crate::error::{Error, Result};

/// A model as it stands after one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageSnapshot<'a> {
    pub index: usize,
    /// `STAGE_00`, `STAGE_01`, ...
    pub label: &'a str,
    pub context: &'a FeModelContext,
    /// Free ends reported by the sanity check, used for boundary conditions.
    pub free_end_nodes: &'a [NodeId],
}

/// Receives one snapshot per pipeline stage.
pub trait SnapshotSink {
    fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()>;
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for &mut S {
    fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
        (**self).write_stage(snapshot)
    }
}

impl SnapshotSink for Vec<Box<dyn SnapshotSink>> {
    fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
        for sink in self.iter_mut() {
            sink.write_stage(snapshot)?;
        }
        Ok(())
    }
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_stage(&mut self, _snapshot: &StageSnapshot<'_>) -> Result<()> {
        Ok(())
    }
}

/// Creates `dir` if needed and returns `dir/<label>.<ext>`.
fn stage_path(dir: &Path, label: &str, ext: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::Export {
        stage: label.to_string(),
        message: format!("cannot create {}: {e}", dir.display()),
    })?;
    Ok(dir.join(format!("{label}.{ext}")))
}

fn write_file(path: &Path, label: &str, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| Error::Export {
        stage: label.to_string(),
        message: format!("cannot write {}: {e}", path.display()),
    })?;
    tracing::debug!(stage = label, path = %path.display(), bytes = contents.len(), "wrote snapshot");
    Ok(())
}
