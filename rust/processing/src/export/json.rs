// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use super::{stage_path, write_file, SnapshotSink, StageSnapshot};
use crate::error::Result;

/// Writes `<dir>/<label>.json` with the full model snapshot.
#[derive(Debug, Clone)]
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SnapshotSink for JsonSink {
    fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
        let path = stage_path(&self.dir, snapshot.label, "json")?;
        let json = snapshot.context.to_json()?;
        write_file(&path, snapshot.label, &json)
    }
}
