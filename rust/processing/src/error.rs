// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the repair pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, repairing or exporting a model.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] beamheal_topology::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("export of {stage} failed: {message}")]
    Export { stage: String, message: String },

    #[error("stage {index} ({label}) failed: {source}")]
    Stage {
        index: usize,
        label: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Display text followed by every cause not already part of it, joined
    /// with `": "`.
    pub fn chain_message(&self) -> String {
        let mut text = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(inner) = cause {
            let part = inner.to_string();
            if !text.contains(&part) {
                text.push_str(": ");
                text.push_str(&part);
            }
            cause = inner.source();
        }
        text
    }

    /// Wraps an error raised inside a pipeline stage.
    pub fn stage(index: usize, label: impl Into<String>, source: Error) -> Self {
        Error::Stage {
            index,
            label: label.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::NodeId;

    #[test]
    fn stage_error_names_stage_and_cause() {
        let inner = Error::from(beamheal_topology::Error::NotFound(NodeId::new(3).into()));
        let err = Error::stage(4, "STAGE_04", inner);
        assert_eq!(err.to_string(), "stage 4 (STAGE_04) failed: node 3 not found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn chain_message_lists_each_cause_once() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::stage(2, "STAGE_02", Error::from(io));
        assert_eq!(
            err.chain_message(),
            "stage 2 (STAGE_02) failed: I/O error: disk full"
        );
    }

    #[test]
    fn missing_input_shows_path() {
        let err = Error::MissingInput(PathBuf::from("members.csv"));
        assert_eq!(err.to_string(), "input file not found: members.csv");
    }
}
