// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # beamheal processing
//!
//! Topology repair for line-element models built from member lists.
//!
//! Members exported from a design system rarely meet exactly: ends stop
//! short of the member they should frame into, cross without a shared
//! node, or leave tiny stubs behind. This crate rewrites such a model into
//! a connected solver mesh in a fixed sequence of stages and exports a
//! snapshot after each one.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use beamheal_processing::{ingest, BdfSink, HealConfig, Pipeline};
//!
//! let records = ingest::read_members_csv("members.csv")?;
//! let mut ctx = ingest::build_context(&records);
//! let report = Pipeline::new(HealConfig::default()).run(&mut ctx, BdfSink::new("out"))?;
//! println!("{} free ends left", report.free_end_nodes().len());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod inspect;
pub mod modifiers;
pub mod pipeline;

pub use config::{HealConfig, LAST_STAGE};
pub use error::{Error, Result};
pub use export::{BdfSink, JsonSink, NullSink, SnapshotSink, StageSnapshot};
pub use inspect::SanityReport;
pub use pipeline::{stage_label, Pipeline, PipelineReport, StageSummary};
