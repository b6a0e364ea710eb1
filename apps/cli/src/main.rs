// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! beamheal - repairs the topology of a member list and writes one solver
//! deck per pipeline stage.
//!
//! ```text
//! beamheal members.csv --out decks --stage 4 --config heal.json --json
//! ```
//!
//! Log output is controlled with `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use beamheal_processing::{ingest, BdfSink, HealConfig, JsonSink, Pipeline, SnapshotSink};
use clap::Parser;

#[derive(Parser)]
#[command(name = "beamheal")]
#[command(about = "Topology repair for line-element FE models", long_about = None)]
struct Cli {
    /// Member table (CSV)
    input: PathBuf,

    /// Directory for stage snapshots [default: the input's directory]
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Last stage to run (0 to 6), overriding the configuration
    #[arg(short, long)]
    stage: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write a JSON model snapshot per stage
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,beamheal_processing=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "beamheal failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let out_dir = cli
        .out
        .clone()
        .unwrap_or_else(|| default_out_dir(&cli.input));

    tracing::info!(
        input = %cli.input.display(),
        out = %out_dir.display(),
        target_stage = config.pipeline.target_stage,
        json = cli.json,
        "Starting beamheal"
    );

    let records = ingest::read_members_csv(&cli.input)?;
    let mut ctx = ingest::build_context(&records);

    let mut sinks: Vec<Box<dyn SnapshotSink>> = vec![Box::new(BdfSink::new(&out_dir))];
    if cli.json {
        sinks.push(Box::new(JsonSink::new(&out_dir)));
    }

    let report = Pipeline::new(config).run(&mut ctx, sinks)?;

    let summary = ctx.summary();
    tracing::info!(
        stages = report.stages.len(),
        nodes = summary.nodes,
        elements = summary.elements,
        rigids = summary.rigids,
        free_ends = report.free_end_nodes().len(),
        "Finished"
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<HealConfig> {
    let config = match &cli.config {
        Some(path) => HealConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HealConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(stage) = cli.stage {
        config.pipeline.target_stage = stage;
        config.validate()?;
    }
    Ok(config)
}

fn default_out_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_input_directory() {
        assert_eq!(default_out_dir(Path::new("model/members.csv")), PathBuf::from("model"));
        assert_eq!(default_out_dir(Path::new("members.csv")), PathBuf::from("."));
    }

    #[test]
    fn arguments_parse() {
        let cli = Cli::try_parse_from(["beamheal", "m.csv", "--stage", "3", "--json"]).unwrap();
        assert_eq!(cli.stage, Some(3));
        assert!(cli.json);
        assert!(cli.out.is_none());

        let config = load_config(&cli).unwrap();
        assert_eq!(config.pipeline.target_stage, 3);
    }

    #[test]
    fn stage_beyond_pipeline_is_rejected() {
        let cli = Cli::try_parse_from(["beamheal", "m.csv", "--stage", "9"]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
