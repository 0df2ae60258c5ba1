// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multi-run aggregation CLI
//!
//! Summarizes the per-run result files of the semantic hashing baseline
//! into best-of-N and average-of-N blocks, one report file per
//! degradation condition.

use anyhow::Result;
use clap::Parser;
use intent_eval::aggregate::{self, RunCondition};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aggregate-runs")]
#[command(about = "Aggregate per-run result files into best/average summaries")]
#[command(version)]
struct Args {
    /// Directory containing the per-run result subdirectories
    #[arg(long)]
    runs_dir: PathBuf,

    /// Number of runs per condition
    #[arg(long, default_value_t = 10)]
    runs: usize,

    /// Dataset names to aggregate (repeatable)
    #[arg(long = "dataset-name", required = true)]
    dataset_names: Vec<String>,

    /// Conditions to aggregate: corr, inc, inc_with_corr. Defaults to all.
    #[arg(long = "condition", value_parser = parse_condition)]
    conditions: Vec<RunCondition>,
}

fn parse_condition(s: &str) -> Result<RunCondition, String> {
    RunCondition::parse(s)
        .ok_or_else(|| format!("unknown condition '{}' (expected corr, inc or inc_with_corr)", s))
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        tracing::error!(error = %err, "aggregation failed");
        for cause in err.chain().skip(1) {
            tracing::error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let conditions = if args.conditions.is_empty() {
        RunCondition::ALL.to_vec()
    } else {
        args.conditions.clone()
    };

    for condition in conditions {
        let path = aggregate::write_condition_report(
            &args.runs_dir,
            condition,
            &args.dataset_names,
            args.runs,
        )?;
        println!("{}: {}", condition, path.display());
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
