// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation pipeline CLI for hosted intent classifiers
//!
//! Usage:
//!   intent-eval --project-id newagent --endpoint http://localhost:8080 --perc 0.1
//!   intent-eval --project-id newagent --endpoint http://localhost:8080 --perc 0.0 --skip-cleanup

use anyhow::{Context, Result};
use clap::Parser;
use intent_eval::classifier::{ClassifierConfig, RestClassifier};
use intent_eval::cleanup::{self, IntentSessionManifest};
use intent_eval::datasets::{CorruptionLevel, IntentLabelSet};
use intent_eval::pipeline::{EvaluationConfig, EvaluationPipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intent-eval")]
#[command(about = "Evaluate a hosted intent classifier on degraded datasets")]
#[command(version)]
struct Args {
    /// Project/agent id on the remote service
    #[arg(long)]
    project_id: String,

    /// Identifier of the detect-intent session. Defaults to a random UUID.
    #[arg(long)]
    session_id: Option<String>,

    /// Language code of the queries
    #[arg(long, default_value = "en-US")]
    language_code: String,

    /// Dataset to evaluate (key into the labels file)
    #[arg(long, default_value = "snips")]
    dataset_name: String,

    /// Root directory of the precomputed dataset variants
    #[arg(long, default_value = "./data/snips_intent_data")]
    data_dir: PathBuf,

    /// JSON file mapping dataset name to its intent label set
    #[arg(long, default_value = "./intention_tags.json")]
    labels_file: PathBuf,

    /// Results directory
    #[arg(long, default_value = "./results")]
    results_dir: PathBuf,

    /// JSON file containing intent session IDs, consumed during cleanup
    #[arg(long, default_value = "./intent_session_ids.json")]
    intent_session_ids_file: PathBuf,

    /// Percentage of missing words: 0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.8
    #[arg(long, default_value_t = 0.1)]
    perc: f64,

    /// Base URL of the detect-intent service
    #[arg(long)]
    endpoint: String,

    /// Path to the service account credentials file
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Leave remote intents in place after the evaluation
    #[arg(long)]
    skip_cleanup: bool,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        tracing::error!(error = %err, "evaluation failed");
        for cause in err.chain().skip(1) {
            tracing::error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let corruption = CorruptionLevel::from_fraction(args.perc).with_context(|| {
        format!(
            "unsupported missing-word percentage {} (supported: 0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.8)",
            args.perc
        )
    })?;

    let session_id = args
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!("Dataset: {} ({})", args.dataset_name, corruption.results_dir_name());
    tracing::info!("Session: {}", session_id);

    let labels = IntentLabelSet::from_config(&args.labels_file, &args.dataset_name)?;

    let classifier = RestClassifier::new(ClassifierConfig {
        endpoint: args.endpoint,
        project_id: args.project_id,
        session_id,
        language_code: args.language_code,
        credentials_path: args.credentials,
    })?;

    let config = EvaluationConfig {
        dataset_name: args.dataset_name.clone(),
        data_dir: args.data_dir,
        results_dir: args.results_dir,
        corruption,
    };

    let pipeline = EvaluationPipeline::new(config, labels);
    let outcome = pipeline.run(&classifier)?;

    println!(
        "Results for {} dataset ({}, {} examples)",
        args.dataset_name,
        corruption.results_dir_name(),
        outcome.examples
    );
    print!("{}", outcome.report.format());
    println!("report:    {}", outcome.report_path.display());

    if args.skip_cleanup {
        tracing::info!("Skipping intent cleanup");
        return Ok(());
    }

    let manifest = IntentSessionManifest::from_path(&args.intent_session_ids_file)?;
    tracing::info!("Deleting {} intents", manifest.intent_session_ids.len());
    let deleted = cleanup::delete_intents(&classifier, &manifest);
    tracing::info!(
        "Deleted {} of {} intents",
        deleted,
        manifest.intent_session_ids.len()
    );

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
