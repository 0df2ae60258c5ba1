// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multi-run aggregation for the semantic hashing baseline
//!
//! Each experiment run leaves a result file of newline-delimited
//! `label: value` records; the run's metric is the best value it
//! reports. Aggregation over a fixed number of runs yields the average
//! and best metric per condition and dataset.

use anyhow::{ensure, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Degradation conditions the baseline experiment is run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCondition {
    /// Corrupted input words
    Corrupted,
    /// Incomplete input (missing words)
    Incomplete,
    /// Both incomplete and corrupted input
    IncompleteWithCorrupted,
}

impl RunCondition {
    pub const ALL: [RunCondition; 3] = [
        RunCondition::Corrupted,
        RunCondition::Incomplete,
        RunCondition::IncompleteWithCorrupted,
    ];

    /// The condition tag as it appears in run directory names and the
    /// per-condition report file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunCondition::Corrupted => "corr",
            RunCondition::Incomplete => "inc",
            RunCondition::IncompleteWithCorrupted => "inc_with_corr",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate over a fixed number of runs for one condition and dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregate {
    pub dataset: String,
    pub runs: usize,
    pub average: f64,
    pub best: f64,
}

impl RunAggregate {
    /// Text block as it appears in the per-condition report file.
    pub fn format_block(&self) -> String {
        format!(
            "{}\n  Avg-{}: {:.2}\n  Best-{}: {:.2}\n\n",
            self.dataset,
            self.runs,
            self.average * 100.0,
            self.runs,
            self.best * 100.0
        )
    }
}

/// Result file left by one run:
/// `<runs_dir>/<condition>_run<k>/<dataset>_f1.txt`
pub fn run_file_path(
    runs_dir: &Path,
    condition: RunCondition,
    run: usize,
    dataset: &str,
) -> PathBuf {
    runs_dir
        .join(format!("{}_run{}", condition.as_str(), run))
        .join(format!("{}_f1.txt", dataset))
}

/// Best value recorded in one run file. A run may report several
/// candidate readings (checkpoints); the run's metric is the best one
/// seen. Empty lines and records with an empty value field are skipped,
/// not parsed as zero; anything else unparseable is fatal.
pub fn run_metric(path: &Path) -> Result<f64> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read run file: {}", path.display()))?;

    let mut best = 0.0_f64;
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (_, value) = line.split_once(':').with_context(|| {
            format!("malformed record at line {} in {}", idx + 1, path.display())
        })?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let value: f64 = value.parse().with_context(|| {
            format!(
                "invalid metric value '{}' at line {} in {}",
                value,
                idx + 1,
                path.display()
            )
        })?;
        best = best.max(value);
    }

    Ok(best)
}

/// Aggregate over exactly `runs` run files. A missing or unreadable run
/// file is fatal: the aggregation assumes the full set of artifacts.
pub fn aggregate_runs(
    runs_dir: &Path,
    condition: RunCondition,
    dataset: &str,
    runs: usize,
) -> Result<RunAggregate> {
    ensure!(runs > 0, "run count must be positive");

    let mut sum = 0.0;
    let mut best = 0.0_f64;
    for run in 1..=runs {
        let path = run_file_path(runs_dir, condition, run, dataset);
        let metric = run_metric(&path)?;
        tracing::debug!("{} {} run {}: {:.4}", condition, dataset, run, metric);
        sum += metric;
        best = best.max(metric);
    }

    Ok(RunAggregate {
        dataset: dataset.to_string(),
        runs,
        average: sum / runs as f64,
        best,
    })
}

/// Aggregate every dataset under one condition and write the report file
/// (named after the condition) into `runs_dir`.
pub fn write_condition_report(
    runs_dir: &Path,
    condition: RunCondition,
    datasets: &[String],
    runs: usize,
) -> Result<PathBuf> {
    let mut out = String::new();
    for dataset in datasets {
        let aggregate = aggregate_runs(runs_dir, condition, dataset, runs)?;
        tracing::info!(
            "{} / {}: Avg-{} {:.2}, Best-{} {:.2}",
            condition,
            dataset,
            runs,
            aggregate.average * 100.0,
            runs,
            aggregate.best * 100.0
        );
        out.push_str(&aggregate.format_block());
    }

    let path = runs_dir.join(condition.as_str());
    fs::write(&path, &out)
        .with_context(|| format!("failed to write aggregate report: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_run_file(runs_dir: &Path, condition: RunCondition, run: usize, body: &str) {
        let path = run_file_path(runs_dir, condition, run, "sentiment140");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_condition_tags() {
        assert_eq!(RunCondition::Corrupted.as_str(), "corr");
        assert_eq!(RunCondition::IncompleteWithCorrupted.as_str(), "inc_with_corr");
        assert_eq!(RunCondition::parse("inc"), Some(RunCondition::Incomplete));
        assert_eq!(RunCondition::parse("bogus"), None);
    }

    #[test]
    fn test_run_metric_takes_max_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        write_run_file(
            dir.path(),
            RunCondition::Incomplete,
            1,
            "epoch_1: 0.71\n\nepoch_2: 0.83\nepoch_3: \nepoch_4: 0.79\n",
        );

        let path = run_file_path(dir.path(), RunCondition::Incomplete, 1, "sentiment140");
        let metric = run_metric(&path).unwrap();
        assert!((metric - 0.83).abs() < 1e-9);
    }

    #[test]
    fn test_run_metric_rejects_garbage_values() {
        let dir = tempfile::tempdir().unwrap();
        write_run_file(dir.path(), RunCondition::Incomplete, 1, "epoch_1: not-a-number\n");

        let path = run_file_path(dir.path(), RunCondition::Incomplete, 1, "sentiment140");
        assert!(run_metric(&path).is_err());
    }

    #[test]
    fn test_aggregate_three_runs() {
        let dir = tempfile::tempdir().unwrap();
        // Maxima per run: 0.80, 0.90, 0.70.
        write_run_file(dir.path(), RunCondition::Corrupted, 1, "a: 0.75\n\nb: 0.80\n");
        write_run_file(dir.path(), RunCondition::Corrupted, 2, "a: 0.90\nb: \n");
        write_run_file(dir.path(), RunCondition::Corrupted, 3, "a: 0.60\nb: 0.70\n");

        let aggregate =
            aggregate_runs(dir.path(), RunCondition::Corrupted, "sentiment140", 3).unwrap();

        assert!((aggregate.average - 0.8).abs() < 1e-9);
        assert!((aggregate.best - 0.9).abs() < 1e-9);
        assert_eq!(
            aggregate.format_block(),
            "sentiment140\n  Avg-3: 80.00\n  Best-3: 90.00\n\n"
        );
    }

    #[test]
    fn test_missing_run_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_run_file(dir.path(), RunCondition::Corrupted, 1, "a: 0.8\n");
        // Run 2 is missing: no silent skip.
        let err = aggregate_runs(dir.path(), RunCondition::Corrupted, "sentiment140", 2)
            .unwrap_err();
        assert!(err.to_string().contains("failed to read run file"));
    }

    #[test]
    fn test_write_condition_report() {
        let dir = tempfile::tempdir().unwrap();
        write_run_file(dir.path(), RunCondition::Incomplete, 1, "a: 0.5\n");
        write_run_file(dir.path(), RunCondition::Incomplete, 2, "a: 0.7\n");

        let path = write_condition_report(
            dir.path(),
            RunCondition::Incomplete,
            &["sentiment140".to_string()],
            2,
        )
        .unwrap();

        assert!(path.ends_with("inc"));
        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "sentiment140\n  Avg-2: 60.00\n  Best-2: 70.00\n\n");
    }
}
