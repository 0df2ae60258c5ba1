// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Score report persistence
//!
//! One JSON report per dataset and condition, under a results directory
//! whose path encodes the corruption condition.

use crate::datasets::CorruptionLevel;
use crate::metrics::ScoreReport;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Path of the report for `dataset` under `results_dir`, keyed by the
/// corruption condition.
pub fn report_path(results_dir: &Path, level: CorruptionLevel, dataset: &str) -> PathBuf {
    results_dir
        .join(level.results_dir_name())
        .join(format!("{}.json", dataset))
}

/// Write `report` for `dataset`, creating any missing directories in the
/// path first. Re-running against an existing results directory does not
/// fail and overwrites the prior report.
pub fn write_report(
    results_dir: &Path,
    level: CorruptionLevel,
    dataset: &str,
    report: &ScoreReport,
) -> Result<PathBuf> {
    let path = report_path(results_dir, level, dataset);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create results directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write score report: {}", path.display()))?;

    tracing::info!("Score report saved to {}", path.display());
    Ok(path)
}

/// Read a previously written report back.
pub fn read_report(path: &Path) -> Result<ScoreReport> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read score report: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse score report: {}", path.display()))
}
