// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset loading for intent detection evaluation
//!
//! Test examples live in precomputed per-intent files, one directory per
//! missing-word percentage. Loading a dataset variant yields the example
//! sequence and the parallel ground-truth label sequence, concatenated
//! across intents.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Supported missing-word percentages, mapped to their precomputed data
/// variants on disk. Percentages outside this table have no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorruptionLevel {
    /// Complete, uncorrupted data (0.0)
    Complete,
    /// 10% of words missing
    Missing10,
    /// 20% of words missing
    Missing20,
    /// 30% of words missing
    Missing30,
    /// 40% of words missing
    Missing40,
    /// 50% of words missing
    Missing50,
    /// 80% of words missing
    Missing80,
}

impl CorruptionLevel {
    pub const ALL: [CorruptionLevel; 7] = [
        CorruptionLevel::Complete,
        CorruptionLevel::Missing10,
        CorruptionLevel::Missing20,
        CorruptionLevel::Missing30,
        CorruptionLevel::Missing40,
        CorruptionLevel::Missing50,
        CorruptionLevel::Missing80,
    ];

    /// Map a requested percentage to a supported level.
    pub fn from_fraction(perc: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|level| level.fraction() == perc)
    }

    /// The missing-word fraction this level stands for.
    pub fn fraction(&self) -> f64 {
        match self {
            CorruptionLevel::Complete => 0.0,
            CorruptionLevel::Missing10 => 0.1,
            CorruptionLevel::Missing20 => 0.2,
            CorruptionLevel::Missing30 => 0.3,
            CorruptionLevel::Missing40 => 0.4,
            CorruptionLevel::Missing50 => 0.5,
            CorruptionLevel::Missing80 => 0.8,
        }
    }

    /// The fraction as it is spelled in on-disk paths.
    fn fraction_tag(&self) -> &'static str {
        match self {
            CorruptionLevel::Complete => "0.0",
            CorruptionLevel::Missing10 => "0.1",
            CorruptionLevel::Missing20 => "0.2",
            CorruptionLevel::Missing30 => "0.3",
            CorruptionLevel::Missing40 => "0.4",
            CorruptionLevel::Missing50 => "0.5",
            CorruptionLevel::Missing80 => "0.8",
        }
    }

    /// Directory holding this variant's per-intent example files.
    pub fn data_dir_name(&self) -> String {
        match self {
            CorruptionLevel::Complete => "complete_data".to_string(),
            degraded => format!(
                "comp_with_incomplete_data_tfidf_lower_{}_noMissingTag",
                degraded.fraction_tag()
            ),
        }
    }

    /// Directory under the results root where this variant's score
    /// reports are written.
    pub fn results_dir_name(&self) -> String {
        match self {
            CorruptionLevel::Complete => "complete".to_string(),
            degraded => format!("comp_inc_{}", degraded.fraction_tag()),
        }
    }
}

/// Mapping from intent identifier to canonical intent name, fixed per
/// dataset. Intents iterate in id order; that order is the ordering
/// contract between the example sequence and the label sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentLabelSet {
    intents: BTreeMap<String, String>,
}

impl IntentLabelSet {
    pub fn new(intents: BTreeMap<String, String>) -> Self {
        Self { intents }
    }

    /// Load the label set for `dataset` from a JSON configuration file
    /// keyed by dataset name.
    pub fn from_config(path: &Path, dataset: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open labels file: {}", path.display()))?;
        let mut all: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse labels file: {}", path.display()))?;
        let intents = all.remove(dataset).with_context(|| {
            format!("no label set for dataset '{}' in {}", dataset, path.display())
        })?;
        Ok(Self { intents })
    }

    /// Iterate (intent id, intent name) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.intents.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// A single test example: raw text plus its ground-truth intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub true_label: String,
}

/// Examples for one dataset variant, with the parallel label sequence
/// handed to the metric computer. `labels[i]` is the ground truth for
/// `examples[i]`.
#[derive(Debug, Clone, Default)]
pub struct EvalSet {
    pub examples: Vec<Example>,
    pub labels: Vec<String>,
}

impl EvalSet {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The raw texts, in example order, for the classifier collaborator.
    pub fn texts(&self) -> Vec<String> {
        self.examples.iter().map(|e| e.text.clone()).collect()
    }
}

/// Load the per-intent example files for one dataset variant.
///
/// Example files are tab-separated, one example per line, first field is
/// the raw text. A missing file for one intent is skipped with a warning
/// and loading continues; degraded variants do not exist for every
/// intent.
pub fn load_examples(
    data_dir: &Path,
    level: CorruptionLevel,
    labels: &IntentLabelSet,
) -> Result<EvalSet> {
    let variant_dir = data_dir.join(level.data_dir_name());
    let mut set = EvalSet::default();

    for (intent_id, intent_name) in labels.iter() {
        let path = variant_dir.join(format!("test_dialogflow_{}.csv", intent_name));

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(
                    "Skipping intent {} ({}): cannot open {}: {}",
                    intent_id,
                    intent_name,
                    path.display(),
                    err
                );
                continue;
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        for (idx, result) in reader.records().enumerate() {
            let record = result
                .with_context(|| format!("failed to read record {} in {}", idx, path.display()))?;
            let text = record.get(0).unwrap_or("").to_string();
            set.examples.push(Example {
                text,
                true_label: intent_name.to_string(),
            });
            set.labels.push(intent_name.to_string());
        }
    }

    Ok(set)
}
