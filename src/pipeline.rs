// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation pipeline for hosted intent classifiers
//!
//! Orchestrates:
//! - Dataset loading for the requested corruption level
//! - The classifier collaborator (batch detection)
//! - Micro-averaged metric computation
//! - Score report persistence
//!
//! Strictly sequential and blocking; a classifier failure aborts the run.

use crate::classifier::IntentClassifier;
use crate::datasets::{self, CorruptionLevel, IntentLabelSet};
use crate::metrics::ScoreReport;
use crate::report;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Dataset to evaluate
    pub dataset_name: String,
    /// Root of the precomputed dataset variants
    pub data_dir: PathBuf,
    /// Results directory the score report is written under
    pub results_dir: PathBuf,
    /// Which precomputed variant to evaluate
    pub corruption: CorruptionLevel,
}

/// What one run produced and where it was persisted.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub report: ScoreReport,
    pub report_path: PathBuf,
    pub examples: usize,
}

/// Main evaluation pipeline.
pub struct EvaluationPipeline {
    config: EvaluationConfig,
    labels: IntentLabelSet,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig, labels: IntentLabelSet) -> Self {
        Self { config, labels }
    }

    /// Run the evaluation end to end and persist the score report.
    pub fn run(&self, classifier: &dyn IntentClassifier) -> Result<EvaluationOutcome> {
        let condition = self.config.corruption.results_dir_name();

        let eval_set =
            datasets::load_examples(&self.config.data_dir, self.config.corruption, &self.labels)?;
        ensure!(
            !eval_set.is_empty(),
            "no examples found for dataset '{}' under {}",
            self.config.dataset_name,
            self.config.data_dir.display()
        );

        tracing::info!(
            "Loaded {} examples across {} intents for {} ({})",
            eval_set.len(),
            self.labels.len(),
            self.config.dataset_name,
            condition
        );

        let detected = classifier.classify_batch(&eval_set.texts())?;
        ensure!(
            detected.len() == eval_set.labels.len(),
            "classifier returned {} predictions for {} examples",
            detected.len(),
            eval_set.labels.len()
        );

        let score = ScoreReport::from_labels(&eval_set.labels, &detected)?;
        tracing::info!(
            "Results for {} ({}): precision {:.4}, recall {:.4}, f1 {:.4}",
            self.config.dataset_name,
            condition,
            score.precision,
            score.recall,
            score.f1
        );

        let report_path = report::write_report(
            &self.config.results_dir,
            self.config.corruption,
            &self.config.dataset_name,
            &score,
        )?;

        Ok(EvaluationOutcome {
            report: score,
            report_path,
            examples: eval_set.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::UNKNOWN_INTENT;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    /// Fake collaborator: labels any text containing the intent name in
    /// lowercase, everything else as UNKNOWN.
    struct KeywordFake {
        intents: Vec<String>,
    }

    impl IntentClassifier for KeywordFake {
        fn classify_batch(&self, texts: &[String]) -> Result<Vec<String>> {
            Ok(texts
                .iter()
                .map(|text| {
                    self.intents
                        .iter()
                        .find(|intent| text.contains(&intent.to_lowercase()))
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_INTENT.to_string())
                })
                .collect())
        }
    }

    /// Fake collaborator that violates the alignment contract.
    struct TruncatingFake;

    impl IntentClassifier for TruncatingFake {
        fn classify_batch(&self, texts: &[String]) -> Result<Vec<String>> {
            Ok(texts.iter().skip(1).map(|_| "whatever".to_string()).collect())
        }
    }

    fn write_intent_file(dir: &Path, intent: &str, rows: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        let body: String = rows.iter().map(|r| format!("{}\n", r)).collect();
        fs::write(dir.join(format!("test_dialogflow_{}.csv", intent)), body).unwrap();
    }

    fn label_set(names: &[&str]) -> IntentLabelSet {
        IntentLabelSet::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| (format!("{}", i + 1), name.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn make_pipeline(data_dir: &Path, results_dir: &Path) -> EvaluationPipeline {
        let config = EvaluationConfig {
            dataset_name: "snips".to_string(),
            data_dir: data_dir.to_path_buf(),
            results_dir: results_dir.to_path_buf(),
            corruption: CorruptionLevel::Complete,
        };
        EvaluationPipeline::new(config, label_set(&["GetWeather", "PlayMusic"]))
    }

    #[test]
    fn test_pipeline_perfect_classifier() {
        let data = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        let complete = data.path().join("complete_data");
        write_intent_file(&complete, "GetWeather", &["getweather in paris", "getweather today"]);
        write_intent_file(&complete, "PlayMusic", &["playmusic by bowie"]);

        let pipeline = make_pipeline(data.path(), results.path());
        let classifier = KeywordFake {
            intents: vec!["GetWeather".to_string(), "PlayMusic".to_string()],
        };

        let outcome = pipeline.run(&classifier).unwrap();
        assert_eq!(outcome.examples, 3);
        assert!((outcome.report.f1 - 1.0).abs() < 1e-9);
        assert!(outcome.report_path.ends_with("complete/snips.json"));
        assert!(outcome.report_path.exists());
    }

    #[test]
    fn test_pipeline_unmatched_texts_score_zero() {
        let data = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        let complete = data.path().join("complete_data");
        write_intent_file(&complete, "GetWeather", &["nothing matching here"]);

        let pipeline = make_pipeline(data.path(), results.path());
        let classifier = KeywordFake {
            intents: vec!["GetWeather".to_string()],
        };

        let outcome = pipeline.run(&classifier).unwrap();
        assert!(outcome.report.f1.abs() < 1e-9);
    }

    #[test]
    fn test_pipeline_rejects_misaligned_predictions() {
        let data = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        let complete = data.path().join("complete_data");
        write_intent_file(&complete, "GetWeather", &["first", "second"]);

        let pipeline = make_pipeline(data.path(), results.path());
        let err = pipeline.run(&TruncatingFake).unwrap_err();
        assert!(err.to_string().contains("1 predictions for 2 examples"));
    }

    #[test]
    fn test_pipeline_fails_with_no_examples() {
        let data = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();
        fs::create_dir_all(data.path().join("complete_data")).unwrap();

        let pipeline = make_pipeline(data.path(), results.path());
        let classifier = KeywordFake { intents: vec![] };
        assert!(pipeline.run(&classifier).is_err());
    }

}
