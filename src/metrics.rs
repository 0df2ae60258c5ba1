// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Micro-averaged evaluation metrics for intent detection
//!
//! Pools true-positive/false-positive/false-negative counts across all
//! intent classes before dividing, matching the standard micro-averaged
//! precision/recall/F1 definition. Labels that appear only in the ground
//! truth, or only in the predictions, are both supported.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts for one intent class.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassCounts {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
    /// Ground-truth occurrences of this class.
    pub support: usize,
}

/// Per-class counts from aligned truth/prediction sequences, pooled for
/// micro-averaging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MicroCounts {
    pub per_class: BTreeMap<String, ClassCounts>,
}

impl MicroCounts {
    /// Tally counts from aligned sequences. Fails when the sequence
    /// lengths differ; a metric over misaligned sequences would not be
    /// trustworthy.
    pub fn from_labels(truth: &[String], predicted: &[String]) -> Result<Self> {
        ensure!(
            truth.len() == predicted.len(),
            "prediction and ground truth lengths must match: {} != {}",
            predicted.len(),
            truth.len()
        );

        let mut counts = Self::default();
        for (true_label, predicted_label) in truth.iter().zip(predicted.iter()) {
            if true_label == predicted_label {
                let entry = counts.per_class.entry(true_label.clone()).or_default();
                entry.tp += 1;
                entry.support += 1;
            } else {
                let entry = counts.per_class.entry(true_label.clone()).or_default();
                entry.fn_ += 1;
                entry.support += 1;
                counts.per_class.entry(predicted_label.clone()).or_default().fp += 1;
            }
        }

        Ok(counts)
    }

    /// Pooled (TP, FP, FN) across all classes.
    fn pooled(&self) -> (usize, usize, usize) {
        self.per_class.values().fold((0, 0, 0), |(tp, fp, fn_), c| {
            (tp + c.tp, fp + c.fp, fn_ + c.fn_)
        })
    }

    /// Micro precision: sum(TP) / (sum(TP) + sum(FP))
    pub fn precision(&self) -> f64 {
        let (tp, fp, _) = self.pooled();
        let denom = tp + fp;
        if denom == 0 {
            return 0.0;
        }
        tp as f64 / denom as f64
    }

    /// Micro recall: sum(TP) / (sum(TP) + sum(FN))
    pub fn recall(&self) -> f64 {
        let (tp, _, fn_) = self.pooled();
        let denom = tp + fn_;
        if denom == 0 {
            return 0.0;
        }
        tp as f64 / denom as f64
    }

    /// Micro F1: harmonic mean of micro precision and micro recall
    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }

    /// Total ground-truth examples.
    pub fn total_support(&self) -> usize {
        self.per_class.values().map(|c| c.support).sum()
    }
}

/// The terminal artifact of one evaluation: micro-averaged scores over
/// the full aligned label sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ScoreReport {
    pub fn from_counts(counts: &MicroCounts) -> Self {
        Self {
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
        }
    }

    /// Compute scores directly from aligned truth/prediction sequences.
    pub fn from_labels(truth: &[String], predicted: &[String]) -> Result<Self> {
        let counts = MicroCounts::from_labels(truth, predicted)?;
        Ok(Self::from_counts(&counts))
    }

    /// Format as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "precision: {:.4}\nrecall:    {:.4}\nf1 score:  {:.4}\n",
            self.precision, self.recall, self.f1
        )
    }
}
