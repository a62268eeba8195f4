//! Classifier scoring from ranked predictions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Confusion-matrix label for samples the model could not rank at all.
pub const NO_PREDICTION: &str = "(none)";

/// Precision/recall/F1 for one destination class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Summary of a next-location evaluation run.
///
/// `per_class` and the confusion matrix use ordered maps so rendered
/// reports are stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub sample_count: usize,
    /// Top-1 hit rate.
    pub accuracy: f64,
    pub per_class: BTreeMap<String, ClassScores>,
    /// Macro-averaged F1 over classes that occur in the actuals.
    pub macro_f1: f64,
    /// `confusion[actual][predicted]` counts, top-1 predictions only.
    pub confusion: BTreeMap<String, BTreeMap<String, usize>>,
    /// `(k, fraction of samples whose actual is in the top k)`.
    pub top_k_accuracy: Vec<(usize, f64)>,
}

/// Scores ranked predictions against actual labels.
///
/// `ranked[i]` is the model's candidate list for sample `i`, best first; an
/// empty list counts as a miss at every cutoff.
pub fn from_ranked(ranked: &[Vec<String>], actual: &[String], ks: &[usize]) -> ClassificationMetrics {
    debug_assert_eq!(ranked.len(), actual.len());
    let n = actual.len();
    if n == 0 {
        return ClassificationMetrics::default();
    }

    let mut confusion: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut top1_hits = 0usize;
    for (candidates, truth) in ranked.iter().zip(actual) {
        let predicted = candidates
            .first()
            .map_or(NO_PREDICTION, |p| p.as_str());
        if predicted == truth {
            top1_hits += 1;
        }
        *confusion
            .entry(truth.clone())
            .or_default()
            .entry(predicted.to_string())
            .or_default() += 1;
    }

    let mut classes: Vec<&str> = actual.iter().map(|a| a.as_str()).collect();
    classes.extend(
        ranked
            .iter()
            .filter_map(|c| c.first())
            .map(|p| p.as_str()),
    );
    classes.sort_unstable();
    classes.dedup();

    let mut per_class = BTreeMap::new();
    let mut f1_sum = 0.0;
    let mut f1_classes = 0usize;
    for class in classes {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (candidates, truth) in ranked.iter().zip(actual) {
            let predicted = candidates.first().map_or(NO_PREDICTION, |p| p.as_str());
            match (predicted == class, truth == class) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        if actual.iter().any(|a| a == class) {
            f1_sum += f1;
            f1_classes += 1;
        }
        per_class.insert(
            class.to_string(),
            ClassScores {
                precision,
                recall,
                f1,
            },
        );
    }

    let top_k_accuracy = ks
        .iter()
        .map(|&k| {
            let hits = ranked
                .iter()
                .zip(actual)
                .filter(|(candidates, truth)| {
                    candidates.iter().take(k).any(|c| c == *truth)
                })
                .count();
            (k, hits as f64 / n as f64)
        })
        .collect();

    ClassificationMetrics {
        sample_count: n,
        accuracy: top1_hits as f64 / n as f64,
        per_class,
        macro_f1: if f1_classes > 0 {
            f1_sum / f1_classes as f64
        } else {
            0.0
        },
        confusion,
        top_k_accuracy,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
