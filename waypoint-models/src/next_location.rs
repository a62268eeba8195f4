//! Nearest-neighbor classifier for the next destination.
//!
//! Stores the training vectors verbatim and, at prediction time, votes
//! among the k nearest by Euclidean distance. Vote share doubles as both
//! probability and confidence, which keeps every candidate explainable
//! ("4 of 5 nearest neighbors moved to ...").

use serde::{Deserialize, Serialize};
use tracing::debug;
use waypoint_core::dataset::ClassificationSample;
use waypoint_core::errors::ModelError;
use waypoint_core::predictions::{LocationCandidate, NextLocationPrediction};
use waypoint_core::{FeatureVector, FxHashMap};

use crate::contract::PredictiveModel;
use crate::metrics::classification::{self, ClassificationMetrics};
use crate::training::persistence;

pub const MODEL_TYPE: &str = "next-location-knn";
const MODEL_VERSION: &str = "1.0.0";

/// Top-k accuracy cutoffs reported by [`PredictiveModel::evaluate`].
const EVAL_TOP_K: [usize; 2] = [1, 3];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Number of neighbors consulted per prediction.
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSample {
    values: Vec<f64>,
    label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KnnState {
    feature_len: usize,
    samples: Vec<StoredSample>,
}

/// Export payload: the fitted state plus the hyperparameters it was
/// configured with, so an imported model predicts identically.
#[derive(Debug, Serialize, Deserialize)]
struct KnnExport {
    config: KnnConfig,
    state: KnnState,
}

/// k-nearest-neighbor next-location classifier.
#[derive(Debug, Clone)]
pub struct NextLocationModel {
    config: KnnConfig,
    state: Option<KnnState>,
}

impl Default for NextLocationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NextLocationModel {
    pub fn new() -> Self {
        Self {
            config: KnnConfig::default(),
            state: None,
        }
    }

    pub fn with_config(config: KnnConfig) -> Result<Self, ModelError> {
        if config.k == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "k".to_string(),
                value: "0".to_string(),
                reason: "at least one neighbor is required".to_string(),
            });
        }
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Ranked candidate destinations with vote-share probabilities.
    ///
    /// Untrained models return an empty ranking. Ties in vote count break
    /// toward the lexically smaller location id so rankings are stable.
    pub fn predict_ranked(
        &self,
        vector: &FeatureVector,
    ) -> Result<NextLocationPrediction, ModelError> {
        let Some(state) = &self.state else {
            return Ok(NextLocationPrediction::default());
        };
        if vector.len() != state.feature_len {
            return Err(ModelError::FeatureShapeMismatch {
                expected: state.feature_len,
                actual: vector.len(),
            });
        }

        let k = self.config.k.min(state.samples.len());
        let mut distances: Vec<(f64, usize)> = state
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| (euclidean(&vector.values, &s.values), i))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes: FxHashMap<&str, usize> = FxHashMap::default();
        for (_, idx) in &distances[..k] {
            *votes.entry(state.samples[*idx].label.as_str()).or_default() += 1;
        }

        let mut tallied: Vec<(&str, usize)> = votes.into_iter().collect();
        tallied.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let ranked = tallied
            .into_iter()
            .map(|(location, count)| {
                let share = count as f64 / k as f64;
                LocationCandidate {
                    location_id: location.to_string(),
                    probability: share,
                    confidence: share,
                    rationale: format!("{count} of {k} nearest neighbors moved to {location}"),
                }
            })
            .collect();
        Ok(NextLocationPrediction { ranked })
    }
}

impl PredictiveModel for NextLocationModel {
    type Sample = ClassificationSample;
    type Prediction = NextLocationPrediction;
    type Metrics = ClassificationMetrics;

    fn name(&self) -> &'static str {
        "next-location"
    }

    fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    fn hyperparameters(&self) -> Vec<(String, String)> {
        vec![("k".to_string(), self.config.k.to_string())]
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn train(&mut self, samples: &[ClassificationSample]) -> Result<(), ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet {
                model: self.name().to_string(),
            });
        }
        let feature_len = samples[0].vector.len();
        for sample in samples {
            if sample.vector.len() != feature_len {
                return Err(ModelError::FeatureShapeMismatch {
                    expected: feature_len,
                    actual: sample.vector.len(),
                });
            }
        }
        let stored = samples
            .iter()
            .map(|s| StoredSample {
                values: s.vector.values.clone(),
                label: s.next_location.clone(),
            })
            .collect::<Vec<_>>();
        debug!(samples = stored.len(), k = self.config.k, "trained next-location model");
        self.state = Some(KnnState {
            feature_len,
            samples: stored,
        });
        Ok(())
    }

    fn predict(&self, vector: &FeatureVector) -> Result<NextLocationPrediction, ModelError> {
        self.predict_ranked(vector)
    }

    fn evaluate(
        &self,
        samples: &[ClassificationSample],
    ) -> Result<ClassificationMetrics, ModelError> {
        let mut ranked = Vec::with_capacity(samples.len());
        let mut actual = Vec::with_capacity(samples.len());
        for sample in samples {
            let prediction = self.predict_ranked(&sample.vector)?;
            ranked.push(
                prediction
                    .ranked
                    .into_iter()
                    .map(|c| c.location_id)
                    .collect::<Vec<_>>(),
            );
            actual.push(sample.next_location.clone());
        }
        Ok(classification::from_ranked(&ranked, &actual, &EVAL_TOP_K))
    }

    fn export(&self) -> Result<String, ModelError> {
        let state = self.state.as_ref().ok_or_else(|| ModelError::ExportFailed {
            message: "model has not been trained".to_string(),
        })?;
        let export = KnnExport {
            config: self.config.clone(),
            state: state.clone(),
        };
        persistence::pack_model(MODEL_TYPE, self.name(), self.version(), &export)
    }

    fn import(payload: &str) -> Result<Self, ModelError> {
        let export: KnnExport = persistence::unpack_model(payload, MODEL_TYPE)?;
        Ok(Self {
            config: export.config,
            state: Some(export.state),
        })
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_sample(values: Vec<f64>, label: &str) -> ClassificationSample {
        let names = (0..values.len()).map(|i| format!("f{i}")).collect();
        ClassificationSample {
            vector: FeatureVector::new(
                "cow-1",
                names,
                values,
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ),
            next_location: label.to_string(),
        }
    }

    fn make_query(values: Vec<f64>) -> FeatureVector {
        make_sample(values, "ignored").vector
    }

    #[test]
    fn test_untrained_predicts_empty_ranking() {
        let model = NextLocationModel::new();
        let prediction = model.predict_ranked(&make_query(vec![1.0, 2.0])).unwrap();
        assert!(prediction.ranked.is_empty());
    }

    #[test]
    fn test_majority_vote_wins() {
        let mut model = NextLocationModel::new();
        model
            .train(&[
                make_sample(vec![0.0, 0.0], "depot-a"),
                make_sample(vec![0.1, 0.0], "depot-a"),
                make_sample(vec![0.0, 0.1], "depot-a"),
                make_sample(vec![5.0, 5.0], "depot-b"),
                make_sample(vec![5.1, 5.0], "depot-b"),
            ])
            .unwrap();

        let prediction = model.predict_ranked(&make_query(vec![0.05, 0.05])).unwrap();
        let top = prediction.top().unwrap();
        assert_eq!(top.location_id, "depot-a");
        assert!((top.probability - 3.0 / 5.0).abs() < 1e-12);
        assert_eq!(top.rationale, "3 of 5 nearest neighbors moved to depot-a");
    }

    #[test]
    fn test_vote_tie_breaks_lexically() {
        let mut model = NextLocationModel::with_config(KnnConfig { k: 2 }).unwrap();
        model
            .train(&[
                make_sample(vec![0.0], "zeta"),
                make_sample(vec![1.0], "alpha"),
            ])
            .unwrap();
        let prediction = model.predict_ranked(&make_query(vec![0.5])).unwrap();
        assert_eq!(prediction.ranked.len(), 2);
        assert_eq!(prediction.ranked[0].location_id, "alpha");
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut model = NextLocationModel::new();
        model.train(&[make_sample(vec![0.0, 0.0], "depot-a")]).unwrap();
        let err = model.predict_ranked(&make_query(vec![0.0])).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureShapeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let mut model = NextLocationModel::new();
        let err = model.train(&[]).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTrainingSet { .. }));
    }

    #[test]
    fn test_zero_k_rejected() {
        let err = NextLocationModel::with_config(KnnConfig { k: 0 }).unwrap_err();
        assert!(matches!(err, ModelError::InvalidHyperparameter { .. }));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut model = NextLocationModel::new();
        model
            .train(&[
                make_sample(vec![0.0, 0.0], "depot-a"),
                make_sample(vec![5.0, 5.0], "depot-b"),
            ])
            .unwrap();
        let payload = model.export().unwrap();
        let restored = NextLocationModel::import(&payload).unwrap();
        assert!(restored.is_ready());
        let prediction = restored.predict_ranked(&make_query(vec![0.1, 0.1])).unwrap();
        assert_eq!(prediction.top().unwrap().location_id, "depot-a");
    }

    #[test]
    fn test_import_restores_neighbor_count() {
        // With k=1 the single nearest sample decides; the default k=5
        // would let the four "far" votes win. The restored model must
        // keep voting with k=1.
        let mut model = NextLocationModel::with_config(KnnConfig { k: 1 }).unwrap();
        model
            .train(&[
                make_sample(vec![0.0], "near"),
                make_sample(vec![10.0], "far"),
                make_sample(vec![10.1], "far"),
                make_sample(vec![10.2], "far"),
                make_sample(vec![10.3], "far"),
            ])
            .unwrap();

        let restored = NextLocationModel::import(&model.export().unwrap()).unwrap();
        assert_eq!(restored.hyperparameters(), model.hyperparameters());

        let prediction = restored.predict_ranked(&make_query(vec![0.5])).unwrap();
        let top = prediction.top().unwrap();
        assert_eq!(top.location_id, "near");
        assert!((top.probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_predictions_identical() {
        let mut model = NextLocationModel::new();
        model
            .train(&[
                make_sample(vec![0.0, 0.0], "depot-a"),
                make_sample(vec![0.1, 0.0], "depot-a"),
                make_sample(vec![5.0, 5.0], "depot-b"),
                make_sample(vec![5.1, 5.0], "depot-b"),
                make_sample(vec![9.0, 9.0], "depot-c"),
            ])
            .unwrap();

        let query = make_query(vec![2.5, 2.5]);
        let first = model.predict_ranked(&query).unwrap();
        let second = model.predict_ranked(&query).unwrap();

        assert_eq!(first.ranked.len(), second.ranked.len());
        for (a, b) in first.ranked.iter().zip(second.ranked.iter()) {
            assert_eq!(a.location_id, b.location_id);
            assert_eq!(a.probability.to_bits(), b.probability.to_bits());
        }
    }
}
