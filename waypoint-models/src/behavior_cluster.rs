//! K-means clustering over entity behavior vectors.
//!
//! Lloyd's algorithm with random distinct-point initialization. A seed can
//! be pinned for reproducible runs; unseeded training draws from entropy.
//! Clusters that lose all members keep their previous centroid rather than
//! being reinitialized, so cluster ids stay stable across iterations.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use waypoint_core::dataset::ClusteringSample;
use waypoint_core::errors::ModelError;
use waypoint_core::predictions::{ClusterCharacteristics, ClusterPrediction};
use waypoint_core::FeatureVector;

use crate::contract::PredictiveModel;
use crate::metrics::clustering::{self, ClusteringMetrics};
use crate::training::persistence;

pub const MODEL_TYPE: &str = "behavior-kmeans";
const MODEL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters to fit.
    pub k: usize,
    pub max_iterations: usize,
    /// Fixed RNG seed for reproducible centroid initialization.
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 100,
            seed: None,
        }
    }
}

/// Composition of one fitted cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub name: String,
    pub size: usize,
    pub centroid: Vec<f64>,
    pub member_entity_ids: Vec<String>,
    pub characteristics: ClusterCharacteristics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClusterState {
    feature_len: usize,
    centroids: Vec<Vec<f64>>,
    summaries: Vec<ClusterSummary>,
}

/// Export payload pairing centroids with the configuration that
/// produced them, restored verbatim on import.
#[derive(Debug, Serialize, Deserialize)]
struct ClusterExport {
    config: KMeansConfig,
    state: ClusterState,
}

/// K-means behavioral clusterer.
#[derive(Debug, Clone)]
pub struct BehaviorClusterModel {
    config: KMeansConfig,
    state: Option<ClusterState>,
}

impl Default for BehaviorClusterModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorClusterModel {
    pub fn new() -> Self {
        Self {
            config: KMeansConfig::default(),
            state: None,
        }
    }

    pub fn with_config(config: KMeansConfig) -> Result<Self, ModelError> {
        if config.k == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "k".to_string(),
                value: "0".to_string(),
                reason: "at least one cluster is required".to_string(),
            });
        }
        if config.max_iterations == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "max_iterations".to_string(),
                value: "0".to_string(),
                reason: "at least one iteration is required".to_string(),
            });
        }
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Fitted cluster summaries; empty before training.
    pub fn clusters(&self) -> &[ClusterSummary] {
        self.state.as_ref().map_or(&[], |s| &s.summaries)
    }

    /// Nearest-centroid assignment with similarity `1 / (1 + distance)`.
    pub fn predict_cluster(&self, vector: &FeatureVector) -> Result<ClusterPrediction, ModelError> {
        let Some(state) = &self.state else {
            return Ok(ClusterPrediction::untrained());
        };
        if vector.len() != state.feature_len {
            return Err(ModelError::FeatureShapeMismatch {
                expected: state.feature_len,
                actual: vector.len(),
            });
        }

        let (cluster_id, distance) = nearest_centroid(&vector.values, &state.centroids);
        let summary = &state.summaries[cluster_id];
        Ok(ClusterPrediction {
            cluster_id: Some(cluster_id),
            cluster_name: summary.name.clone(),
            similarity: 1.0 / (1.0 + distance),
            characteristics: summary.characteristics.clone(),
            rationale: format!(
                "nearest to {} ({} entities, mean idle {:.1} days)",
                summary.name, summary.size, summary.characteristics.mean_idle_days
            ),
        })
    }
}

impl PredictiveModel for BehaviorClusterModel {
    type Sample = ClusteringSample;
    type Prediction = ClusterPrediction;
    type Metrics = ClusteringMetrics;

    fn name(&self) -> &'static str {
        "behavior-cluster"
    }

    fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    fn hyperparameters(&self) -> Vec<(String, String)> {
        vec![
            ("k".to_string(), self.config.k.to_string()),
            (
                "max_iterations".to_string(),
                self.config.max_iterations.to_string(),
            ),
            (
                "seed".to_string(),
                self.config
                    .seed
                    .map_or_else(|| "entropy".to_string(), |s| s.to_string()),
            ),
        ]
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn train(&mut self, samples: &[ClusteringSample]) -> Result<(), ModelError> {
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

        let points: Vec<&[f64]> = samples.iter().map(|s| s.vector.values.as_slice()).collect();
        let k = self.config.k.min(points.len());

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut centroids: Vec<Vec<f64>> = rand::seq::index::sample(&mut rng, points.len(), k)
            .into_iter()
            .map(|i| points[i].to_vec())
            .collect();

        let mut assignments = vec![0usize; points.len()];
        for iteration in 0..self.config.max_iterations {
            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let (best, _) = nearest_centroid(point, &centroids);
                if assignments[i] != best {
                    assignments[i] = best;
                    changed = true;
                }
            }
            if !changed && iteration > 0 {
                break;
            }

            for (c, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&[f64]> = points
                    .iter()
                    .zip(&assignments)
                    .filter(|(_, a)| **a == c)
                    .map(|(p, _)| *p)
                    .collect();
                // An emptied cluster keeps its old centroid.
                if members.is_empty() {
                    continue;
                }
                for (j, slot) in centroid.iter_mut().enumerate() {
                    *slot = members.iter().map(|m| m[j]).sum::<f64>() / members.len() as f64;
                }
            }
        }

        let summaries = (0..k)
            .map(|c| {
                let members: Vec<&ClusteringSample> = samples
                    .iter()
                    .zip(&assignments)
                    .filter(|(_, a)| **a == c)
                    .map(|(s, _)| s)
                    .collect();
                let characteristics = summarize(&members);
                ClusterSummary {
                    cluster_id: c,
                    name: format!("cluster-{c}"),
                    size: members.len(),
                    centroid: centroids[c].clone(),
                    member_entity_ids: members
                        .iter()
                        .map(|s| s.vector.entity_id.clone())
                        .collect(),
                    characteristics,
                }
            })
            .collect();

        debug!(entities = samples.len(), k, "trained behavior-cluster model");
        self.state = Some(ClusterState {
            feature_len,
            centroids,
            summaries,
        });
        Ok(())
    }

    fn predict(&self, vector: &FeatureVector) -> Result<ClusterPrediction, ModelError> {
        self.predict_cluster(vector)
    }

    fn evaluate(&self, samples: &[ClusteringSample]) -> Result<ClusteringMetrics, ModelError> {
        let Some(state) = &self.state else {
            return Ok(ClusteringMetrics::default());
        };
        let mut points = Vec::with_capacity(samples.len());
        let mut assignments = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.vector.len() != state.feature_len {
                return Err(ModelError::FeatureShapeMismatch {
                    expected: state.feature_len,
                    actual: sample.vector.len(),
                });
            }
            let (cluster_id, _) = nearest_centroid(&sample.vector.values, &state.centroids);
            points.push(sample.vector.values.clone());
            assignments.push(cluster_id);
        }
        Ok(clustering::evaluate(&points, &assignments))
    }

    fn export(&self) -> Result<String, ModelError> {
        let state = self.state.as_ref().ok_or_else(|| ModelError::ExportFailed {
            message: "model has not been trained".to_string(),
        })?;
        let export = ClusterExport {
            config: self.config.clone(),
            state: state.clone(),
        };
        persistence::pack_model(MODEL_TYPE, self.name(), self.version(), &export)
    }

    fn import(payload: &str) -> Result<Self, ModelError> {
        let export: ClusterExport = persistence::unpack_model(payload, MODEL_TYPE)?;
        Ok(Self {
            config: export.config,
            state: Some(export.state),
        })
    }
}

/// Index and distance of the closest centroid; ties go to the lower index.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = euclidean(point, centroid);
        if d < best_distance {
            best = c;
            best_distance = d;
        }
    }
    (best, best_distance)
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn summarize(members: &[&ClusteringSample]) -> ClusterCharacteristics {
    if members.is_empty() {
        return ClusterCharacteristics::default();
    }
    let n = members.len() as f64;
    let mean_of = |name: &str| {
        members
            .iter()
            .map(|s| s.vector.get(name).unwrap_or(0.0))
            .sum::<f64>()
            / n
    };
    ClusterCharacteristics {
        mean_idle_days: mean_of("avg_idle_days"),
        warehouse_share: mean_of("warehouse_specialization"),
        mean_consistency: mean_of("consistency_score"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_sample(entity_id: &str, values: Vec<f64>) -> ClusteringSample {
        let names = (0..values.len()).map(|i| format!("f{i}")).collect();
        ClusteringSample {
            vector: FeatureVector::new(
                entity_id,
                names,
                values,
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ),
            history: vec![],
        }
    }

    fn seeded(k: usize) -> BehaviorClusterModel {
        BehaviorClusterModel::with_config(KMeansConfig {
            k,
            max_iterations: 100,
            seed: Some(42),
        })
        .unwrap()
    }

    fn two_group_samples() -> Vec<ClusteringSample> {
        vec![
            make_sample("cow-1", vec![0.0, 0.0]),
            make_sample("cow-2", vec![0.5, 0.2]),
            make_sample("cow-3", vec![0.2, 0.4]),
            make_sample("cow-4", vec![10.0, 10.0]),
            make_sample("cow-5", vec![10.5, 9.8]),
            make_sample("cow-6", vec![9.7, 10.3]),
        ]
    }

    #[test]
    fn test_untrained_predicts_neutral() {
        let model = BehaviorClusterModel::new();
        let prediction = model
            .predict_cluster(&make_sample("cow-1", vec![1.0]).vector)
            .unwrap();
        assert!(prediction.cluster_id.is_none());
        assert_eq!(prediction.similarity, 0.0);
    }

    #[test]
    fn test_separates_two_obvious_groups() {
        let mut model = seeded(2);
        let samples = two_group_samples();
        model.train(&samples).unwrap();

        let mut sizes: Vec<usize> = model.clusters().iter().map(|c| c.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3]);

        let near_origin = model
            .predict_cluster(&make_sample("cow-x", vec![0.3, 0.3]).vector)
            .unwrap();
        let near_far = model
            .predict_cluster(&make_sample("cow-y", vec![9.9, 9.9]).vector)
            .unwrap();
        assert_ne!(near_origin.cluster_id, near_far.cluster_id);
        assert!(near_origin.similarity > 0.0 && near_origin.similarity <= 1.0);
        assert!(!near_origin.rationale.is_empty());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let samples = two_group_samples();
        let mut a = seeded(2);
        let mut b = seeded(2);
        a.train(&samples).unwrap();
        b.train(&samples).unwrap();
        let pa = a
            .predict_cluster(&make_sample("cow-x", vec![0.1, 0.1]).vector)
            .unwrap();
        let pb = b
            .predict_cluster(&make_sample("cow-x", vec![0.1, 0.1]).vector)
            .unwrap();
        assert_eq!(pa.cluster_id, pb.cluster_id);
        assert_eq!(pa.similarity, pb.similarity);
    }

    #[test]
    fn test_k_capped_by_sample_count() {
        let mut model = seeded(5);
        model
            .train(&[
                make_sample("cow-1", vec![0.0]),
                make_sample("cow-2", vec![10.0]),
            ])
            .unwrap();
        assert_eq!(model.clusters().len(), 2);
    }

    #[test]
    fn test_member_ids_recorded() {
        let mut model = seeded(2);
        let samples = two_group_samples();
        model.train(&samples).unwrap();
        let mut all_members: Vec<String> = model
            .clusters()
            .iter()
            .flat_map(|c| c.member_entity_ids.iter().cloned())
            .collect();
        all_members.sort();
        assert_eq!(
            all_members,
            vec!["cow-1", "cow-2", "cow-3", "cow-4", "cow-5", "cow-6"]
        );
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let mut model = BehaviorClusterModel::new();
        assert!(matches!(
            model.train(&[]).unwrap_err(),
            ModelError::EmptyTrainingSet { .. }
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut model = seeded(2);
        model.train(&two_group_samples()).unwrap();
        let payload = model.export().unwrap();
        let restored = BehaviorClusterModel::import(&payload).unwrap();
        let a = model
            .predict_cluster(&make_sample("cow-x", vec![0.2, 0.2]).vector)
            .unwrap();
        let b = restored
            .predict_cluster(&make_sample("cow-x", vec![0.2, 0.2]).vector)
            .unwrap();
        assert_eq!(a.cluster_id, b.cluster_id);
    }

    #[test]
    fn test_import_restores_config() {
        let mut model = seeded(2);
        model.train(&two_group_samples()).unwrap();
        let restored = BehaviorClusterModel::import(&model.export().unwrap()).unwrap();
        assert_eq!(restored.hyperparameters(), model.hyperparameters());
    }

    #[test]
    fn test_predict_stable_without_retraining() {
        // Prediction only reads the frozen centroids, so asking twice
        // for the same vector must return the same assignment.
        let mut model = seeded(2);
        model.train(&two_group_samples()).unwrap();

        let vector = make_sample("cow-x", vec![0.3, 0.1]).vector;
        let first = model.predict_cluster(&vector).unwrap();
        let second = model.predict_cluster(&vector).unwrap();

        assert_eq!(first.cluster_id, second.cluster_id);
        assert_eq!(first.similarity.to_bits(), second.similarity.to_bits());
    }
}
