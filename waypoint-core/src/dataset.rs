//! Labeled training samples and the assembled dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::MovementFeatures;
use crate::vector::FeatureVector;

/// One classification sample: vector at departure + true next location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub vector: FeatureVector,
    pub next_location: String,
}

/// One regression sample: vector at departure + actual days until the
/// entity's next departure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionSample {
    pub vector: FeatureVector,
    pub stay_days: f64,
}

/// One clustering sample: the entity's latest vector + its full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSample {
    pub vector: FeatureVector,
    pub history: Vec<MovementFeatures>,
}

/// Dataset-level bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub record_count: usize,
    /// Records skipped for missing critical fields.
    pub skipped_records: usize,
    pub unique_entities: usize,
    pub unique_locations: usize,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Overall data quality in [0, 1] from the quality assessor.
    pub quality_score: f64,
}

/// The three labeled sample collections plus metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub classification: Vec<ClassificationSample>,
    pub regression: Vec<RegressionSample>,
    pub clustering: Vec<ClusteringSample>,
    pub metadata: DatasetMetadata,
}

impl TrainingDataset {
    pub fn is_empty(&self) -> bool {
        self.classification.is_empty()
            && self.regression.is_empty()
            && self.clustering.is_empty()
    }
}
