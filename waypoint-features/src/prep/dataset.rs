//! Training-dataset assembly — the data-preparation orchestrator.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use waypoint_core::collections::{FxHashMap, FxHashSet};
use waypoint_core::config::WaypointConfig;
use waypoint_core::dataset::{
    ClassificationSample, ClusteringSample, DatasetMetadata, RegressionSample, TrainingDataset,
};
use waypoint_core::errors::FeatureError;
use waypoint_core::features::{EntityAggregateFeatures, MovementFeatures};
use waypoint_core::records::{LocationRecord, MovementRecord};

use crate::engineer::vectorize::{vectorize, vectorize_current};

use super::aggregate::aggregate_entity_features;
use super::extract::{extract_movement_features, ExtractionResult};
use super::quality::{assess_data_quality, DataQualityReport};

/// End-to-end data preparation: records → features → aggregates →
/// labeled samples, with quality scoring folded into the metadata.
pub struct DataPreparationPipeline {
    config: WaypointConfig,
}

impl DataPreparationPipeline {
    pub fn new() -> Self {
        Self::with_config(WaypointConfig::default())
    }

    pub fn with_config(config: WaypointConfig) -> Self {
        Self { config }
    }

    /// Derive per-movement features. See [`extract_movement_features`].
    pub fn extract_movement_features(
        &self,
        records: &[MovementRecord],
        locations: &[LocationRecord],
    ) -> ExtractionResult {
        extract_movement_features(records, locations, &self.config.prep)
    }

    /// Roll features up per entity. See [`aggregate_entity_features`].
    pub fn aggregate_entity_features(
        &self,
        features: &[MovementFeatures],
        now: DateTime<Utc>,
    ) -> FxHashMap<String, EntityAggregateFeatures> {
        aggregate_entity_features(features, now, &self.config.prep)
    }

    /// Score the batch. See [`assess_data_quality`].
    pub fn assess_data_quality(
        &self,
        records: &[MovementRecord],
        locations: &[LocationRecord],
    ) -> DataQualityReport {
        assess_data_quality(records, locations, &self.config.quality)
    }

    /// Assemble the three labeled sample collections.
    ///
    /// Every movement with a successor emits one classification sample
    /// (vector at departure, label = next destination) and one
    /// regression sample (label = actual days until the next departure).
    /// Every entity with at least one movement emits one clustering
    /// sample (its current-state vector + full history).
    pub fn build_training_dataset(
        &self,
        records: &[MovementRecord],
        locations: &[LocationRecord],
        now: DateTime<Utc>,
    ) -> Result<TrainingDataset, FeatureError> {
        let extraction = self.extract_movement_features(records, locations);
        let aggregates = self.aggregate_entity_features(&extraction.features, now);
        let quality = self.assess_data_quality(records, locations);

        let mut by_entity: FxHashMap<&str, Vec<&MovementFeatures>> = FxHashMap::default();
        for f in &extraction.features {
            by_entity.entry(f.entity_id.as_str()).or_default().push(f);
        }
        let mut entity_ids: Vec<&str> = by_entity.keys().copied().collect();
        entity_ids.sort_unstable();

        let mut classification = Vec::new();
        let mut regression = Vec::new();
        let mut clustering = Vec::new();

        for entity_id in entity_ids {
            let mut movements = by_entity.remove(entity_id).unwrap_or_default();
            movements.sort_by_key(|f| f.departure_time);
            let aggregate = &aggregates[entity_id];

            for pair in movements.windows(2) {
                let (movement, next) = (pair[0], pair[1]);
                let vector = vectorize(movement, aggregate);
                classification.push(ClassificationSample {
                    vector: vector.clone(),
                    next_location: next.to_location_id.clone(),
                });
                regression.push(RegressionSample {
                    vector,
                    stay_days: movement.idle_days,
                });
            }

            // is_usable() filtering guarantees at least one movement here.
            let latest = movements[movements.len() - 1];
            clustering.push(ClusteringSample {
                vector: vectorize_current(latest, aggregate),
                history: movements.iter().map(|m| (*m).clone()).collect(),
            });
            debug!(entity_id, movements = movements.len(), "assembled entity samples");
        }

        ensure_uniform_shape(&classification, &clustering)?;

        let unique_locations: FxHashSet<&str> = extraction
            .features
            .iter()
            .flat_map(|f| [f.from_location_id.as_str(), f.to_location_id.as_str()])
            .collect();
        let date_range = date_range(&extraction.features);

        info!(
            classification = classification.len(),
            regression = regression.len(),
            clustering = clustering.len(),
            skipped = extraction.skipped,
            quality = quality.overall,
            "training dataset built"
        );

        Ok(TrainingDataset {
            metadata: DatasetMetadata {
                record_count: records.len(),
                skipped_records: extraction.skipped,
                unique_entities: clustering.len(),
                unique_locations: unique_locations.len(),
                date_range,
                quality_score: quality.overall,
            },
            classification,
            regression,
            clustering,
        })
    }
}

impl Default for DataPreparationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// All emitted vectors must share one shape; a violation here is a bug
/// in vector construction, not bad data.
fn ensure_uniform_shape(
    classification: &[ClassificationSample],
    clustering: &[ClusteringSample],
) -> Result<(), FeatureError> {
    let expected = classification
        .first()
        .map(|s| s.vector.len())
        .or_else(|| clustering.first().map(|s| s.vector.len()));
    let Some(expected) = expected else {
        return Ok(());
    };
    for vector in classification
        .iter()
        .map(|s| &s.vector)
        .chain(clustering.iter().map(|s| &s.vector))
    {
        if vector.len() != expected {
            return Err(FeatureError::VectorShapeMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}

fn date_range(features: &[MovementFeatures]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = features.iter().map(|f| f.departure_time).min()?;
    let last = features.iter().map(|f| f.arrival_time).max()?;
    Some((first, last))
}
