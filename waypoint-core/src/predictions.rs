//! Per-model prediction output types.

use serde::{Deserialize, Serialize};

/// One candidate destination from the next-location classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub location_id: String,
    /// Neighbor vote share in [0, 1].
    pub probability: f64,
    /// Model confidence in this candidate (vote share, possibly damped
    /// for thin training data).
    pub confidence: f64,
    pub rationale: String,
}

/// Ranked next-location prediction.
///
/// An untrained model produces an empty `ranked` list — never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextLocationPrediction {
    /// Candidates sorted by probability descending.
    pub ranked: Vec<LocationCandidate>,
}

impl NextLocationPrediction {
    /// The singled-out top recommendation, if any.
    pub fn top(&self) -> Option<&LocationCandidate> {
        self.ranked.first()
    }
}

/// Predicted optimal stay duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimalStayPrediction {
    /// Predicted stay in days, clamped to the configured range.
    /// 0.0 with an explanatory rationale when the model is untrained.
    pub predicted_days: f64,
    /// ±20% interval around the clamped prediction.
    pub interval: (f64, f64),
    /// min(1, current idle days / predicted stay), in [0, 1].
    pub movement_readiness: f64,
    pub rationale: String,
}

impl OptimalStayPrediction {
    /// Neutral result for an untrained model.
    pub fn untrained() -> Self {
        Self {
            predicted_days: 0.0,
            interval: (0.0, 0.0),
            movement_readiness: 0.0,
            rationale: "stay-duration model has not been trained".to_string(),
        }
    }
}

/// Snapshot of a cluster's composition used in rationale rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterCharacteristics {
    pub mean_idle_days: f64,
    pub warehouse_share: f64,
    pub mean_consistency: f64,
}

/// Behavioral cluster assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterPrediction {
    /// `None` when the model is untrained.
    pub cluster_id: Option<usize>,
    pub cluster_name: String,
    /// 1 / (1 + distance to the assigned centroid).
    pub similarity: f64,
    pub characteristics: ClusterCharacteristics,
    pub rationale: String,
}

impl ClusterPrediction {
    /// Neutral result for an untrained model.
    pub fn untrained() -> Self {
        Self {
            cluster_id: None,
            cluster_name: "unassigned".to_string(),
            similarity: 0.0,
            characteristics: ClusterCharacteristics::default(),
            rationale: "behavior-cluster model has not been trained".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untrained_predictions_are_neutral() {
        let next = NextLocationPrediction::default();
        assert!(next.top().is_none());

        let stay = OptimalStayPrediction::untrained();
        assert_eq!(stay.predicted_days, 0.0);
        assert!(!stay.rationale.is_empty());

        let cluster = ClusterPrediction::untrained();
        assert!(cluster.cluster_id.is_none());
        assert_eq!(cluster.similarity, 0.0);
    }
}
