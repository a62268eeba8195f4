//! Combined recommendation output types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Urgency of acting on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The action the engine recommends for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Relocate now to the suggested location.
    MoveNow,
    /// Hold position; the predicted stay has not elapsed.
    Wait,
    /// No confident signal; keep observing.
    Monitor,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveNow => write!(f, "move_now"),
            Self::Wait => write!(f, "wait"),
            Self::Monitor => write!(f, "monitor"),
        }
    }
}

/// A destination suggested within a recommendation option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedLocation {
    pub location_id: String,
    pub confidence: f64,
    /// Estimated stay in days at this destination.
    pub estimated_stay_days: f64,
}

/// One ranked option within a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationOption {
    pub priority: Priority,
    pub action: Action,
    pub locations: Vec<SuggestedLocation>,
    pub rationale: String,
    pub confidence: f64,
}

/// The engine's combined output for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRecommendation {
    pub entity_id: String,
    pub current_location: String,
    pub current_idle_days: f64,
    /// Options sorted best-first.
    pub options: Vec<RecommendationOption>,
    pub best_action: Action,
    pub priority: Priority,
    pub risk_factors: Vec<String>,
    pub opportunity_factors: Vec<String>,
}

impl MovementRecommendation {
    /// Confidence of the best option, 0 when there is none.
    pub fn best_confidence(&self) -> f64 {
        self.options.first().map(|o| o.confidence).unwrap_or(0.0)
    }
}

/// Batch-level summary counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_entities: usize,
    pub needs_immediate_action: usize,
    pub ready_to_move: usize,
    pub can_wait: usize,
    pub critical_entity_ids: Vec<String>,
}

/// One entry of a batch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPrediction {
    pub entity_id: String,
    pub recommendation: MovementRecommendation,
}

/// The full batch recommendation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecommendationResult {
    pub predictions: Vec<EntityPrediction>,
    pub summary: BatchSummary,
    pub generated_at: DateTime<Utc>,
    /// name → version for each model consulted.
    pub model_versions: Vec<(String, String)>,
}
