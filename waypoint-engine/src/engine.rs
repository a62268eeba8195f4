//! The recommendation engine.
//!
//! Combines the three model outputs for one entity into a prioritized,
//! explainable movement recommendation, and fans out over a fleet in
//! parallel for batch runs.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};
use waypoint_core::config::EngineConfig;
use waypoint_core::errors::EngineError;
use waypoint_core::predictions::{ClusterPrediction, NextLocationPrediction, OptimalStayPrediction};
use waypoint_core::recommendation::{
    Action, BatchRecommendationResult, BatchSummary, EntityPrediction, MovementRecommendation,
    Priority, RecommendationOption, SuggestedLocation,
};
use waypoint_core::{Clock, FeatureVector, SystemClock};
use waypoint_models::{
    BehaviorClusterModel, NextLocationModel, PredictiveModel, StayDurationModel,
};

use crate::cache::{CacheStats, RecommendationCache};

/// Consistency score below which the movement cadence counts as a risk.
const LOW_CONSISTENCY_THRESHOLD: f64 = 0.3;

/// Cluster similarity at or above which the cluster match is worth
/// surfacing as an opportunity.
const CLUSTER_MATCH_THRESHOLD: f64 = 0.5;

pub struct RecommendationEngine {
    config: EngineConfig,
    next_location: NextLocationModel,
    stay_duration: StayDurationModel,
    behavior: BehaviorClusterModel,
    cache: RecommendationCache,
    clock: Arc<dyn Clock>,
}

impl RecommendationEngine {
    pub fn new(
        next_location: NextLocationModel,
        stay_duration: StayDurationModel,
        behavior: BehaviorClusterModel,
    ) -> Self {
        Self::with_config(
            EngineConfig::default(),
            next_location,
            stay_duration,
            behavior,
            Arc::new(SystemClock),
        )
    }

    pub fn with_config(
        config: EngineConfig,
        next_location: NextLocationModel,
        stay_duration: StayDurationModel,
        behavior: BehaviorClusterModel,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = RecommendationCache::new(
            config.effective_cache_ttl_secs(),
            config.effective_cache_capacity(),
            clock.clone(),
        );
        Self {
            config,
            next_location,
            stay_duration,
            behavior,
            cache,
            clock,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear()
    }

    /// `(name, version)` of every model consulted.
    pub fn model_versions(&self) -> Vec<(String, String)> {
        vec![
            (
                self.next_location.name().to_string(),
                self.next_location.version().to_string(),
            ),
            (
                self.stay_duration.name().to_string(),
                self.stay_duration.version().to_string(),
            ),
            (
                self.behavior.name().to_string(),
                self.behavior.version().to_string(),
            ),
        ]
    }

    /// Combined recommendation for one entity's current-state vector.
    ///
    /// Results are cached by `(entity_id, vector hash)`; an identical
    /// vector within the TTL returns the cached recommendation.
    pub fn recommend(
        &self,
        vector: &FeatureVector,
    ) -> Result<MovementRecommendation, EngineError> {
        let hash = vector.content_hash();
        if let Some(cached) = self.cache.get(&vector.entity_id, hash) {
            debug!(entity_id = %vector.entity_id, "recommendation cache hit");
            return Ok(cached);
        }

        let next = self.next_location.predict_ranked(vector)?;
        let stay = self.stay_duration.predict_stay(vector)?;
        let cluster = self.behavior.predict_cluster(vector)?;
        let recommendation = self.combine(vector, &next, &stay, &cluster);

        self.cache
            .insert(&vector.entity_id, hash, recommendation.clone());
        Ok(recommendation)
    }

    /// Recommendations for a fleet, computed in parallel, with summary
    /// counts. Input order is preserved in the output.
    pub fn recommend_batch(
        &self,
        vectors: &[FeatureVector],
    ) -> Result<BatchRecommendationResult, EngineError> {
        let predictions: Vec<EntityPrediction> = vectors
            .par_iter()
            .map(|vector| {
                self.recommend(vector).map(|recommendation| EntityPrediction {
                    entity_id: vector.entity_id.clone(),
                    recommendation,
                })
            })
            .collect::<Result<_, EngineError>>()?;

        let mut summary = BatchSummary {
            total_entities: predictions.len(),
            ..BatchSummary::default()
        };
        for prediction in &predictions {
            let rec = &prediction.recommendation;
            if rec.priority == Priority::High {
                summary.needs_immediate_action += 1;
                summary.critical_entity_ids.push(rec.entity_id.clone());
            }
            match rec.best_action {
                Action::MoveNow => summary.ready_to_move += 1,
                Action::Wait => summary.can_wait += 1,
                Action::Monitor => {}
            }
        }
        summary.critical_entity_ids.sort_unstable();

        info!(
            entities = summary.total_entities,
            critical = summary.needs_immediate_action,
            "batch recommendations generated"
        );
        Ok(BatchRecommendationResult {
            predictions,
            summary,
            generated_at: self.clock.now(),
            model_versions: self.model_versions(),
        })
    }

    fn combine(
        &self,
        vector: &FeatureVector,
        next: &NextLocationPrediction,
        stay: &OptimalStayPrediction,
        cluster: &ClusterPrediction,
    ) -> MovementRecommendation {
        let idle = vector.metadata.current_idle_days;
        let predicted = stay.predicted_days;
        let stay_ready = predicted > 0.0;
        let top_confidence = next.top().map_or(0.0, |c| c.confidence);
        let high_threshold = self.config.effective_high_confidence_threshold();
        let approaching = self.config.effective_approaching_stay_fraction();

        let overdue = stay_ready && idle > predicted;
        let (priority, action) = if overdue && top_confidence >= high_threshold {
            (Priority::High, Action::MoveNow)
        } else if overdue {
            // Stale, but no confident destination to send it to.
            (Priority::Medium, Action::Monitor)
        } else if stay_ready && idle >= approaching * predicted {
            (Priority::Medium, Action::Wait)
        } else if stay_ready {
            (Priority::Low, Action::Wait)
        } else {
            (Priority::Low, Action::Monitor)
        };

        let locations: Vec<SuggestedLocation> = next
            .ranked
            .iter()
            .take(self.config.effective_top_k_locations())
            .map(|candidate| SuggestedLocation {
                location_id: candidate.location_id.clone(),
                confidence: candidate.confidence,
                estimated_stay_days: predicted,
            })
            .collect();

        let mut rationale_parts = Vec::new();
        if let Some(top) = next.top() {
            rationale_parts.push(top.rationale.clone());
        }
        rationale_parts.push(stay.rationale.clone());
        if cluster.cluster_id.is_some() {
            rationale_parts.push(cluster.rationale.clone());
        }

        let primary = RecommendationOption {
            priority,
            action,
            locations,
            rationale: rationale_parts.join("; "),
            confidence: top_confidence,
        };
        let mut options = vec![primary];
        if action == Action::MoveNow {
            options.push(RecommendationOption {
                priority: Priority::Low,
                action: Action::Wait,
                locations: vec![],
                rationale: "hold position and re-evaluate after the next observation".to_string(),
                confidence: (1.0 - top_confidence).max(0.0),
            });
        }

        MovementRecommendation {
            entity_id: vector.entity_id.clone(),
            current_location: vector.metadata.current_location.clone(),
            current_idle_days: idle,
            options,
            best_action: action,
            priority,
            risk_factors: self.risk_factors(vector, next, stay),
            opportunity_factors: self.opportunity_factors(vector, next, cluster),
        }
    }

    fn risk_factors(
        &self,
        vector: &FeatureVector,
        next: &NextLocationPrediction,
        stay: &OptimalStayPrediction,
    ) -> Vec<String> {
        let mut risks = Vec::new();
        let idle = vector.metadata.current_idle_days;
        let multiplier = self.config.effective_overdue_risk_multiplier();
        if stay.predicted_days > 0.0 && idle > multiplier * stay.predicted_days {
            risks.push(format!(
                "idle {idle:.1} days exceeds {multiplier:.1}x the predicted stay of {:.1} days",
                stay.predicted_days
            ));
        }
        if let Some(consistency) = vector.get("consistency_score") {
            if consistency < LOW_CONSISTENCY_THRESHOLD {
                risks.push(format!(
                    "irregular movement cadence (consistency {consistency:.2})"
                ));
            }
        }
        if next.ranked.is_empty() {
            risks.push("no destination signal from movement history".to_string());
        }
        risks
    }

    fn opportunity_factors(
        &self,
        vector: &FeatureVector,
        next: &NextLocationPrediction,
        cluster: &ClusterPrediction,
    ) -> Vec<String> {
        let mut opportunities = Vec::new();
        let high_threshold = self.config.effective_high_confidence_threshold();
        if let Some(top) = next.top() {
            if top.confidence >= high_threshold {
                opportunities.push(format!(
                    "strong destination signal toward {} (confidence {:.2})",
                    top.location_id, top.confidence
                ));
            }
        }
        if cluster.cluster_id.is_some() && cluster.similarity >= CLUSTER_MATCH_THRESHOLD {
            opportunities.push(format!(
                "behavior matches {} (similarity {:.2})",
                cluster.cluster_name, cluster.similarity
            ));
        }
        if vector.get("in_peak_month") == Some(1.0) {
            opportunities.push("in a seasonal peak movement month".to_string());
        }
        opportunities
    }
}
