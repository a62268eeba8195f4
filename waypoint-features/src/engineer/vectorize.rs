//! Movement + aggregate → fixed-length named feature vector.
//!
//! The dimension count and name ordering are frozen: every vector built
//! here has the same shape, which is what lets models align features by
//! position. Changing `FEATURE_NAMES` is a breaking change for every
//! serialized model.

use waypoint_core::features::{EntityAggregateFeatures, MovementFeatures};
use waypoint_core::vector::{FeatureVector, VectorMetadata};

/// Canonical feature layout, in order.
pub const FEATURE_NAMES: [&str; 18] = [
    // Calendar
    "day_of_week",
    "month",
    "quarter",
    // Historical
    "avg_idle_days",
    "total_movements",
    "movements_per_month",
    // Current state
    "current_idle_days",
    "idle_vs_avg_ratio",
    "at_warehouse",
    "movement_type_weight",
    // Behavioral
    "consistency_score",
    "idle_stddev",
    "is_seasonal",
    "in_peak_month",
    "recency_days",
    // Affinity
    "region_visit_share",
    "warehouse_specialization",
    "consecutive_same_type",
];

/// Vectorize one historical movement: the current idle state is the
/// movement's own completed idle gap.
pub fn vectorize(
    movement: &MovementFeatures,
    aggregate: &EntityAggregateFeatures,
) -> FeatureVector {
    vectorize_with_idle(movement, aggregate, movement.idle_days)
}

/// Vectorize an entity's present state from its latest movement: the
/// current idle is the still-open gap (recency).
pub fn vectorize_current(
    movement: &MovementFeatures,
    aggregate: &EntityAggregateFeatures,
) -> FeatureVector {
    vectorize_with_idle(movement, aggregate, aggregate.recency_days)
}

fn vectorize_with_idle(
    movement: &MovementFeatures,
    aggregate: &EntityAggregateFeatures,
    current_idle_days: f64,
) -> FeatureVector {
    let idle_vs_avg = if aggregate.mean_idle_days > 0.0 {
        current_idle_days / aggregate.mean_idle_days
    } else {
        0.0
    };

    let values = vec![
        movement.day_of_week as f64,
        movement.month as f64,
        movement.quarter as f64,
        aggregate.mean_idle_days,
        aggregate.movement_count as f64,
        aggregate.movements_per_month,
        current_idle_days,
        idle_vs_avg,
        bool_feature(movement.to_warehouse),
        movement.movement_type.weight(),
        aggregate.consistency_score,
        aggregate.stddev_idle_days,
        bool_feature(movement.is_seasonal),
        bool_feature(aggregate.is_peak_month(movement.month)),
        aggregate.recency_days,
        aggregate.region_share(&movement.region),
        aggregate.warehouse_time_ratio,
        movement.consecutive_same_type as f64,
    ];

    let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    FeatureVector::new(&movement.entity_id, names, values, movement.arrival_time)
        .with_metadata(VectorMetadata {
            current_location: movement.to_location_id.clone(),
            current_idle_days,
            at_warehouse: movement.to_warehouse,
        })
}

fn bool_feature(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
