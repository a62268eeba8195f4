//! Prediction models for mobile-asset movement.
//!
//! Three models share the [`PredictiveModel`] contract: a nearest-neighbor
//! classifier for the next destination, a gradient-descent regressor for the
//! optimal stay duration, and a k-means clusterer for behavioral grouping.
//! The `metrics` module scores them and the `training` module drives
//! cross-validation, grid search, and learning-curve diagnostics.

pub mod behavior_cluster;
pub mod contract;
pub mod metrics;
pub mod next_location;
pub mod stay_duration;
pub mod training;

pub use behavior_cluster::{BehaviorClusterModel, ClusterSummary, KMeansConfig};
pub use contract::PredictiveModel;
pub use next_location::{KnnConfig, NextLocationModel};
pub use stay_duration::{StayDurationConfig, StayDurationModel};
