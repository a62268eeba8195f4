//! # waypoint-features
//!
//! Turns raw movement/location records into model-ready feature vectors:
//! the data-preparation pipeline (per-movement features, per-entity
//! aggregates, labeled training sets, data-quality scoring) and the
//! feature engineer (vectorization, scaling, interaction terms, lookback
//! windows, missing-value and outlier handling).

pub mod engineer;
pub mod prep;

pub use engineer::scaling::{FeatureScaler, ScalingMethod};
pub use engineer::vectorize::{vectorize, FEATURE_NAMES};
pub use prep::DataPreparationPipeline;
pub use prep::quality::DataQualityReport;
