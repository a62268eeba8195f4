//! Recommendation engine: combines the next-location, stay-duration, and
//! behavior-cluster models into actionable per-entity recommendations,
//! caches them, and renders batch reports.

pub mod cache;
pub mod engine;
pub mod report;

pub use cache::{CacheStats, RecommendationCache};
pub use engine::RecommendationEngine;
