//! Pipeline configuration.
//!
//! Every threshold observed in operational data (peak-season multiplier,
//! consistency clamp, priority cutoffs, cache TTL) is a config field with
//! the observed default, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::errors::FeatureError;

/// Configuration for the data-preparation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrepConfig {
    /// Months (1–12) treated as the seasonal peak window for the
    /// per-movement seasonal flag. Default: Jun–Sep.
    pub seasonal_peak_months: Option<Vec<u32>>,
    /// A month is a peak month when its movement count exceeds this
    /// multiple of the per-month average. Default: 1.5.
    pub peak_month_multiplier: Option<f64>,
    /// Extra lowercase name markers that flag a location as a warehouse
    /// beyond its declared type.
    #[serde(default)]
    pub warehouse_name_markers: Vec<String>,
}

impl PrepConfig {
    pub fn effective_seasonal_peak_months(&self) -> Vec<u32> {
        self.seasonal_peak_months
            .clone()
            .unwrap_or_else(|| vec![6, 7, 8, 9])
    }

    pub fn effective_peak_month_multiplier(&self) -> f64 {
        self.peak_month_multiplier.unwrap_or(1.5)
    }
}

/// Geographic bounding region for the accuracy sub-score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingRegion {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

/// Configuration for data-quality assessment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QualityConfig {
    /// Coordinates outside this region count against the accuracy
    /// sub-score. When unset, in-bounds checking is skipped and accuracy
    /// only scores coordinate presence on resolvable locations.
    pub bounding_region: Option<BoundingRegion>,
}

/// Configuration for the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Top-location confidence at or above which a stale entity is High
    /// priority. Default: 0.6.
    pub high_confidence_threshold: Option<f64>,
    /// Fraction of the predicted stay at which idle time counts as
    /// "approaching" (Medium priority). Default: 0.7.
    pub approaching_stay_fraction: Option<f64>,
    /// Idle beyond this multiple of the predicted stay is a risk factor.
    /// Default: 1.5.
    pub overdue_risk_multiplier: Option<f64>,
    /// How many candidate locations a recommendation carries. Default: 3.
    pub top_k_locations: Option<usize>,
    /// Recommendation cache TTL in seconds. Default: 3600.
    pub cache_ttl_secs: Option<u64>,
    /// Maximum cached recommendations. Default: 10_000.
    pub cache_capacity: Option<usize>,
}

impl EngineConfig {
    pub fn effective_high_confidence_threshold(&self) -> f64 {
        self.high_confidence_threshold.unwrap_or(0.6)
    }

    pub fn effective_approaching_stay_fraction(&self) -> f64 {
        self.approaching_stay_fraction.unwrap_or(0.7)
    }

    pub fn effective_overdue_risk_multiplier(&self) -> f64 {
        self.overdue_risk_multiplier.unwrap_or(1.5)
    }

    pub fn effective_top_k_locations(&self) -> usize {
        self.top_k_locations.unwrap_or(3)
    }

    pub fn effective_cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(3600)
    }

    pub fn effective_cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(10_000)
    }
}

/// Top-level configuration for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WaypointConfig {
    pub prep: PrepConfig,
    pub quality: QualityConfig,
    pub engine: EngineConfig,
}

impl WaypointConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, FeatureError> {
        toml::from_str(text).map_err(|e| FeatureError::ConfigParse {
            message: e.to_string(),
        })
    }
}
