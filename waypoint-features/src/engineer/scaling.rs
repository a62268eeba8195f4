//! Feature normalization.
//!
//! Statistics are fitted once over a reference corpus and keyed by
//! feature *name*, not position, so a vector whose names were reordered
//! still normalizes correctly. Train and inference must share the same
//! fitted scaler; refitting invalidates previously normalized vectors.

use serde::{Deserialize, Serialize};

use waypoint_core::collections::FxHashMap;
use waypoint_core::errors::FeatureError;
use waypoint_core::vector::FeatureVector;

/// Which transform `FeatureScaler::transform` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingMethod {
    /// (x − min) / (max − min); 0 when max == min.
    MinMax,
    /// (x − mean) / stddev; 0 when stddev == 0.
    ZScore,
}

/// Per-feature fitted statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
}

/// Name-keyed normalization statistics. Serializable so a trained
/// model's scaler travels with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureScaler {
    stats: FxHashMap<String, FeatureStats>,
    fitted: bool,
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Fit min/max and mean/stddev per feature name in one pass over the
    /// corpus. Fully replaces any previous fit.
    pub fn fit(&mut self, corpus: &[FeatureVector]) {
        let mut grouped: FxHashMap<&str, Vec<f64>> = FxHashMap::default();
        for vector in corpus {
            for (name, &value) in vector.names.iter().zip(&vector.values) {
                grouped.entry(name.as_str()).or_default().push(value);
            }
        }

        self.stats = grouped
            .into_iter()
            .map(|(name, values)| {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (
                    name.to_string(),
                    FeatureStats {
                        min,
                        max,
                        mean,
                        stddev: variance.sqrt(),
                    },
                )
            })
            .collect();
        self.fitted = !self.stats.is_empty();
    }

    /// Populate `vector.normalized` using the fitted statistics.
    ///
    /// Using an unfitted scaler or a vector naming a feature the fit
    /// never saw is a caller-contract violation.
    pub fn transform(
        &self,
        vector: &mut FeatureVector,
        method: ScalingMethod,
    ) -> Result<(), FeatureError> {
        if !self.fitted {
            return Err(FeatureError::ScalerNotFitted);
        }
        let mut normalized = Vec::with_capacity(vector.values.len());
        for (name, &value) in vector.names.iter().zip(&vector.values) {
            let stats = self.stats.get(name).ok_or_else(|| {
                FeatureError::UnknownFeatureName { name: name.clone() }
            })?;
            normalized.push(scale_value(value, stats, method));
        }
        vector.normalized = Some(normalized);
        Ok(())
    }

    /// Transform a bare value slice aligned with `names`.
    pub fn transform_values(
        &self,
        names: &[String],
        values: &[f64],
        method: ScalingMethod,
    ) -> Result<Vec<f64>, FeatureError> {
        if !self.fitted {
            return Err(FeatureError::ScalerNotFitted);
        }
        if names.len() != values.len() {
            return Err(FeatureError::VectorShapeMismatch {
                expected: names.len(),
                actual: values.len(),
            });
        }
        names
            .iter()
            .zip(values)
            .map(|(name, &value)| {
                self.stats
                    .get(name)
                    .map(|stats| scale_value(value, stats, method))
                    .ok_or_else(|| FeatureError::UnknownFeatureName { name: name.clone() })
            })
            .collect()
    }
}

fn scale_value(value: f64, stats: &FeatureStats, method: ScalingMethod) -> f64 {
    match method {
        ScalingMethod::MinMax => {
            let range = stats.max - stats.min;
            if range == 0.0 {
                0.0
            } else {
                (value - stats.min) / range
            }
        }
        ScalingMethod::ZScore => {
            if stats.stddev == 0.0 {
                0.0
            } else {
                (value - stats.mean) / stats.stddev
            }
        }
    }
}
