//! Linear regression for the optimal stay duration.
//!
//! Fits by plain batch gradient descent over z-scored features; the
//! normalization statistics are learned at train time and stored with the
//! weights so prediction sees the same scaling. Outputs are hard-clamped
//! to a sane day range so a weird input can never produce a negative or
//! multi-year stay.

use serde::{Deserialize, Serialize};
use tracing::debug;
use waypoint_core::dataset::RegressionSample;
use waypoint_core::errors::ModelError;
use waypoint_core::predictions::OptimalStayPrediction;
use waypoint_core::FeatureVector;

use crate::contract::PredictiveModel;
use crate::metrics::regression::{self, RegressionMetrics};
use crate::training::persistence;

pub const MODEL_TYPE: &str = "stay-duration-linear";
const MODEL_VERSION: &str = "1.0.0";

/// Half-width of the reported prediction interval, as a fraction.
const INTERVAL_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayDurationConfig {
    pub learning_rate: f64,
    pub iterations: usize,
    /// Lower clamp on predicted stay, in days.
    pub min_stay_days: f64,
    /// Upper clamp on predicted stay, in days.
    pub max_stay_days: f64,
}

impl Default for StayDurationConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 1000,
            min_stay_days: 1.0,
            max_stay_days: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearState {
    weights: Vec<f64>,
    intercept: f64,
    /// Per-feature mean/stddev frozen at train time.
    means: Vec<f64>,
    stddevs: Vec<f64>,
    sample_count: usize,
}

/// Export payload pairing the fitted state with the hyperparameters
/// (clamp bounds included) so imports behave like the original.
#[derive(Debug, Serialize, Deserialize)]
struct LinearExport {
    config: StayDurationConfig,
    state: LinearState,
}

/// Gradient-descent stay-duration regressor.
#[derive(Debug, Clone)]
pub struct StayDurationModel {
    config: StayDurationConfig,
    state: Option<LinearState>,
}

impl Default for StayDurationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl StayDurationModel {
    pub fn new() -> Self {
        Self {
            config: StayDurationConfig::default(),
            state: None,
        }
    }

    pub fn with_config(config: StayDurationConfig) -> Result<Self, ModelError> {
        if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
            return Err(ModelError::InvalidHyperparameter {
                name: "learning_rate".to_string(),
                value: config.learning_rate.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if config.iterations == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "iterations".to_string(),
                value: "0".to_string(),
                reason: "at least one descent step is required".to_string(),
            });
        }
        if !(config.min_stay_days < config.max_stay_days) {
            return Err(ModelError::InvalidHyperparameter {
                name: "min_stay_days".to_string(),
                value: config.min_stay_days.to_string(),
                reason: "must be strictly below max_stay_days".to_string(),
            });
        }
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Predicted stay in days, clamped, with interval and readiness.
    pub fn predict_stay(
        &self,
        vector: &FeatureVector,
    ) -> Result<OptimalStayPrediction, ModelError> {
        let Some(state) = &self.state else {
            return Ok(OptimalStayPrediction::untrained());
        };
        if vector.len() != state.weights.len() {
            return Err(ModelError::FeatureShapeMismatch {
                expected: state.weights.len(),
                actual: vector.len(),
            });
        }

        let mut raw = state.intercept;
        for (j, value) in vector.values.iter().enumerate() {
            raw += state.weights[j] * zscore(*value, state.means[j], state.stddevs[j]);
        }
        let predicted = raw.clamp(self.config.min_stay_days, self.config.max_stay_days);
        let idle = vector.metadata.current_idle_days;
        let readiness = (idle / predicted).clamp(0.0, 1.0);
        Ok(OptimalStayPrediction {
            predicted_days: predicted,
            interval: (
                predicted * (1.0 - INTERVAL_FRACTION),
                predicted * (1.0 + INTERVAL_FRACTION),
            ),
            movement_readiness: readiness,
            rationale: format!(
                "predicted optimal stay of {predicted:.1} days (fit on {} movements); \
                 currently idle {idle:.1} days",
                state.sample_count
            ),
        })
    }
}

impl PredictiveModel for StayDurationModel {
    type Sample = RegressionSample;
    type Prediction = OptimalStayPrediction;
    type Metrics = RegressionMetrics;

    fn name(&self) -> &'static str {
        "stay-duration"
    }

    fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    fn hyperparameters(&self) -> Vec<(String, String)> {
        vec![
            (
                "learning_rate".to_string(),
                self.config.learning_rate.to_string(),
            ),
            ("iterations".to_string(), self.config.iterations.to_string()),
            (
                "min_stay_days".to_string(),
                self.config.min_stay_days.to_string(),
            ),
            (
                "max_stay_days".to_string(),
                self.config.max_stay_days.to_string(),
            ),
        ]
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn train(&mut self, samples: &[RegressionSample]) -> Result<(), ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet {
                model: self.name().to_string(),
            });
        }
        let feature_len = samples[0].vector.len();
        for sample in samples {
            if sample.vector.len() != feature_len {
                return Err(ModelError::FeatureShapeMismatch {
                    expected: feature_len,
                    actual: sample.vector.len(),
                });
            }
        }

        let n = samples.len() as f64;
        let mut means = vec![0.0; feature_len];
        let mut stddevs = vec![0.0; feature_len];
        for j in 0..feature_len {
            let mean = samples.iter().map(|s| s.vector.values[j]).sum::<f64>() / n;
            let variance = samples
                .iter()
                .map(|s| {
                    let d = s.vector.values[j] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            means[j] = mean;
            stddevs[j] = variance.sqrt();
        }

        let scaled: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| {
                s.vector
                    .values
                    .iter()
                    .enumerate()
                    .map(|(j, v)| zscore(*v, means[j], stddevs[j]))
                    .collect()
            })
            .collect();
        let targets: Vec<f64> = samples.iter().map(|s| s.stay_days).collect();

        let mut weights = vec![0.0; feature_len];
        let mut intercept = 0.0;
        for _ in 0..self.config.iterations {
            let mut grad_w = vec![0.0; feature_len];
            let mut grad_b = 0.0;
            for (row, target) in scaled.iter().zip(&targets) {
                let prediction = intercept
                    + row
                        .iter()
                        .zip(&weights)
                        .map(|(x, w)| x * w)
                        .sum::<f64>();
                let err = prediction - target;
                grad_b += err;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
            }
            intercept -= self.config.learning_rate * 2.0 * grad_b / n;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= self.config.learning_rate * 2.0 * g / n;
            }
        }

        debug!(
            samples = samples.len(),
            iterations = self.config.iterations,
            intercept,
            "trained stay-duration model"
        );
        self.state = Some(LinearState {
            weights,
            intercept,
            means,
            stddevs,
            sample_count: samples.len(),
        });
        Ok(())
    }

    fn predict(&self, vector: &FeatureVector) -> Result<OptimalStayPrediction, ModelError> {
        self.predict_stay(vector)
    }

    fn evaluate(&self, samples: &[RegressionSample]) -> Result<RegressionMetrics, ModelError> {
        let mut predicted = Vec::with_capacity(samples.len());
        let mut actual = Vec::with_capacity(samples.len());
        for sample in samples {
            predicted.push(self.predict_stay(&sample.vector)?.predicted_days);
            actual.push(sample.stay_days);
        }
        Ok(regression::compute(&predicted, &actual))
    }

    fn export(&self) -> Result<String, ModelError> {
        let state = self.state.as_ref().ok_or_else(|| ModelError::ExportFailed {
            message: "model has not been trained".to_string(),
        })?;
        let export = LinearExport {
            config: self.config.clone(),
            state: state.clone(),
        };
        persistence::pack_model(MODEL_TYPE, self.name(), self.version(), &export)
    }

    fn import(payload: &str) -> Result<Self, ModelError> {
        let export: LinearExport = persistence::unpack_model(payload, MODEL_TYPE)?;
        Ok(Self {
            config: export.config,
            state: Some(export.state),
        })
    }
}

/// Z-score with a zero-variance guard: constant columns contribute 0.
fn zscore(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev == 0.0 {
        0.0
    } else {
        (value - mean) / stddev
    }
}
