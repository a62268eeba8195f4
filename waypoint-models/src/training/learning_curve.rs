//! Learning-curve diagnostics for over/underfitting.
//!
//! Holds out the tail of the dataset as a fixed validation set, then fits
//! on growing prefixes of the remainder and compares train vs validation
//! scores at each size.

use tracing::debug;
use waypoint_core::errors::ModelError;

pub const DEFAULT_FRACTIONS: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

/// Train-minus-validation score gap above which the curve is flagged.
pub const DEFAULT_OVERFIT_GAP: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct LearningCurvePoint {
    pub fraction: f64,
    pub train_size: usize,
    pub train_score: f64,
    pub validation_score: f64,
}

impl LearningCurvePoint {
    pub fn gap(&self) -> f64 {
        self.train_score - self.validation_score
    }
}

#[derive(Debug, Clone)]
pub struct LearningCurveResult {
    pub points: Vec<LearningCurvePoint>,
    /// True when the final gap exceeds the threshold and has not shrunk
    /// relative to the smallest training size.
    pub overfitting: bool,
}

/// Fits at each training fraction and scores train vs held-out validation.
///
/// The last fifth of the samples (at least one) is the validation set at
/// every point. `fractions` apply to the remaining training pool.
pub fn learning_curve<S, M>(
    samples: &[S],
    fractions: &[f64],
    overfit_gap: f64,
    build: impl Fn() -> Result<M, ModelError>,
    train: impl Fn(&mut M, &[S]) -> Result<(), ModelError>,
    score: impl Fn(&M, &[S]) -> f64,
) -> Result<LearningCurveResult, ModelError>
where
    S: Clone,
{
    let holdout = (samples.len() / 5).max(1);
    if samples.len() <= holdout {
        return Err(ModelError::EmptyTrainingSet {
            model: "learning-curve".to_string(),
        });
    }
    let pool = &samples[..samples.len() - holdout];
    let validation = &samples[samples.len() - holdout..];

    let mut points = Vec::with_capacity(fractions.len());
    for &fraction in fractions {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ModelError::InvalidHyperparameter {
                name: "fraction".to_string(),
                value: fraction.to_string(),
                reason: "must be in [0, 1]".to_string(),
            });
        }
        let train_size = ((pool.len() as f64 * fraction).round() as usize)
            .clamp(1, pool.len());
        let slice = &pool[..train_size];

        let mut model = build()?;
        train(&mut model, slice)?;
        let point = LearningCurvePoint {
            fraction,
            train_size,
            train_score: score(&model, slice),
            validation_score: score(&model, validation),
        };
        debug!(
            fraction,
            train_size,
            train_score = point.train_score,
            validation_score = point.validation_score,
            "learning-curve point"
        );
        points.push(point);
    }

    let overfitting = match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            last.gap() > overfit_gap && last.gap() + 1e-9 >= first.gap()
        }
        _ => false,
    };
    Ok(LearningCurveResult { points, overfitting })
}
