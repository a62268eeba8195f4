//! K-fold cross-validation with contiguous, deterministic folds.
//!
//! Folds are contiguous slices of the input in its given order, never
//! shuffled, so repeated runs over the same dataset produce identical
//! splits. Scores follow the "higher is better" convention; regression
//! callers pass a negated error.

use tracing::debug;
use waypoint_core::errors::ModelError;

pub const DEFAULT_FOLDS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct FoldScore {
    pub fold: usize,
    pub validation_score: f64,
}

#[derive(Debug)]
pub struct CrossValidationResult<M> {
    pub fold_scores: Vec<FoldScore>,
    pub mean_score: f64,
    /// The model from the best-scoring fold.
    pub best_model: M,
    pub best_fold: usize,
}

/// Runs k-fold cross-validation.
///
/// `build` constructs a fresh model, `train` fits it on a training slice,
/// and `score` rates it on the held-out fold. With fewer than two usable
/// folds the model is fit and scored on the full set as a single fold.
pub fn cross_validate<S, M>(
    samples: &[S],
    folds: usize,
    build: impl Fn() -> Result<M, ModelError>,
    train: impl Fn(&mut M, &[S]) -> Result<(), ModelError>,
    score: impl Fn(&M, &[S]) -> f64,
) -> Result<CrossValidationResult<M>, ModelError>
where
    S: Clone,
{
    if folds == 0 {
        return Err(ModelError::InvalidHyperparameter {
            name: "folds".to_string(),
            value: "0".to_string(),
            reason: "at least one fold is required".to_string(),
        });
    }
    if samples.is_empty() {
        return Err(ModelError::EmptyTrainingSet {
            model: "cross-validation".to_string(),
        });
    }

    let n = samples.len();
    let effective_folds = folds.min(n);
    if effective_folds < 2 {
        let mut model = build()?;
        train(&mut model, samples)?;
        let validation_score = score(&model, samples);
        return Ok(CrossValidationResult {
            fold_scores: vec![FoldScore {
                fold: 0,
                validation_score,
            }],
            mean_score: validation_score,
            best_model: model,
            best_fold: 0,
        });
    }

    let mut fold_scores = Vec::with_capacity(effective_folds);
    let mut best: Option<(usize, f64, M)> = None;
    for fold in 0..effective_folds {
        let start = fold * n / effective_folds;
        let end = (fold + 1) * n / effective_folds;

        let mut training: Vec<S> = Vec::with_capacity(n - (end - start));
        training.extend_from_slice(&samples[..start]);
        training.extend_from_slice(&samples[end..]);

        let mut model = build()?;
        train(&mut model, &training)?;
        let validation_score = score(&model, &samples[start..end]);
        debug!(fold, validation_score, "cross-validation fold complete");
        fold_scores.push(FoldScore {
            fold,
            validation_score,
        });

        let better = best
            .as_ref()
            .map_or(true, |(_, s, _)| validation_score > *s);
        if better {
            best = Some((fold, validation_score, model));
        }
    }

    let mean_score =
        fold_scores.iter().map(|f| f.validation_score).sum::<f64>() / fold_scores.len() as f64;
    let (best_fold, _, best_model) = best.expect("at least one fold ran");
    Ok(CrossValidationResult {
        fold_scores,
        mean_score,
        best_model,
        best_fold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy model: remembers the mean of its training targets.
    #[derive(Debug, Default)]
    struct MeanModel {
        mean: f64,
    }

    fn fit(model: &mut MeanModel, samples: &[f64]) -> Result<(), ModelError> {
        model.mean = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
        Ok(())
    }

    fn neg_mae(model: &MeanModel, samples: &[f64]) -> f64 {
        -samples.iter().map(|s| (s - model.mean).abs()).sum::<f64>() / samples.len().max(1) as f64
    }

    #[test]
    fn test_runs_requested_folds() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let result = cross_validate(&samples, 5, || Ok(MeanModel::default()), fit, neg_mae).unwrap();
        assert_eq!(result.fold_scores.len(), 5);
        assert!(result.mean_score <= 0.0);
    }

    #[test]
    fn test_folds_are_contiguous_and_deterministic() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let a = cross_validate(&samples, 5, || Ok(MeanModel::default()), fit, neg_mae).unwrap();
        let b = cross_validate(&samples, 5, || Ok(MeanModel::default()), fit, neg_mae).unwrap();
        for (x, y) in a.fold_scores.iter().zip(&b.fold_scores) {
            assert_eq!(x.validation_score, y.validation_score);
        }
        assert_eq!(a.best_fold, b.best_fold);
    }

    #[test]
    fn test_perfect_data_scores_zero_error() {
        let samples = vec![5.0; 8];
        let result = cross_validate(&samples, 4, || Ok(MeanModel::default()), fit, neg_mae).unwrap();
        assert_eq!(result.mean_score, 0.0);
        assert_eq!(result.best_model.mean, 5.0);
    }

    #[test]
    fn test_single_sample_degenerates_to_one_fold() {
        let samples = vec![3.0];
        let result = cross_validate(&samples, 5, || Ok(MeanModel::default()), fit, neg_mae).unwrap();
        assert_eq!(result.fold_scores.len(), 1);
        assert_eq!(result.best_model.mean, 3.0);
    }

    #[test]
    fn test_zero_folds_rejected() {
        let err = cross_validate(&[1.0], 0, || Ok(MeanModel::default()), fit, neg_mae).unwrap_err();
        assert!(matches!(err, ModelError::InvalidHyperparameter { .. }));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let err = cross_validate(&[], 5, || Ok(MeanModel::default()), fit, neg_mae).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTrainingSet { .. }));
    }
}
