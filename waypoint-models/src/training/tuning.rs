//! Hyperparameter grid search over cross-validated candidates.
//!
//! Candidates are scored in parallel. Cancellation is cooperative: the
//! token is checked before each candidate starts, and a cancelled search
//! still returns the candidates that finished, ranked.

use rayon::prelude::*;
use tracing::info;
use waypoint_core::errors::ModelError;
use waypoint_core::CancelToken;

use super::cross_validation::cross_validate;

#[derive(Debug, Clone)]
pub struct CandidateScore<P> {
    pub params: P,
    pub mean_score: f64,
    pub fold_scores: Vec<f64>,
}

#[derive(Debug)]
pub struct GridSearchResult<P> {
    /// Candidates ranked by mean score, best first. Partial when cancelled.
    pub ranked: Vec<CandidateScore<P>>,
    pub cancelled: bool,
}

impl<P> GridSearchResult<P> {
    pub fn best(&self) -> Option<&CandidateScore<P>> {
        self.ranked.first()
    }
}

/// Cross-validates every parameter combination and ranks them.
///
/// Scores follow the "higher is better" convention of
/// [`cross_validate`]. Ties rank by grid order, so a fixed grid yields a
/// fixed ranking.
pub fn grid_search<P, S, M>(
    grid: Vec<P>,
    samples: &[S],
    folds: usize,
    build: impl Fn(&P) -> Result<M, ModelError> + Sync,
    train: impl Fn(&mut M, &[S]) -> Result<(), ModelError> + Sync,
    score: impl Fn(&M, &[S]) -> f64 + Sync,
    cancel: &CancelToken,
) -> Result<GridSearchResult<P>, ModelError>
where
    P: Send,
    S: Clone + Sync,
    M: Send,
{
    let total = grid.len();
    let outcomes: Vec<Option<(usize, CandidateScore<P>)>> = grid
        .into_par_iter()
        .enumerate()
        .map(|(index, params)| {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let result = cross_validate(
                samples,
                folds,
                || build(&params),
                |model, slice| train(model, slice),
                |model, slice| score(model, slice),
            )?;
            Ok(Some((
                index,
                CandidateScore {
                    params,
                    mean_score: result.mean_score,
                    fold_scores: result
                        .fold_scores
                        .iter()
                        .map(|f| f.validation_score)
                        .collect(),
                },
            )))
        })
        .collect::<Result<_, ModelError>>()?;

    let mut scored: Vec<(usize, CandidateScore<P>)> = outcomes.into_iter().flatten().collect();
    scored.sort_by(|a, b| b.1.mean_score.total_cmp(&a.1.mean_score).then(a.0.cmp(&b.0)));

    let cancelled = cancel.is_cancelled();
    info!(
        evaluated = scored.len(),
        total, cancelled, "grid search complete"
    );
    Ok(GridSearchResult {
        ranked: scored.into_iter().map(|(_, c)| c).collect(),
        cancelled,
    })
}
