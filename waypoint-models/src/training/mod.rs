//! Training pipeline: cross-validation, hyperparameter search,
//! learning-curve diagnostics, and model persistence.

pub mod cross_validation;
pub mod learning_curve;
pub mod persistence;
pub mod tuning;

pub use cross_validation::{cross_validate, CrossValidationResult, FoldScore, DEFAULT_FOLDS};
pub use learning_curve::{
    learning_curve, LearningCurvePoint, LearningCurveResult, DEFAULT_FRACTIONS,
    DEFAULT_OVERFIT_GAP,
};
pub use tuning::{grid_search, CandidateScore, GridSearchResult};
