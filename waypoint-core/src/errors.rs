//! Error types for the Waypoint workspace.
//!
//! Data-quality problems are never surfaced here — they are reported as
//! itemized issues by the quality assessor. These enums cover the fatal
//! categories: caller-contract violations (vector shape mismatches,
//! unfitted scalers) and corrupt persistence blobs.

/// Stable machine-readable error codes for every Waypoint error.
pub trait WaypointErrorCode {
    fn error_code(&self) -> &'static str;
}

pub mod error_code {
    pub const VECTOR_SHAPE_MISMATCH: &str = "WP_VECTOR_SHAPE_MISMATCH";
    pub const SCALER_NOT_FITTED: &str = "WP_SCALER_NOT_FITTED";
    pub const UNKNOWN_FEATURE_NAME: &str = "WP_UNKNOWN_FEATURE_NAME";
    pub const EMPTY_TRAINING_SET: &str = "WP_EMPTY_TRAINING_SET";
    pub const IMPORT_CORRUPT: &str = "WP_IMPORT_CORRUPT";
    pub const IMPORT_WRONG_MODEL: &str = "WP_IMPORT_WRONG_MODEL";
    pub const INVALID_HYPERPARAMETER: &str = "WP_INVALID_HYPERPARAMETER";
    pub const CONFIG_PARSE: &str = "WP_CONFIG_PARSE";
    pub const EXPORT_FAILED: &str = "WP_EXPORT_FAILED";
    pub const ENGINE_ERROR: &str = "WP_ENGINE_ERROR";
}

/// Errors from the feature-engineering layer.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// Train and inference vectors must agree on length and name order.
    /// This is a logic error upstream, not bad data.
    #[error("Feature vector shape mismatch: expected {expected} features, got {actual}")]
    VectorShapeMismatch { expected: usize, actual: usize },

    #[error("Scaler used before fit()")]
    ScalerNotFitted,

    #[error("Feature '{name}' not present in fitted scaler statistics")]
    UnknownFeatureName { name: String },

    #[error("Config parse error: {message}")]
    ConfigParse { message: String },
}

impl WaypointErrorCode for FeatureError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::VectorShapeMismatch { .. } => error_code::VECTOR_SHAPE_MISMATCH,
            Self::ScalerNotFitted => error_code::SCALER_NOT_FITTED,
            Self::UnknownFeatureName { .. } => error_code::UNKNOWN_FEATURE_NAME,
            Self::ConfigParse { .. } => error_code::CONFIG_PARSE,
        }
    }
}

/// Errors from model training, inference, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Feature vector shape mismatch: model trained on {expected} features, got {actual}")]
    FeatureShapeMismatch { expected: usize, actual: usize },

    #[error("Cannot train '{model}' on an empty sample set")]
    EmptyTrainingSet { model: String },

    #[error("Invalid hyperparameter {name}={value}: {reason}")]
    InvalidHyperparameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model export failed: {message}")]
    ExportFailed { message: String },

    #[error("Import blob is corrupt: {message}")]
    ImportCorrupt { message: String },

    #[error("Import blob is for model type '{found}', expected '{expected}'")]
    ImportWrongModel { expected: String, found: String },
}

impl WaypointErrorCode for ModelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FeatureShapeMismatch { .. } => error_code::VECTOR_SHAPE_MISMATCH,
            Self::EmptyTrainingSet { .. } => error_code::EMPTY_TRAINING_SET,
            Self::InvalidHyperparameter { .. } => error_code::INVALID_HYPERPARAMETER,
            Self::ExportFailed { .. } => error_code::EXPORT_FAILED,
            Self::ImportCorrupt { .. } => error_code::IMPORT_CORRUPT,
            Self::ImportWrongModel { .. } => error_code::IMPORT_WRONG_MODEL,
        }
    }
}

/// Errors from the recommendation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Report rendering failed: {message}")]
    ReportFailed { message: String },
}

impl WaypointErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Model(e) => e.error_code(),
            Self::Feature(e) => e.error_code(),
            Self::ReportFailed { .. } => error_code::ENGINE_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_code_stable() {
        let err = ModelError::FeatureShapeMismatch {
            expected: 18,
            actual: 12,
        };
        assert_eq!(err.error_code(), error_code::VECTOR_SHAPE_MISMATCH);
        assert!(err.to_string().contains("18"));
    }

    #[test]
    fn test_engine_error_delegates_code() {
        let err = EngineError::Model(ModelError::EmptyTrainingSet {
            model: "next_location".into(),
        });
        assert_eq!(err.error_code(), error_code::EMPTY_TRAINING_SET);
    }
}
