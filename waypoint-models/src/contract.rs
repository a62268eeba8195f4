//! Shared contract implemented by every prediction model.

use waypoint_core::errors::ModelError;
use waypoint_core::FeatureVector;

/// Common lifecycle for the three prediction models.
///
/// A freshly constructed model is not ready; a successful [`train`] call on a
/// non-empty sample set makes it ready. Predicting on a model that is not
/// ready must not fail: each model returns its neutral prediction instead.
///
/// [`train`]: PredictiveModel::train
pub trait PredictiveModel: Sized {
    /// Labeled training sample consumed by this model.
    type Sample;
    /// Per-vector prediction produced by this model.
    type Prediction;
    /// Evaluation summary for a held-out sample set.
    type Metrics;

    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str;

    /// Hyperparameters as `(name, value)` pairs, for reports and exports.
    fn hyperparameters(&self) -> Vec<(String, String)>;

    fn is_ready(&self) -> bool;

    /// Fits the model. An empty sample set is rejected with
    /// [`ModelError::EmptyTrainingSet`] and leaves the model unchanged.
    fn train(&mut self, samples: &[Self::Sample]) -> Result<(), ModelError>;

    /// Predicts for a single feature vector. Fails only on a malformed input
    /// (wrong vector shape), never because the model is untrained.
    fn predict(&self, vector: &FeatureVector) -> Result<Self::Prediction, ModelError>;

    /// Scores the model against labeled samples.
    fn evaluate(&self, samples: &[Self::Sample]) -> Result<Self::Metrics, ModelError>;

    /// Serializes the trained state into a portable string envelope.
    fn export(&self) -> Result<String, ModelError>;

    /// Restores a model from an envelope produced by [`export`].
    ///
    /// [`export`]: PredictiveModel::export
    fn import(payload: &str) -> Result<Self, ModelError>;
}
