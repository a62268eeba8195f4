//! Model evaluation metrics.

pub mod classification;
pub mod clustering;
pub mod regression;

pub use classification::ClassificationMetrics;
pub use clustering::ClusteringMetrics;
pub use regression::RegressionMetrics;
