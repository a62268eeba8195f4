//! Data preparation: records → features → aggregates → labeled dataset.

pub mod aggregate;
pub mod dataset;
pub mod extract;
pub mod quality;

pub use dataset::DataPreparationPipeline;
