//! Feature engineering: vectorization, scaling, expansion, windows,
//! missing-value strategies, and outlier flagging.

pub mod expansion;
pub mod missing;
pub mod outliers;
pub mod scaling;
pub mod vectorize;
pub mod windows;
