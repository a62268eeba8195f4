//! Outlier flagging utilities.
//!
//! Both detectors flag, never filter: callers decide what to do with a
//! flagged value.

pub mod iqr;
pub mod zscore;

/// One flagged value.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFlag {
    pub index: usize,
    pub value: f64,
    /// The detector's test statistic: the value itself for IQR, |z| for
    /// z-score.
    pub test_statistic: f64,
}
