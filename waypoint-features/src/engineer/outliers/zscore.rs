//! Z-score outlier flagging.
//!
//! Flags values with |z| above the threshold. Assumes roughly normal
//! data; prefer the IQR detector for skewed gap distributions.

use super::OutlierFlag;

/// Default |z| threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Flag values whose z-score magnitude exceeds `threshold`.
/// Zero-variance input produces no flags rather than NaN scores.
pub fn detect(values: &[f64], threshold: f64) -> Vec<OutlierFlag> {
    if values.len() < 3 {
        return Vec::new();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev == 0.0 || !stddev.is_finite() {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z = (value - mean) / stddev;
            (z.abs() > threshold).then_some(OutlierFlag {
                index,
                value,
                test_statistic: z.abs(),
            })
        })
        .collect()
}
