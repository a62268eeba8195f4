//! IQR-based outlier flagging.
//!
//! Flags values outside [Q1 − k·IQR, Q3 + k·IQR]. Robust to moderately
//! skewed data; the usual choice for small movement-gap samples.

use statrs::statistics::{Data, OrderStatistics};

use super::OutlierFlag;

/// Default fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Flag values outside the IQR fences. `k` widens or narrows the
/// fences (default 1.5). Fewer than 4 values cannot support quartiles.
pub fn detect(values: &[f64], k: f64) -> Vec<OutlierFlag> {
    if values.len() < 4 {
        return Vec::new();
    }

    let mut data = Data::new(values.to_vec());
    let q1 = data.lower_quartile();
    let q3 = data.upper_quartile();
    let iqr = q3 - q1;

    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;

    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < lower || v > upper)
        .map(|(index, &value)| OutlierFlag {
            index,
            value,
            test_statistic: value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_extreme_value() {
        let mut values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        values.push(500.0);
        let flags = detect(&values, DEFAULT_IQR_MULTIPLIER);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].index, 20);
        assert_eq!(flags[0].value, 500.0);
    }

    #[test]
    fn test_uniform_data_no_flags() {
        let values = vec![10.0; 30];
        assert!(detect(&values, DEFAULT_IQR_MULTIPLIER).is_empty());
    }

    #[test]
    fn test_wider_fences_flag_less() {
        let mut values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        values.push(45.0);
        let tight = detect(&values, 1.0);
        let loose = detect(&values, 5.0);
        assert!(tight.len() >= loose.len());
    }

    #[test]
    fn test_too_few_values() {
        assert!(detect(&[1.0, 100.0, 2.0], DEFAULT_IQR_MULTIPLIER).is_empty());
    }
}
