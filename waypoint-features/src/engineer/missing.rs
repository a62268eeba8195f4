//! Missing-value handling.
//!
//! A "missing" value is any non-finite entry (NaN or ±inf). The three
//! strategies are interchangeable and caller-selected; the engineer
//! itself does not privilege one.

use serde::{Deserialize, Serialize};

use waypoint_core::collections::FxHashMap;
use waypoint_core::vector::FeatureVector;

/// How to treat vectors containing non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingValueStrategy {
    /// Replace each missing slot with the column mean over finite values.
    FillMean,
    /// Carry the previous vector's value for that feature forward;
    /// leading missing values fall back to the column mean.
    ForwardFill,
    /// Drop any vector containing a missing value.
    DropRow,
}

/// Apply `strategy` across the batch, returning the cleaned vectors.
pub fn handle_missing(
    mut vectors: Vec<FeatureVector>,
    strategy: MissingValueStrategy,
) -> Vec<FeatureVector> {
    match strategy {
        MissingValueStrategy::DropRow => {
            vectors.retain(|v| v.is_finite());
            vectors
        }
        MissingValueStrategy::FillMean => {
            let means = column_means(&vectors);
            for vector in &mut vectors {
                fill_from(vector, &means);
            }
            vectors
        }
        MissingValueStrategy::ForwardFill => {
            let means = column_means(&vectors);
            let mut last_seen: FxHashMap<String, f64> = FxHashMap::default();
            for vector in &mut vectors {
                for (name, value) in vector.names.iter().zip(vector.values.iter_mut()) {
                    if value.is_finite() {
                        last_seen.insert(name.clone(), *value);
                    } else {
                        *value = last_seen
                            .get(name)
                            .copied()
                            .or_else(|| means.get(name).copied())
                            .unwrap_or(0.0);
                    }
                }
            }
            vectors
        }
    }
}

fn column_means(vectors: &[FeatureVector]) -> FxHashMap<String, f64> {
    let mut sums: FxHashMap<&str, (f64, usize)> = FxHashMap::default();
    for vector in vectors {
        for (name, &value) in vector.names.iter().zip(&vector.values) {
            if value.is_finite() {
                let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
    }
    sums.into_iter()
        .map(|(name, (sum, count))| {
            let mean = if count > 0 { sum / count as f64 } else { 0.0 };
            (name.to_string(), mean)
        })
        .collect()
}

fn fill_from(vector: &mut FeatureVector, means: &FxHashMap<String, f64>) {
    for (name, value) in vector.names.iter().zip(vector.values.iter_mut()) {
        if !value.is_finite() {
            *value = means.get(name).copied().unwrap_or(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_vector(values: &[f64]) -> FeatureVector {
        FeatureVector::new(
            "cow-1",
            (0..values.len()).map(|i| format!("f{i}")).collect(),
            values.to_vec(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_drop_row() {
        let vectors = vec![
            make_vector(&[1.0, 2.0]),
            make_vector(&[f64::NAN, 2.0]),
            make_vector(&[3.0, f64::INFINITY]),
        ];
        let cleaned = handle_missing(vectors, MissingValueStrategy::DropRow);
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn test_fill_mean() {
        let vectors = vec![
            make_vector(&[1.0, 10.0]),
            make_vector(&[3.0, f64::NAN]),
            make_vector(&[f64::NAN, 30.0]),
        ];
        let cleaned = handle_missing(vectors, MissingValueStrategy::FillMean);
        // Column f0 mean over finite values = 2.0; f1 mean = 20.0.
        assert_eq!(cleaned[2].values[0], 2.0);
        assert_eq!(cleaned[1].values[1], 20.0);
        assert_eq!(cleaned[0].values[0], 1.0);
    }

    #[test]
    fn test_forward_fill_carries_previous() {
        let vectors = vec![
            make_vector(&[5.0]),
            make_vector(&[f64::NAN]),
            make_vector(&[9.0]),
            make_vector(&[f64::NAN]),
        ];
        let cleaned = handle_missing(vectors, MissingValueStrategy::ForwardFill);
        assert_eq!(cleaned[1].values[0], 5.0);
        assert_eq!(cleaned[3].values[0], 9.0);
    }

    #[test]
    fn test_forward_fill_leading_gap_uses_mean() {
        let vectors = vec![make_vector(&[f64::NAN]), make_vector(&[4.0])];
        let cleaned = handle_missing(vectors, MissingValueStrategy::ForwardFill);
        assert_eq!(cleaned[0].values[0], 4.0);
    }
}
