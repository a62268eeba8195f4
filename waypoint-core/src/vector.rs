//! Fixed-length numeric feature vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// Context carried alongside a vector for recommendation rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub current_location: String,
    pub current_idle_days: f64,
    pub at_warehouse: bool,
}

/// The fixed-length numeric encoding of one movement/entity state.
///
/// Invariant: two vectors produced by the same construction path have
/// identical length and identical name ordering. `names[i]` describes
/// `values[i]`. Models align features by position and must reject
/// vectors of a different shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub entity_id: String,
    pub values: Vec<f64>,
    pub names: Vec<String>,
    /// Normalized copy, populated by a fitted scaler. `None` until then.
    pub normalized: Option<Vec<f64>>,
    pub created_at: DateTime<Utc>,
    pub metadata: VectorMetadata,
}

impl FeatureVector {
    pub fn new(
        entity_id: impl Into<String>,
        names: Vec<String>,
        values: Vec<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            entity_id: entity_id.into(),
            values,
            names,
            normalized: None,
            created_at,
            metadata: VectorMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: VectorMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// True when every value is finite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Content hash over (name, value) pairs — cache key material.
    /// Bit-level value identity is intentional: a vector that changed in
    /// any dimension must miss the cache.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for (name, value) in self.names.iter().zip(&self.values) {
            hasher.update(name.as_bytes());
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_vector(values: Vec<f64>) -> FeatureVector {
        let names = (0..values.len()).map(|i| format!("f{i}")).collect();
        FeatureVector::new(
            "cow-1",
            names,
            values,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_get_by_name() {
        let v = make_vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.get("f1"), Some(2.0));
        assert_eq!(v.get("missing"), None);
    }

    #[test]
    fn test_content_hash_stable_and_sensitive() {
        let a = make_vector(vec![1.0, 2.0]);
        let b = make_vector(vec![1.0, 2.0]);
        let c = make_vector(vec![1.0, 2.5]);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_is_finite() {
        assert!(make_vector(vec![0.0, -1.0]).is_finite());
        assert!(!make_vector(vec![0.0, f64::NAN]).is_finite());
    }
}
