//! Interaction and polynomial feature expansion.
//!
//! Both expansions are strictly additive: base features keep their
//! positions and the derived terms are appended after them.

use waypoint_core::errors::FeatureError;
use waypoint_core::vector::FeatureVector;

/// Append products of the named feature pairs as `a*b` features.
///
/// Naming a feature the vector does not carry is a contract violation.
pub fn append_interactions(
    vector: &mut FeatureVector,
    pairs: &[(&str, &str)],
) -> Result<(), FeatureError> {
    for (a, b) in pairs {
        let left = vector
            .get(a)
            .ok_or_else(|| FeatureError::UnknownFeatureName { name: a.to_string() })?;
        let right = vector
            .get(b)
            .ok_or_else(|| FeatureError::UnknownFeatureName { name: b.to_string() })?;
        vector.names.push(format!("{a}*{b}"));
        vector.values.push(left * right);
    }
    // Appending invalidates any previously computed normalized copy.
    vector.normalized = None;
    Ok(())
}

/// Append squares of every base feature as `name^2` features.
///
/// `base_len` bounds the expansion so calling this after an interaction
/// pass squares only the original features.
pub fn append_squared_terms(vector: &mut FeatureVector, base_len: usize) {
    let limit = base_len.min(vector.values.len());
    for i in 0..limit {
        vector.names.push(format!("{}^2", vector.names[i]));
        vector.values.push(vector.values[i] * vector.values[i]);
    }
    vector.normalized = None;
}
