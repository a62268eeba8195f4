//! Portable export/import envelope shared by all models.
//!
//! The envelope is a JSON document carrying identification fields plus the
//! model state serialized to JSON and base64-encoded, so exported models can
//! travel through text-only channels (config files, HTTP bodies, logs).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use waypoint_core::errors::ModelError;

pub const ENVELOPE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    model_type: String,
    name: String,
    version: String,
    state: String,
}

/// Wraps serialized model state in a versioned envelope.
pub fn pack_model<S: Serialize>(
    model_type: &str,
    name: &str,
    version: &str,
    state: &S,
) -> Result<String, ModelError> {
    let state_json = serde_json::to_vec(state).map_err(|e| ModelError::ExportFailed {
        message: format!("state serialization failed: {e}"),
    })?;
    let envelope = ModelEnvelope {
        format_version: ENVELOPE_FORMAT_VERSION,
        model_type: model_type.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        state: BASE64.encode(state_json),
    };
    serde_json::to_string(&envelope).map_err(|e| ModelError::ExportFailed {
        message: format!("envelope serialization failed: {e}"),
    })
}

/// Opens an envelope, verifying it was produced by `expected_type`.
pub fn unpack_model<S: DeserializeOwned>(
    payload: &str,
    expected_type: &str,
) -> Result<S, ModelError> {
    let envelope: ModelEnvelope =
        serde_json::from_str(payload).map_err(|e| ModelError::ImportCorrupt {
            message: format!("invalid envelope: {e}"),
        })?;
    if envelope.format_version != ENVELOPE_FORMAT_VERSION {
        return Err(ModelError::ImportCorrupt {
            message: format!(
                "unsupported envelope format version {}",
                envelope.format_version
            ),
        });
    }
    if envelope.model_type != expected_type {
        return Err(ModelError::ImportWrongModel {
            expected: expected_type.to_string(),
            found: envelope.model_type,
        });
    }
    let state_json = BASE64
        .decode(envelope.state.as_bytes())
        .map_err(|e| ModelError::ImportCorrupt {
            message: format!("state is not valid base64: {e}"),
        })?;
    serde_json::from_slice(&state_json).map_err(|e| ModelError::ImportCorrupt {
        message: format!("state deserialization failed: {e}"),
    })
}
