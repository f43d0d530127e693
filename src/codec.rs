use serde::{Serialize, de::DeserializeOwned};
use tracing::error;

use crate::{
    error::{PipelineError, Result},
    models::reply::ErrorResponse,
};

/// Sent when an error reply itself cannot be serialized.
pub const ERROR_FALLBACK: &[u8] =
    br#"{"error":"ERROR INTERNO","details":"failed to encode error reply"}"#;

/// Unknown fields are ignored; a missing required field fails the whole decode.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(PipelineError::Decode)
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(PipelineError::Encode)
}

pub fn encode_error(reply: &ErrorResponse) -> Vec<u8> {
    serde_json::to_vec(reply).unwrap_or_else(|e| {
        error!(error = %e, "Failed to encode error reply, sending fallback");
        ERROR_FALLBACK.to_vec()
    })
}
