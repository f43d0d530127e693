use serde::{Deserialize, Serialize};

/// Value of `error` on every failure reply.
pub const INTERNAL_ERROR: &str = "ERROR INTERNO";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            error: INTERNAL_ERROR.to_string(),
            details: details.into(),
        }
    }
}
