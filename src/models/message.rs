use std::collections::HashMap;

/// Header carrying the correlation identifier of a request.
pub const IDENTIFIER_HEADER: &str = "IDENTIFIER";

pub type Metadata = HashMap<String, serde_json::Value>;

/// One delivery as seen by the pipeline: the raw body plus its headers.
#[derive(Debug, Clone, Default)]
pub struct InboundEnvelope {
    pub payload: Vec<u8>,
    pub metadata: Metadata,
}

impl InboundEnvelope {
    pub fn new(payload: impl Into<Vec<u8>>, metadata: Metadata) -> Self {
        Self {
            payload: payload.into(),
            metadata,
        }
    }

    pub fn with_identifier(payload: impl Into<Vec<u8>>, identifier: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(
            IDENTIFIER_HEADER.to_string(),
            serde_json::Value::String(identifier.to_string()),
        );
        Self::new(payload, metadata)
    }

    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
