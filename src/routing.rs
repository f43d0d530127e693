use crate::{
    error::{PipelineError, Result},
    models::message::{IDENTIFIER_HEADER, Metadata},
};

/// Reply exchange for a request: `<prefix>-<identifier>`.
pub fn destination_name(prefix: &str, identifier: &str) -> String {
    format!("{}-{}", prefix, identifier)
}

/// Typed view over the headers the pipeline cannot work without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredMetadata {
    pub identifier: String,
}

impl RequiredMetadata {
    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        match metadata.get(IDENTIFIER_HEADER) {
            Some(serde_json::Value::String(identifier)) if !identifier.is_empty() => Ok(Self {
                identifier: identifier.clone(),
            }),
            _ => Err(PipelineError::MissingIdentifier),
        }
    }

    pub fn destination(&self, prefix: &str) -> String {
        destination_name(prefix, &self.identifier)
    }
}
