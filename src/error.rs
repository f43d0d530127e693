use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Redis(#[from] redis::RedisError),

    #[error("persistence write timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0}")]
    Broker(#[from] lapin::Error),

    #[error("reply publish timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Rejected(String),
}

/// Failure of one pipeline stage. The message text of the wrapped error is
/// what ends up in the `details` of the error reply.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    #[error("{0}")]
    Processing(String),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Encode(#[source] serde_json::Error),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("missing or empty IDENTIFIER header")]
    MissingIdentifier,
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Processing(_) => "processing",
            PipelineError::Storage(_) => "storage",
            PipelineError::Encode(_) => "encode",
            PipelineError::Publish(_) => "publish",
            PipelineError::MissingIdentifier => "missing_identifier",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
