use std::{
    fmt::{Display, Formatter},
    sync::Arc,
    time::Duration,
};

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::{
    clients::ReplyPublisher,
    codec,
    error::{PipelineError, PublishError},
    models::{message::InboundEnvelope, reply::ErrorResponse},
    operations::Operation,
    routing::RequiredMetadata,
    utils::millis,
};

/// Furthest point a delivery reached on the success path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Decoded,
    Processed,
    Encoded,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::Decoded => write!(f, "decoded"),
            Stage::Processed => write!(f, "processed"),
            Stage::Encoded => write!(f, "encoded"),
        }
    }
}

/// How a single delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation's response was published.
    Replied,
    /// A stage failed after leaving `stage`; an error reply was published.
    ErrorReplied { stage: Stage },
    /// No usable identifier, so there was nowhere to reply.
    Dropped,
    /// The error reply could not be published either.
    Undelivered { stage: Stage },
}

pub struct MessageProcessor<O: Operation> {
    operation: O,
    publisher: Arc<dyn ReplyPublisher>,
    reply_prefix: String,
    publish_timeout: Duration,
}

impl<O: Operation> MessageProcessor<O> {
    pub fn new(
        operation: O,
        publisher: Arc<dyn ReplyPublisher>,
        reply_prefix: impl Into<String>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            operation,
            publisher,
            reply_prefix: reply_prefix.into(),
            publish_timeout,
        }
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    pub async fn handle(&self, envelope: &InboundEnvelope) -> Outcome {
        let operation = self.operation.name();

        info!(
            operation,
            body = %envelope.body_lossy(),
            metadata = ?envelope.metadata,
            "Received message"
        );

        let required = match RequiredMetadata::from_metadata(&envelope.metadata) {
            Ok(required) => required,
            Err(e) => {
                error!(
                    operation,
                    kind = e.kind(),
                    error = %e,
                    "Dropping message without a reply destination"
                );
                return Outcome::Dropped;
            }
        };

        let identifier = required.identifier.as_str();
        let destination = required.destination(&self.reply_prefix);

        let (stage, e) = match self.respond(envelope, identifier, &destination).await {
            Ok(()) => return Outcome::Replied,
            Err(failure) => failure,
        };

        let reply = self.error_reply(stage, e, identifier);
        self.reply_with_error(stage, reply, identifier, &destination).await
    }

    async fn respond(
        &self,
        envelope: &InboundEnvelope,
        identifier: &str,
        destination: &str,
    ) -> Result<(), (Stage, PipelineError)> {
        let operation = self.operation.name();

        debug!(operation, identifier, "Decoding request body");
        let request = self
            .operation
            .decode(&envelope.payload)
            .map_err(|e| (Stage::Received, e))?;

        debug!(operation, identifier, "Processing request");
        let response = self
            .operation
            .process(request, identifier)
            .await
            .map_err(|e| (Stage::Decoded, e))?;

        debug!(operation, identifier, "Encoding response");
        let payload = self
            .operation
            .encode(&response)
            .map_err(|e| (Stage::Processed, e))?;

        self.send(destination, &payload)
            .await
            .map_err(|e| (Stage::Encoded, e.into()))?;

        info!(
            operation,
            identifier,
            destination,
            payload = %String::from_utf8_lossy(&payload),
            "Response has been sent"
        );

        Ok(())
    }

    fn error_reply(&self, stage: Stage, e: PipelineError, identifier: &str) -> ErrorResponse {
        error!(
            operation = self.operation.name(),
            identifier,
            stage = %stage,
            kind = e.kind(),
            error = %e,
            "Message processing failed"
        );

        let details = e.to_string();
        if details.is_empty() {
            ErrorResponse::internal(e.kind())
        } else {
            ErrorResponse::internal(details)
        }
    }

    async fn reply_with_error(
        &self,
        stage: Stage,
        reply: ErrorResponse,
        identifier: &str,
        destination: &str,
    ) -> Outcome {
        let operation = self.operation.name();
        let payload = codec::encode_error(&reply);

        match self.send(destination, &payload).await {
            Ok(()) => {
                info!(
                    operation,
                    identifier,
                    destination,
                    payload = %String::from_utf8_lossy(&payload),
                    "Error response has been sent"
                );
                Outcome::ErrorReplied { stage }
            }
            Err(publish_error) => {
                warn!(
                    operation,
                    identifier,
                    destination,
                    error = %publish_error,
                    "Failed to send error response"
                );
                Outcome::Undelivered { stage }
            }
        }
    }

    async fn send(&self, destination: &str, payload: &[u8]) -> Result<(), PublishError> {
        timeout(self.publish_timeout, self.publisher.publish(destination, payload))
            .await
            .map_err(|_| PublishError::Timeout(millis(self.publish_timeout)))?
    }
}
