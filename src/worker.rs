use std::{future::Future, sync::Arc};

use anyhow::{Error, Result, anyhow};
use futures_util::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::{
    clients::{
        DeliveryAcknowledger,
        rbmq::{RabbitMqClient, envelope_from_delivery},
    },
    models::message::InboundEnvelope,
    operations::Operation,
    processor::{MessageProcessor, Outcome},
};

/// Runs one delivery through the pipeline and acknowledges it, whatever the
/// outcome. Redelivery is left to the broker.
pub async fn complete_delivery<O: Operation>(
    processor: &MessageProcessor<O>,
    acknowledger: &dyn DeliveryAcknowledger,
    delivery_tag: u64,
    envelope: &InboundEnvelope,
) -> Outcome {
    let outcome = processor.handle(envelope).await;

    debug!(delivery_tag, ?outcome, "Delivery handled");

    if let Err(e) = acknowledger.acknowledge(delivery_tag).await {
        warn!(delivery_tag, error = %e, "Failed to acknowledge delivery");
    }

    outcome
}

/// Consumes the request queue until `shutdown` resolves. Each delivery runs on
/// its own task, at most `concurrency` at a time. In-flight deliveries are
/// drained before returning. The broker ending the consumer is an error.
pub async fn run_worker<O, S>(
    rabbitmq: Arc<RabbitMqClient>,
    processor: Arc<MessageProcessor<O>>,
    concurrency: usize,
    shutdown: S,
) -> Result<(), Error>
where
    O: Operation,
    S: Future<Output = ()>,
{
    let total_permits = u32::try_from(concurrency)
        .ok()
        .filter(|permits| *permits > 0)
        .ok_or_else(|| anyhow!("Invalid worker concurrency: {}", concurrency))?;
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut consumer = rabbitmq.create_consumer().await?;

    tokio::pin!(shutdown);

    info!(
        operation = processor.operation().name(),
        concurrency,
        "Worker started"
    );

    let stream_closed = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer consuming");
                break false;
            }
            next = consumer.next() => {
                let delivery = match next {
                    Some(Ok(delivery)) => delivery,
                    Some(Err(e)) => {
                        error!(error = %e, "Failed to receive delivery");
                        continue;
                    }
                    None => {
                        error!("Consumer stream closed by broker");
                        break true;
                    }
                };

                let permit = Arc::clone(&permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| anyhow!("Worker semaphore closed: {}", e))?;

                let rabbitmq = Arc::clone(&rabbitmq);
                let processor = Arc::clone(&processor);

                tokio::spawn(async move {
                    let envelope = envelope_from_delivery(&delivery);
                    complete_delivery(
                        &processor,
                        rabbitmq.as_ref(),
                        delivery.delivery_tag,
                        &envelope,
                    )
                    .await;

                    drop(permit);
                });
            }
        }
    };

    let _ = permits.acquire_many(total_permits).await;

    info!("In-flight deliveries drained, worker stopped");

    if stream_closed {
        return Err(anyhow!("Consumer stream closed without a shutdown request"));
    }

    Ok(())
}
