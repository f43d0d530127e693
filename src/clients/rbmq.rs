use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    message::Delivery,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        ConfirmSelectOptions,
    },
    types::{AMQPValue, FieldTable},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clients::{DeliveryAcknowledger, ReplyPublisher},
    config::Config,
    error::PublishError,
    models::message::{InboundEnvelope, Metadata},
    utils::retry_with_backoff,
};

/// Consuming and acking share `channel`. Replies go out on a separate
/// confirm-mode channel, because the broker closes a channel that publishes
/// to a missing exchange.
pub struct RabbitMqClient {
    connection: Connection,
    pub channel: Channel,
    publish_channel: Mutex<Channel>,
    request_queue_name: String,
    consumer_tag: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to RabbitMQ");

        let url = config.rabbitmq_url.clone();
        let connection = retry_with_backoff(&config.retry_config(), || {
            let url = url.clone();
            async move { Connection::connect(&url, ConnectionProperties::default()).await }
        })
        .await
        .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        info!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| anyhow!("RabbitMQ channel creation failed: {}", e))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set up QoS: {}", e))?;

        debug!(prefetch_count = config.prefetch_count, "Prefetch count set");

        let publish_channel = open_publish_channel(&connection)
            .await
            .map_err(|e| anyhow!("RabbitMQ publish channel creation failed: {}", e))?;

        Ok(Self {
            connection,
            channel,
            publish_channel: Mutex::new(publish_channel),
            request_queue_name: config.request_queue_name.clone(),
            consumer_tag: format!("{}-worker-{}", config.operation.as_str(), Uuid::new_v4()),
        })
    }

    pub async fn create_consumer(&self) -> Result<Consumer, Error> {
        let consumer = self
            .channel
            .basic_consume(
                &self.request_queue_name,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer: {}", e))?;

        info!(
            queue = %self.request_queue_name,
            consumer_tag = %self.consumer_tag,
            "Consumer created for queue"
        );

        Ok(consumer)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    /// Returns the publish channel, reopening it if the broker closed it.
    async fn publish_channel(&self) -> Result<Channel, PublishError> {
        let mut channel = self.publish_channel.lock().await;

        if !channel.status().connected() {
            warn!("Publish channel was closed, reopening");
            *channel = open_publish_channel(&self.connection).await?;
        }

        Ok(channel.clone())
    }
}

async fn open_publish_channel(connection: &Connection) -> Result<Channel, lapin::Error> {
    let channel = connection.create_channel().await?;
    channel.confirm_select(ConfirmSelectOptions::default()).await?;

    Ok(channel)
}

#[async_trait]
impl DeliveryAcknowledger for RabbitMqClient {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to acknowledge message: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl ReplyPublisher for RabbitMqClient {
    async fn publish(&self, destination: &str, payload: &[u8]) -> Result<(), PublishError> {
        let channel = self.publish_channel().await?;

        let confirmation = channel
            .basic_publish(
                destination,
                "",
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(PublishError::Rejected(format!(
                "broker did not confirm reply to {}",
                destination
            )));
        }

        Ok(())
    }
}

pub fn envelope_from_delivery(delivery: &Delivery) -> InboundEnvelope {
    InboundEnvelope::new(
        delivery.data.clone(),
        metadata_from_headers(delivery.properties.headers().as_ref()),
    )
}

/// Flattens AMQP headers into JSON values. Nested tables, arrays, byte
/// arrays and floating point values become `null`.
pub fn metadata_from_headers(headers: Option<&FieldTable>) -> Metadata {
    headers
        .map(|table| {
            table
                .inner()
                .iter()
                .map(|(key, value)| (key.as_str().to_string(), header_value(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn header_value(value: &AMQPValue) -> Value {
    match value {
        AMQPValue::LongString(s) => {
            Value::String(String::from_utf8_lossy(s.as_bytes()).into_owned())
        }
        AMQPValue::ShortString(s) => Value::String(s.as_str().to_string()),
        AMQPValue::Boolean(b) => Value::Bool(*b),
        AMQPValue::ShortShortInt(n) => json!(n),
        AMQPValue::ShortShortUInt(n) => json!(n),
        AMQPValue::ShortInt(n) => json!(n),
        AMQPValue::ShortUInt(n) => json!(n),
        AMQPValue::LongInt(n) => json!(n),
        AMQPValue::LongUInt(n) => json!(n),
        AMQPValue::LongLongInt(n) => json!(n),
        AMQPValue::Timestamp(n) => json!(n),
        _ => Value::Null,
    }
}
