use async_trait::async_trait;

use crate::{
    error::{PublishError, StorageError},
    models::consult::CommonData,
};

pub mod health;
pub mod rbmq;
pub mod redis;

/// Write side of the common data store.
#[async_trait]
pub trait CommonDataStore: Send + Sync {
    async fn save(&self, record: &CommonData) -> Result<(), StorageError>;
}

/// Settles a delivery with the broker once the pipeline is done with it.
#[async_trait]
pub trait DeliveryAcknowledger: Send + Sync {
    async fn acknowledge(&self, delivery_tag: u64) -> anyhow::Result<()>;
}

/// Sends an encoded reply to a named broker destination.
#[async_trait]
pub trait ReplyPublisher: Send + Sync {
    async fn publish(&self, destination: &str, payload: &[u8]) -> Result<(), PublishError>;
}
