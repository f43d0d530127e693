use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reply_bridge::{
    clients::{CommonDataStore, DeliveryAcknowledger, ReplyPublisher},
    config::{Config, OperationKind},
    error::{PublishError, StorageError},
    models::consult::CommonData,
    operations::{ConsultOperation, Operation, WithdrawalOperation},
    processor::MessageProcessor,
};
use tokio::sync::{Mutex, RwLock};

pub const REPLY_PREFIX: &str = "reply-consult-rabbit";

/// Publisher double that records every reply and can be told to fail.
#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_first(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(failures),
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub async fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_json(&self) -> Vec<(String, serde_json::Value)> {
        self.sent()
            .await
            .into_iter()
            .map(|(destination, payload)| {
                let body = serde_json::from_slice(&payload).expect("reply is valid JSON");
                (destination, body)
            })
            .collect()
    }
}

#[async_trait]
impl ReplyPublisher for RecordingPublisher {
    async fn publish(&self, destination: &str, payload: &[u8]) -> Result<(), PublishError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(PublishError::Rejected(format!(
                "exchange {} not found",
                destination
            )));
        }

        self.sent
            .lock()
            .await
            .push((destination.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Acknowledger double that records delivery tags.
#[derive(Default)]
pub struct RecordingAcknowledger {
    acked: Mutex<Vec<u64>>,
    failing: bool,
}

impl RecordingAcknowledger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            ..Default::default()
        })
    }

    pub async fn acked(&self) -> Vec<u64> {
        self.acked.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryAcknowledger for RecordingAcknowledger {
    async fn acknowledge(&self, delivery_tag: u64) -> anyhow::Result<()> {
        if self.failing {
            return Err(anyhow::anyhow!("channel closed"));
        }

        self.acked.lock().await.push(delivery_tag);
        Ok(())
    }
}

/// Store double keeping records in memory.
#[derive(Default)]
pub struct InMemoryCommonDataStore {
    records: RwLock<HashMap<String, CommonData>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl InMemoryCommonDataStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub async fn get(&self, identifier: &str) -> Option<CommonData> {
        self.records.read().await.get(identifier).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl CommonDataStore for InMemoryCommonDataStore {
    async fn save(&self, record: &CommonData) -> Result<(), StorageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(StorageError::Unavailable(message.clone()));
        }

        self.records
            .write()
            .await
            .insert(record.identifier.clone(), record.clone());
        Ok(())
    }
}

pub fn processor<O: Operation>(
    operation: O,
    publisher: Arc<RecordingPublisher>,
) -> MessageProcessor<O> {
    MessageProcessor::new(operation, publisher, REPLY_PREFIX, Duration::from_secs(5))
}

pub fn consult_processor(
    store: Arc<InMemoryCommonDataStore>,
    publisher: Arc<RecordingPublisher>,
) -> MessageProcessor<ConsultOperation> {
    processor(
        ConsultOperation::new(store, Duration::from_secs(5)),
        publisher,
    )
}

pub fn withdrawal_processor(
    publisher: Arc<RecordingPublisher>,
) -> MessageProcessor<WithdrawalOperation> {
    processor(WithdrawalOperation, publisher)
}

pub fn test_config(rabbitmq_url: String, redis_url: String) -> Config {
    Config {
        rabbitmq_url,
        operation: OperationKind::Consult,
        request_queue_name: format!("queue-consult-rabbit-{}", uuid::Uuid::new_v4()),
        reply_exchange_prefix: REPLY_PREFIX.to_string(),
        prefetch_count: 10,
        redis_url,
        common_data_ttl_seconds: None,
        persistence_timeout_ms: 5_000,
        publish_timeout_ms: 5_000,
        max_retry_attempts: 10,
        initial_retry_delay_ms: 250,
        max_retry_delay_ms: 2_000,
        retry_backoff_multiplier: 2,
        worker_concurrency: 4,
        server_port: 0,
    }
}
