use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::retry::RetryConfig;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Consult,
    Withdrawal,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Consult => "consult",
            OperationKind::Withdrawal => "withdrawal",
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,
    #[serde(default = "default_operation")]
    pub operation: OperationKind,
    #[serde(default = "default_request_queue_name")]
    pub request_queue_name: String,
    #[serde(default = "default_reply_exchange_prefix")]
    pub reply_exchange_prefix: String,
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,

    pub redis_url: String,
    pub common_data_ttl_seconds: Option<u64>,

    #[serde(default = "default_timeout_ms")]
    pub persistence_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub publish_timeout_ms: u64,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: u64,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would be truncated where they are used.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(ttl) = self.common_data_ttl_seconds {
            i64::try_from(ttl)
                .map_err(|_| anyhow!("COMMON_DATA_TTL_SECONDS is out of range: {}", ttl))?;
        }

        match u32::try_from(self.worker_concurrency) {
            Ok(permits) if permits > 0 => {}
            _ => {
                return Err(anyhow!(
                    "WORKER_CONCURRENCY must be between 1 and {}: {}",
                    u32::MAX,
                    self.worker_concurrency
                ));
            }
        }

        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            backoff_multiplier: self.retry_backoff_multiplier,
        }
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

fn default_operation() -> OperationKind {
    OperationKind::Consult
}

fn default_request_queue_name() -> String {
    "queue-consult-rabbit".to_string()
}

fn default_reply_exchange_prefix() -> String {
    "reply-consult-rabbit".to_string()
}

fn default_prefetch_count() -> u16 {
    10
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_retry_attempts() -> u32 {
    5
}

fn default_initial_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_delay_ms() -> u64 {
    10_000
}

fn default_retry_backoff_multiplier() -> u64 {
    2
}

fn default_worker_concurrency() -> usize {
    16
}

fn default_server_port() -> u16 {
    8080
}
