use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::{rbmq::RabbitMqClient, redis::RedisClient},
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
    utils::millis,
};

pub struct HealthChecker {
    operation: String,
    redis: Arc<RedisClient>,
    rabbitmq: Arc<RabbitMqClient>,
}

impl HealthChecker {
    pub fn new(operation: String, redis: Arc<RedisClient>, rabbitmq: Arc<RabbitMqClient>) -> Self {
        Self {
            operation,
            redis,
            rabbitmq,
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("cache_service".to_string(), self.check_redis().await);
        checks.insert("message_broker".to_string(), self.check_rabbitmq());

        let status = if checks
            .values()
            .any(|health| health.status == HealthStatus::Unhealthy)
        {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        };

        HealthCheckResponse {
            status,
            operation: self.operation.clone(),
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_redis(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.redis.ping().await {
            Ok(_) => {
                let elapsed = millis(start.elapsed());
                debug!(response_time_ms = elapsed, "Redis health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(error = %e, "Redis health check failed");
                ServiceHealth::unhealthy(e.to_string())
            }
        }
    }

    fn check_rabbitmq(&self) -> ServiceHealth {
        if self.rabbitmq.is_connected() {
            ServiceHealth::healthy(0)
        } else {
            warn!("RabbitMQ connection is not open");
            ServiceHealth::unhealthy("Connection is not open".to_string())
        }
    }
}
