use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info};

use crate::{
    clients::CommonDataStore, config::Config, error::StorageError, models::consult::CommonData,
    utils::retry_with_backoff,
};

pub fn common_data_key(identifier: &str) -> String {
    format!("common-data:{}", identifier)
}

pub struct RedisClient {
    connection: MultiplexedConnection,
    ttl_seconds: Option<i64>,
}

impl RedisClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to Redis");

        let ttl_seconds = config
            .common_data_ttl_seconds
            .map(i64::try_from)
            .transpose()
            .map_err(|_| anyhow!("COMMON_DATA_TTL_SECONDS is out of range"))?;

        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| anyhow!("Failed to create redis client: {}", e))?;

        let connection = retry_with_backoff(&config.retry_config(), || {
            let client = client.clone();
            async move { client.get_multiplexed_async_connection().await }
        })
        .await
        .map_err(|e| anyhow!("Failed to connect to redis: {}", e))?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            ttl_seconds,
        })
    }

    pub async fn ping(&self) -> Result<(), Error> {
        let mut conn = self.connection.clone();

        conn.ping::<String>()
            .await
            .map_err(|e| anyhow!("Ping failed: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl CommonDataStore for RedisClient {
    async fn save(&self, record: &CommonData) -> Result<(), StorageError> {
        let key = common_data_key(&record.identifier);
        let fields = [
            ("identifier", record.identifier.as_str()),
            ("agency", record.agency.as_str()),
            ("account", record.account.as_str()),
            ("name", record.name.as_str()),
            ("document", record.document.as_str()),
        ];

        let mut pipe = redis::pipe();
        pipe.atomic().hset_multiple(&key, &fields).ignore();
        if let Some(ttl) = self.ttl_seconds {
            pipe.expire(&key, ttl).ignore();
        }

        let mut conn = self.connection.clone();
        let _: () = pipe.query_async(&mut conn).await?;

        debug!(identifier = %record.identifier, key = %key, "Common data saved");

        Ok(())
    }
}
