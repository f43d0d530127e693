use std::sync::Arc;

use anyhow::{Error, Result};
use reply_bridge::{
    api::run_api_server,
    clients::{
        CommonDataStore, ReplyPublisher, health::HealthChecker, rbmq::RabbitMqClient,
        redis::RedisClient,
    },
    config::{Config, OperationKind},
    operations::{ConsultOperation, Operation, WithdrawalOperation},
    processor::MessageProcessor,
    utils::init_tracing,
    worker::run_worker,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Config::load()?;

    info!(
        operation = config.operation.as_str(),
        queue = %config.request_queue_name,
        "Configuration loaded"
    );

    let rabbitmq = Arc::new(RabbitMqClient::connect(&config).await?);
    let redis = Arc::new(RedisClient::connect(&config).await?);

    let health_checker = HealthChecker::new(
        config.operation.as_str().to_string(),
        Arc::clone(&redis),
        Arc::clone(&rabbitmq),
    );
    let port = config.server_port;
    tokio::spawn(async move {
        if let Err(e) = run_api_server(port, health_checker).await {
            error!(error = %e, "Health check server stopped");
        }
    });

    let publisher: Arc<dyn ReplyPublisher> = rabbitmq.clone();

    match config.operation {
        OperationKind::Consult => {
            let store: Arc<dyn CommonDataStore> = redis;
            let operation = ConsultOperation::new(store, config.persistence_timeout());
            serve(&config, rabbitmq, publisher, operation).await
        }
        OperationKind::Withdrawal => {
            serve(&config, rabbitmq, publisher, WithdrawalOperation).await
        }
    }
}

async fn serve<O: Operation>(
    config: &Config,
    rabbitmq: Arc<RabbitMqClient>,
    publisher: Arc<dyn ReplyPublisher>,
    operation: O,
) -> Result<(), Error> {
    let processor = Arc::new(MessageProcessor::new(
        operation,
        publisher,
        config.reply_exchange_prefix.clone(),
        config.publish_timeout(),
    ));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    run_worker(rabbitmq, processor, config.worker_concurrency, shutdown).await
}
