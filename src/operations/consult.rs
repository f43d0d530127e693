use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::info;

use crate::{
    clients::CommonDataStore,
    error::{Result, StorageError},
    models::consult::{CommonData, ConsultRequest, ConsultResponse},
    operations::Operation,
    utils::millis,
};

const PLACEHOLDER_NAME: &str = "Teste";
const PLACEHOLDER_DOCUMENT: &str = "03900000000";

/// Account consult. Answers with fixed holder data and records the pairing
/// of request and answer in the common data store.
pub struct ConsultOperation {
    store: Arc<dyn CommonDataStore>,
    save_timeout: Duration,
}

impl ConsultOperation {
    pub fn new(store: Arc<dyn CommonDataStore>, save_timeout: Duration) -> Self {
        Self {
            store,
            save_timeout,
        }
    }
}

#[async_trait]
impl Operation for ConsultOperation {
    type Request = ConsultRequest;
    type Response = ConsultResponse;

    fn name(&self) -> &'static str {
        "consult"
    }

    async fn process(&self, request: ConsultRequest, identifier: &str) -> Result<ConsultResponse> {
        let response = ConsultResponse {
            name: PLACEHOLDER_NAME.to_string(),
            document: PLACEHOLDER_DOCUMENT.to_string(),
        };

        let record = CommonData::new(identifier, &request, &response);

        info!(identifier, "Saving common data");

        timeout(self.save_timeout, self.store.save(&record))
            .await
            .map_err(|_| StorageError::Timeout(millis(self.save_timeout)))??;

        Ok(response)
    }
}
