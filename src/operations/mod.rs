//! Business operations served by the bridge. Each one plugs its own request
//! and response shapes into the shared pipeline in [`crate::processor`].

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{codec, error::Result};

pub mod consult;
pub mod withdrawal;

pub use consult::ConsultOperation;
pub use withdrawal::WithdrawalOperation;

#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Request: DeserializeOwned + Send;
    type Response: Serialize + Send + Sync;

    fn name(&self) -> &'static str;

    fn decode(&self, payload: &[u8]) -> Result<Self::Request> {
        codec::decode(payload)
    }

    async fn process(&self, request: Self::Request, identifier: &str) -> Result<Self::Response>;

    fn encode(&self, response: &Self::Response) -> Result<Vec<u8>> {
        codec::encode(response)
    }
}
