use async_trait::async_trait;

use crate::{
    error::Result,
    models::withdrawal::{WithdrawalRequest, WithdrawalResponse},
    operations::Operation,
};

/// Cash withdrawal. Always approves and has no side effects.
pub struct WithdrawalOperation;

#[async_trait]
impl Operation for WithdrawalOperation {
    type Request = WithdrawalRequest;
    type Response = WithdrawalResponse;

    fn name(&self) -> &'static str {
        "withdrawal"
    }

    async fn process(
        &self,
        _request: WithdrawalRequest,
        _identifier: &str,
    ) -> Result<WithdrawalResponse> {
        Ok(WithdrawalResponse::ok())
    }
}
