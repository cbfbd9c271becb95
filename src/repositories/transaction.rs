use crate::api::ApiClient;
use crate::error::Result;
use crate::models::Transaction;

/// Page size when the caller does not pick one.
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    api: ApiClient,
}

impl TransactionRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Most recent transactions, newest first as ordered by the backend.
    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<Transaction>> {
        let limit = limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT);
        self.api.get(&format!("/transactions?limit={limit}")).await
    }
}
