use crate::api::ApiClient;
use crate::error::Result;
use crate::models::{Account, AccountsSummary};

const ACCOUNTS_PATH: &str = "/accounts";
const SUMMARY_PATH: &str = "/accounts/summary";

#[derive(Debug, Clone)]
pub struct AccountRepository {
    api: ApiClient,
}

impl AccountRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.api.get(ACCOUNTS_PATH).await
    }

    pub async fn summary(&self) -> Result<AccountsSummary> {
        self.api.get(SUMMARY_PATH).await
    }
}
