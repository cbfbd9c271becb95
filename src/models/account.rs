use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Product type as reported by the backend (`checking`, `savings`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub balance: f64,
    pub currency: String,
}

/// Aggregate balances across all accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsSummary {
    pub total_balance: f64,
    pub available_funds: f64,
    pub currency: String,
}
