use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Posted,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    /// ISO-8601 timestamp, kept as sent.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

impl Transaction {
    /// Amount with the sign implied by its direction.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Credit => self.amount.abs(),
            TransactionKind::Debit => -self.amount.abs(),
        }
    }
}
