//! Wire shapes exchanged with the banking backend.

pub mod account;
pub mod auth;
pub mod me;
pub mod notification;
pub mod transaction;

pub use account::{Account, AccountsSummary};
pub use auth::{LoginRequest, RefreshRequest, RegisterRequest, User};
pub use me::Me;
pub use notification::Notification;
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
