//! Thin adapters mapping domain calls onto endpoints.

mod account;
mod auth;
pub mod biometric;
mod notification;
mod transaction;

pub use account::AccountRepository;
pub use auth::AuthRepository;
pub use biometric::{BiometricAuthenticator, BiometricError, UnavailableBiometrics};
pub use notification::NotificationRepository;
pub use transaction::{DEFAULT_TRANSACTION_LIMIT, TransactionRepository};
