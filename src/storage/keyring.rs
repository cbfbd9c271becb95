//! System keyring token storage.

use async_trait::async_trait;

use super::{TokenKey, TokenStore};
use crate::error::{AppError, Result};

/// Keyring-based token storage.
///
/// Each token is a separate keyring entry under one service name, so the
/// platform keychain (Keychain, Secret Service, Credential Manager) holds the
/// secrets instead of the filesystem.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringTokenStore {
    /// Service name for keyring entries.
    const SERVICE_NAME: &'static str = "banking-client";

    /// Create a store with the default service name.
    pub fn new() -> Self {
        Self {
            service: Self::SERVICE_NAME.to_string(),
        }
    }

    /// Create a store with a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: TokenKey) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key.as_str())
            .map_err(|e| AppError::storage(format!("Failed to create keyring entry: {e}")))
    }
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::storage(format!("Keyring error: {e}"))),
        }
    }

    async fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| AppError::storage(format!("Keyring error: {e}")))
    }

    async fn delete(&self, key: TokenKey) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::storage(format!("Keyring error: {e}"))),
        }
    }

    fn name(&self) -> &str {
        "keyring"
    }
}
