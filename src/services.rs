//! Process-wide wiring of the pipeline and its adapters.

use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::config::{Config, StorageBackend, StorageConfig};
use crate::error::Result;
use crate::repositories::{
    AccountRepository, AuthRepository, BiometricAuthenticator, NotificationRepository,
    TransactionRepository, UnavailableBiometrics,
};
use crate::storage::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::use_cases;

/// Built once at startup and passed by reference. Every adapter shares the
/// same [`ApiClient`], so they share one token store and one refresh slot.
#[derive(Clone)]
pub struct Services {
    pub api: ApiClient,
    pub auth: AuthRepository,
    pub accounts: AccountRepository,
    pub transactions: TransactionRepository,
    pub notifications: NotificationRepository,
    pub biometrics: Arc<dyn BiometricAuthenticator>,
}

impl Services {
    pub fn new(api: ApiClient) -> Self {
        Self {
            auth: AuthRepository::new(api.clone()),
            accounts: AccountRepository::new(api.clone()),
            transactions: TransactionRepository::new(api.clone()),
            notifications: NotificationRepository::new(api.clone()),
            biometrics: Arc::new(UnavailableBiometrics),
            api,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let tokens = token_store_for(&config.storage)?;
        info!(
            base_url = config.effective_base_url(),
            storage = tokens.name(),
            "Building API client"
        );
        let api = ApiClient::builder()
            .base_url(config.effective_base_url())
            .token_store(tokens)
            .endpoints(config.auth.clone())
            .timeout(config.api.timeout())
            .connect_timeout(config.api.connect_timeout())
            .build()?;
        Ok(Self::new(api))
    }

    /// Replace the biometric capability (platform integrations, tests).
    #[must_use]
    pub fn with_biometrics(mut self, biometrics: Arc<dyn BiometricAuthenticator>) -> Self {
        self.biometrics = biometrics;
        self
    }

    /// Biometric unlock. Returns the biometry label on success.
    pub async fn biometric_login(&self) -> Result<Option<String>> {
        use_cases::biometric_login(&self.auth, self.biometrics.as_ref()).await
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").field("api", &self.api).finish_non_exhaustive()
    }
}

/// Open the configured token store backend.
pub fn token_store_for(config: &StorageConfig) -> Result<Arc<dyn TokenStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryTokenStore::new())),
        StorageBackend::File => {
            let store = match &config.token_dir {
                Some(dir) => FileTokenStore::new(dir),
                None => FileTokenStore::default_location()?,
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "system-keyring")]
        StorageBackend::Keyring => Ok(Arc::new(crate::storage::KeyringTokenStore::new())),
        #[cfg(not(feature = "system-keyring"))]
        StorageBackend::Keyring => Err(crate::error::AppError::storage(
            "Keyring backend requires the `system-keyring` feature",
        )),
    }
}
