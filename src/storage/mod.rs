//! Token storage backends for the session's access/refresh pair.
//!
//! Provides the [`TokenStore`] trait and implementations:
//! - [`MemoryTokenStore`] - In-memory (testing, ephemeral sessions)
//! - [`FileTokenStore`] - JSON file with 0600 permissions
//! - [`KeyringTokenStore`] - System keyring (feature-gated)
//!
//! Backends only implement the key-value primitives; the named token
//! operations used by the pipeline are provided on top of them.

mod file;
mod memory;

#[cfg(feature = "system-keyring")]
mod keyring;

use async_trait::async_trait;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

#[cfg(feature = "system-keyring")]
pub use self::keyring::KeyringTokenStore;

use crate::error::Result;

/// The two secrets a session consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    /// Storage key name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

/// Access and refresh token, always written and cleared together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &format_args!("<{} chars>", self.refresh_token.len()))
            .finish()
    }
}

/// Secure key-value capability holding the session tokens.
///
/// Every operation is async and individually atomic. `clear_tokens` is not
/// required to be atomic across both keys, but callers await it as a unit so
/// nobody observes a half-cleared session once it returns.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a single key.
    async fn get(&self, key: TokenKey) -> Result<Option<String>>;

    /// Write a single key.
    async fn set(&self, key: TokenKey, value: &str) -> Result<()>;

    /// Delete a single key. Deleting a missing key is not an error.
    async fn delete(&self, key: TokenKey) -> Result<()>;

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }

    async fn get_access_token(&self) -> Result<Option<String>> {
        self.get(TokenKey::Access).await
    }

    async fn set_access_token(&self, token: &str) -> Result<()> {
        self.set(TokenKey::Access, token).await
    }

    async fn delete_access_token(&self) -> Result<()> {
        self.delete(TokenKey::Access).await
    }

    async fn get_refresh_token(&self) -> Result<Option<String>> {
        self.get(TokenKey::Refresh).await
    }

    async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.set(TokenKey::Refresh, token).await
    }

    async fn delete_refresh_token(&self) -> Result<()> {
        self.delete(TokenKey::Refresh).await
    }

    /// Persist both halves of a pair. Backends that can write both keys in
    /// one step should override this.
    async fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        self.set(TokenKey::Access, &pair.access_token).await?;
        self.set(TokenKey::Refresh, &pair.refresh_token).await
    }

    /// Delete both tokens.
    async fn clear_tokens(&self) -> Result<()> {
        let (access, refresh) = futures::join!(
            self.delete(TokenKey::Access),
            self.delete(TokenKey::Refresh)
        );
        access.and(refresh)
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        (**self).get(key).await
    }
    async fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
    async fn delete(&self, key: TokenKey) -> Result<()> {
        (**self).delete(key).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
    async fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        (**self).store_pair(pair).await
    }
    async fn clear_tokens(&self) -> Result<()> {
        (**self).clear_tokens().await
    }
}

/// Blanket impl for `Box<T>`.
#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        (**self).get(key).await
    }
    async fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
    async fn delete(&self, key: TokenKey) -> Result<()> {
        (**self).delete(key).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
    async fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        (**self).store_pair(pair).await
    }
    async fn clear_tokens(&self) -> Result<()> {
        (**self).clear_tokens().await
    }
}
