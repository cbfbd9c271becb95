//! In-memory token storage for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{TokenKey, TokenPair, TokenStore};
use crate::error::Result;

/// In-memory token storage.
///
/// Clones share the same map. Pair writes and clears happen under a single
/// write lock, so readers never see one half of a pair.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<RwLock<HashMap<TokenKey, String>>>,
}

impl MemoryTokenStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_pair(pair: &TokenPair) -> Self {
        let mut map = HashMap::new();
        map.insert(TokenKey::Access, pair.access_token.clone());
        map.insert(TokenKey::Refresh, pair.refresh_token.clone());
        Self {
            tokens: Arc::new(RwLock::new(map)),
        }
    }

    /// Whether no token is stored.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        Ok(self.tokens.read().await.get(&key).cloned())
    }

    async fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        self.tokens.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn delete(&self, key: TokenKey) -> Result<()> {
        self.tokens.write().await.remove(&key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(TokenKey::Access, pair.access_token.clone());
        tokens.insert(TokenKey::Refresh, pair.refresh_token.clone());
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<()> {
        self.tokens.write().await.clear();
        Ok(())
    }
}
