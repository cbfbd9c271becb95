//! File-based token storage with secure permissions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::{TokenKey, TokenPair, TokenStore};
use crate::error::{AppError, Result};

/// File permissions for the token file (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Token file name inside the storage directory.
const FILE_NAME: &str = "tokens.json";

/// File-based token storage.
///
/// Both tokens live in a single JSON object at `{dir}/tokens.json`. Writes go
/// to a temp file that is renamed over the original, and a mutex serializes
/// the read-modify-write cycle.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

type TokenMap = BTreeMap<String, String>;

impl FileTokenStore {
    /// Create storage inside the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    /// Create storage at the default location:
    /// `{data_local_dir}/banking-client/tokens.json`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| AppError::storage("Cannot determine local data directory"))?;
        Ok(Self::new(dir.join("banking-client")))
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<TokenMap> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TokenMap::new()),
            Err(e) => {
                return Err(AppError::storage(format!(
                    "Failed to read token file '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(TokenMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            AppError::storage(format!(
                "Failed to parse token file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_all(&self, data: &TokenMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::storage(format!(
                    "Failed to create token directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::storage(format!("Failed to serialize tokens: {e}")))?;
        let temp_path = self.path.with_extension("tmp");

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(&temp_path)
                .map_err(|e| {
                    AppError::storage(format!(
                        "Failed to create temp file '{}': {}",
                        temp_path.display(),
                        e
                    ))
                })?;
            file.write_all(content.as_bytes()).map_err(|e| {
                AppError::storage(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        #[cfg(not(unix))]
        std::fs::write(&temp_path, &content).map_err(|e| {
            AppError::storage(format!(
                "Failed to write temp file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            AppError::storage(format!(
                "Failed to move token file into place '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), "Tokens written");
        Ok(())
    }

    async fn update(&self, apply: impl FnOnce(&mut TokenMap) + Send) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_all()?;
        apply(&mut data);
        self.write_all(&data)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key.as_str()))
    }

    async fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let value = value.to_string();
        self.update(move |data| {
            data.insert(key.as_str().to_string(), value);
        })
        .await
    }

    async fn delete(&self, key: TokenKey) -> Result<()> {
        self.update(move |data| {
            data.remove(key.as_str());
        })
        .await
    }

    fn name(&self) -> &str {
        "file"
    }

    async fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        let pair = pair.clone();
        self.update(move |data| {
            data.insert(TokenKey::Access.as_str().to_string(), pair.access_token);
            data.insert(TokenKey::Refresh.as_str().to_string(), pair.refresh_token);
        })
        .await
    }

    async fn clear_tokens(&self) -> Result<()> {
        self.update(|data| {
            data.remove(TokenKey::Access.as_str());
            data.remove(TokenKey::Refresh.as_str());
        })
        .await
    }
}
