use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::api::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, Endpoints};

/// Config file read when neither `--config` nor `BANKING_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "banking-client.toml";

/// Local mock backend used when `api.use_mocks` is on.
pub const MOCK_API_URL: &str = "http://localhost:3099";

/// Production backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://api.example.com";

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which settings were overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "api.base_url") is overridden.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: Endpoints,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Explicit backend address. Wins over `use_mocks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub use_mocks: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            use_mocks: false,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown storage backend: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the file backend. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading and env overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply `BANKING_*`
    /// environment overrides. A missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Backend address after applying the mock switch and defaults.
    pub fn effective_base_url(&self) -> &str {
        match &self.api.base_url {
            Some(url) if !url.is_empty() => url.as_str(),
            _ if self.api.use_mocks => MOCK_API_URL,
            _ => DEFAULT_API_URL,
        }
    }

    /// `EnvFilter` directive for the configured log level.
    pub fn tracing_filter(&self) -> String {
        format!("banking_client={},warn", self.logging.level)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides read through `lookup`, recording each one.
    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_opt_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = if val.is_empty() { None } else { Some(val) };
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(parsed) = lookup($env).and_then(|val| val.parse().ok()) {
                    $field = parsed;
                    ov.record($key, $env);
                }
            };
        }

        // -- API --
        env_opt_str!("api.base_url", "BANKING_API_URL", self.api.base_url);
        env_bool!("api.use_mocks", "BANKING_USE_MOCKS", self.api.use_mocks);
        env_parse!("api.timeout_secs", "BANKING_API_TIMEOUT_SECS", self.api.timeout_secs);
        env_parse!(
            "api.connect_timeout_secs",
            "BANKING_API_CONNECT_TIMEOUT_SECS",
            self.api.connect_timeout_secs
        );

        // -- Auth endpoints --
        env_str!("auth.login_path", "BANKING_AUTH_LOGIN_PATH", self.auth.login_path);
        env_str!("auth.refresh_path", "BANKING_AUTH_REFRESH_PATH", self.auth.refresh_path);
        env_str!("auth.register_path", "BANKING_AUTH_REGISTER_PATH", self.auth.register_path);
        env_str!(
            "auth.session_probe_path",
            "BANKING_AUTH_SESSION_PROBE_PATH",
            self.auth.session_probe_path
        );

        // -- Storage --
        env_parse!("storage.backend", "BANKING_STORAGE_BACKEND", self.storage.backend);
        if let Some(val) = lookup("BANKING_TOKEN_DIR") {
            self.storage.token_dir = Some(PathBuf::from(val));
            ov.record("storage.token_dir", "BANKING_TOKEN_DIR");
        }

        // -- Logging --
        env_str!("logging.level", "BANKING_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "BANKING_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
