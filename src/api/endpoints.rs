//! Endpoint paths and 401 classification.

use serde::{Deserialize, Serialize};
use tracing::Level;

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_REGISTER_PATH: &str = "/auth/register";
pub const DEFAULT_SESSION_PROBE_PATH: &str = "/auth/me";

/// Auth endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login_path: String,
    pub refresh_path: String,
    pub register_path: String,
    pub session_probe_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            register_path: DEFAULT_REGISTER_PATH.to_string(),
            session_probe_path: DEFAULT_SESSION_PROBE_PATH.to_string(),
        }
    }
}

/// What a 401 means, depending on which endpoint returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// The refresh token itself was rejected. The session is over.
    RefreshRejected,
    /// The auth-gate probe reported "not logged in".
    SessionProbe,
    /// Login or register rejected the submitted credentials.
    CredentialsRejected,
    /// A protected endpoint rejected the access token.
    AccessExpired,
}

impl UnauthorizedKind {
    /// Level at which the 401 is logged. The probe's 401 is routine.
    pub fn log_level(self) -> Level {
        match self {
            Self::SessionProbe => Level::DEBUG,
            _ => Level::WARN,
        }
    }

    /// Whether the pipeline should attempt a refresh and retry.
    pub fn triggers_refresh(self) -> bool {
        self == Self::AccessExpired
    }
}

impl Endpoints {
    /// Classify a 401 from `path`. The query string is ignored.
    pub fn classify_unauthorized(&self, path: &str) -> UnauthorizedKind {
        let path = strip_query(path);
        if path == self.refresh_path {
            UnauthorizedKind::RefreshRejected
        } else if path == self.session_probe_path {
            UnauthorizedKind::SessionProbe
        } else if path == self.login_path || path == self.register_path {
            UnauthorizedKind::CredentialsRejected
        } else {
            UnauthorizedKind::AccessExpired
        }
    }

    /// Whether `path` is the refresh endpoint, which never carries a bearer.
    pub fn is_refresh(&self, path: &str) -> bool {
        strip_query(path) == self.refresh_path
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}
