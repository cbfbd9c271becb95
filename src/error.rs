//! Error taxonomy shared by the pipeline, the token stores and the adapters.
//!
//! Every fallible operation in the crate returns [`Result`]. Failures are
//! normalized into a single [`AppError`] at the point they are detected and
//! travel up the call chain unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result alias used across the crate.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Fallback message when a failure carries nothing better.
const UNKNOWN_MESSAGE: &str = "Unknown error";

/// Closed set of error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Non-2xx response with a structured body or a known status.
    ApiError,
    /// Transport or decode failure with no structured message.
    Unknown,
    /// Session expired or invalid; tokens have been cleared.
    AuthError,
    /// Token store backend failed.
    StorageError,
    /// Biometric hardware missing or not enrolled.
    BiometricUnavailable,
    /// Biometric prompt was rejected or cancelled.
    BiometricFailed,
}

impl ErrorCode {
    /// Wire representation, e.g. `API_ERROR`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiError => "API_ERROR",
            Self::Unknown => "UNKNOWN",
            Self::AuthError => "AUTH_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::BiometricUnavailable => "BIOMETRIC_UNAVAILABLE",
            Self::BiometricFailed => "BIOMETRIC_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized application error.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Session-level failure. Always reported as a 401.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthError, message).with_status(401)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Build an error from a non-2xx response body.
    pub fn from_response(body: &Value, status: u16) -> Self {
        normalize_error(Some(body), Some(status))
    }

    /// Build an error from a failure that never produced a response.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let mut error = Self::new(ErrorCode::Unknown, err.to_string());
        if let Some(status) = err.status() {
            error.status_code = Some(status.as_u16());
        }
        error
    }

    /// Whether this error means the session is gone.
    pub fn is_auth_error(&self) -> bool {
        self.code == ErrorCode::AuthError
    }
}

/// Convert a parsed failure payload into exactly one [`AppError`].
///
/// An object carrying a string `message` becomes `API_ERROR` with that
/// message. Without one, a known response status still yields `API_ERROR`
/// with a generic message; no status at all yields `UNKNOWN`.
pub fn normalize_error(value: Option<&Value>, status: Option<u16>) -> AppError {
    let message = value
        .and_then(Value::as_object)
        .and_then(|obj| obj.get("message"))
        .and_then(Value::as_str);

    match (message, status) {
        (Some(message), _) => {
            let mut error = AppError::new(ErrorCode::ApiError, message);
            error.status_code = status;
            error.details = value.cloned();
            error
        }
        (None, Some(status)) => {
            let error = AppError::new(
                ErrorCode::ApiError,
                format!("Request failed with status {status}"),
            )
            .with_status(status);
            match value {
                Some(body) if !is_empty_body(body) => error.with_details(body.clone()),
                _ => error,
            }
        }
        (None, None) => {
            let message = value
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_MESSAGE);
            AppError::new(ErrorCode::Unknown, message)
        }
    }
}

fn is_empty_body(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
