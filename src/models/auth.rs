//! Authentication payloads and token extraction.
//!
//! Backends disagree on response shape: payloads may be wrapped in
//! `{ "data": { ... } }` or flat, and token fields may be camelCase or
//! snake_case. Extraction tries an explicit, ordered list of field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::storage::TokenPair;

/// Accepted access-token field names, in lookup order.
pub const ACCESS_TOKEN_FIELDS: &[&str] = &["accessToken", "access_token"];

/// Accepted refresh-token field names, in lookup order.
pub const REFRESH_TOKEN_FIELDS: &[&str] = &["refreshToken", "refresh_token"];

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authenticated user as returned by login/register/session endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A 2xx response that is missing fields the client cannot work without.
///
/// This is a defect in the backend contract rather than an expected runtime
/// failure, so it is not carried in [`crate::Result`]; see [`Self::raise`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Auth response must include access and refresh tokens. Expected one of [{}]. Received keys: {}",
    expected_display(.expected),
    received_display(.received)
)]
pub struct ContractViolation {
    pub expected: Vec<&'static str>,
    pub received: Vec<String>,
}

fn expected_display(keys: &[&str]) -> String {
    keys.join(", ")
}

fn received_display(keys: &[String]) -> String {
    if keys.is_empty() {
        "(none)".to_string()
    } else {
        keys.join(", ")
    }
}

impl ContractViolation {
    /// Log the received field set and abort the current task.
    pub fn raise(self) -> ! {
        error!(
            expected = ?self.expected,
            received = ?self.received,
            "Auth response violates token contract"
        );
        panic!("{self}")
    }
}

/// Unwrap `{ "data": { ... } }` or return the body as-is.
pub fn unwrap_envelope(body: &Value) -> &Value {
    match body.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => body,
    }
}

/// Return the first string field among `keys`.
pub fn pick_token(
    raw: &Map<String, Value>,
    keys: &'static [&'static str],
) -> Result<String, ContractViolation> {
    keys.iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| ContractViolation {
            expected: keys.to_vec(),
            received: raw.keys().cloned().collect(),
        })
}

impl TokenPair {
    /// Extract a token pair from a login or refresh response.
    pub fn from_auth_payload(body: &Value) -> Result<Self, ContractViolation> {
        let empty = Map::new();
        let raw = unwrap_envelope(body).as_object().unwrap_or(&empty);
        let access_token = pick_token(raw, ACCESS_TOKEN_FIELDS)?;
        let refresh_token = pick_token(raw, REFRESH_TOKEN_FIELDS)?;
        Ok(Self {
            access_token,
            refresh_token,
        })
    }
}

/// Find the `user` object in a possibly-enveloped auth response.
pub fn user_from_payload(body: &Value) -> Option<User> {
    unwrap_envelope(body)
        .get("user")
        .or_else(|| body.get("user"))
        .and_then(|user| serde_json::from_value(user.clone()).ok())
}
