//! Log-side redaction of request bodies.

use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values never reach the logs.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "confirmPassword",
    "refreshToken",
    "refresh_token",
    "accessToken",
    "access_token",
];

/// Copy of `value` with every sensitive field replaced, at any depth.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let v = if SENSITIVE_KEYS.contains(&key.as_str()) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (key.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
