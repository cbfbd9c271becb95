//! Outgoing header construction.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, ErrorCode, Result};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Headers for one exchange. `access_token` is `None` for anonymous calls
/// and for the refresh endpoint.
pub fn build(request_id: &str, access_token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(REQUEST_ID_HEADER, header_value(request_id)?);

    if let Some(token) = access_token {
        let mut value = header_value(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|e| AppError::new(ErrorCode::Unknown, format!("Invalid header value: {e}")))
}
