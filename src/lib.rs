//! Authenticated banking API client with single-flight token refresh.
//!
//! The [`api::ApiClient`] pipeline attaches bearer tokens, refreshes the
//! session once for all requests that observe an expired token, retries each
//! of them once, and clears the session when the refresh is rejected.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod use_cases;

pub use api::ApiClient;
pub use error::{AppError, ErrorCode, Result};
pub use services::Services;
pub use storage::{TokenPair, TokenStore};
