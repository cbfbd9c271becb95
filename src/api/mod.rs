//! Authenticated request pipeline.
//!
//! [`ApiClient`] attaches the stored access token, detects expiry through a
//! 401, runs one coordinated refresh for every request that hit the same
//! expiry, and retries the original request once. All failures come back as
//! an [`AppError`].

pub mod endpoints;
pub mod headers;
pub mod redact;
pub mod refresh;
pub mod request_id;

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{Instrument, Level, debug, debug_span, info, warn};

pub use endpoints::{Endpoints, UnauthorizedKind};
pub use refresh::RefreshCoordinator;

use crate::error::{AppError, ErrorCode, Result};
use crate::models::auth::RefreshRequest;
use crate::storage::{MemoryTokenStore, TokenPair, TokenStore};

/// Default total request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the banking API with transparent token refresh.
///
/// Clones share the token store and the refresh slot.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<Transport>,
    refresh: Arc<RefreshCoordinator>,
}

/// Everything a single exchange needs. Kept apart from the refresh slot so
/// the pending refresh future can own a handle without a reference cycle.
struct Transport {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    endpoints: Endpoints,
}

/// Status and parsed body of one HTTP exchange.
struct Exchange {
    status: StatusCode,
    body: Value,
}

impl ApiClient {
    /// Client with default timeouts and endpoint paths.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::builder().base_url(base_url).token_store(tokens).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// `GET {base}{path}`, decoded into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(Method::GET, path, None).await
    }

    /// `POST {base}{path}` with a JSON body, decoded into `T`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| {
            AppError::new(ErrorCode::Unknown, format!("Failed to encode request body: {e}"))
        })?;
        self.execute(Method::POST, path, Some(&body)).await
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Concurrent callers share one network call. On failure the stored
    /// tokens are cleared and every caller receives `AUTH_ERROR`.
    pub async fn refresh_session(&self) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        self.refresh
            .run(move || async move { transport.perform_refresh().await }.boxed())
            .await
    }

    /// Delete both stored tokens.
    pub async fn clear_session(&self) -> Result<()> {
        self.transport.tokens.clear_tokens().await
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.transport.tokens
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.transport.endpoints
    }

    pub fn base_url(&self) -> &str {
        &self.transport.base_url
    }

    /// Whether a refresh is pending right now.
    pub fn refresh_in_flight(&self) -> bool {
        self.refresh.in_flight()
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let mut retried = false;
        loop {
            let exchange = self.transport.dispatch(&method, path, body).await?;

            if exchange.status.is_success() {
                return serde_json::from_value(exchange.body).map_err(|e| {
                    warn!(path, error = %e, "Malformed response body");
                    AppError::new(ErrorCode::Unknown, format!("Malformed response: {e}"))
                });
            }

            let status = exchange.status.as_u16();
            if exchange.status == StatusCode::UNAUTHORIZED {
                let kind = self.transport.endpoints.classify_unauthorized(path);
                log_unauthorized(kind, path, retried);
                match kind {
                    UnauthorizedKind::RefreshRejected => {
                        self.transport.clear_tokens_logged().await;
                        return Err(AppError::auth("Session expired"));
                    }
                    kind if kind.triggers_refresh() && !retried => {
                        self.refresh_session().await?;
                        retried = true;
                        continue;
                    }
                    _ => {}
                }
            }

            return Err(AppError::from_response(&exchange.body, status));
        }
    }
}

fn log_unauthorized(kind: UnauthorizedKind, path: &str, retried: bool) {
    if kind.log_level() == Level::DEBUG {
        debug!(path, ?kind, "Unauthorized");
    } else {
        warn!(path, ?kind, retried, "Unauthorized");
    }
}

impl Transport {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One HTTP exchange. No retry and no refresh happen here.
    async fn dispatch(&self, method: &Method, path: &str, body: Option<&Value>) -> Result<Exchange> {
        let request_id = request_id::generate();
        let span = debug_span!(
            "api_request",
            request_id = %request_id,
            method = %method,
            path
        );

        async {
            let access_token = if self.endpoints.is_refresh(path) {
                None
            } else {
                self.tokens.get_access_token().await?
            };
            let headers = headers::build(&request_id, access_token.as_deref())?;

            match body {
                Some(body) => debug!(body = %redact::redact(body), "Sending request"),
                None => debug!("Sending request"),
            }

            let mut request = self
                .http
                .request(method.clone(), self.url(path))
                .headers(headers);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| {
                warn!(error = %e, "Request failed");
                AppError::from_transport(&e)
            })?;
            let status = response.status();
            let text = response.text().await.map_err(|e| {
                warn!(error = %e, "Failed to read response body");
                AppError::from_transport(&e)
            })?;
            debug!(status = status.as_u16(), "Response received");

            Ok::<_, AppError>(Exchange {
                status,
                body: parse_body(&text),
            })
        }
        .instrument(span)
        .await
    }

    async fn perform_refresh(&self) -> Result<()> {
        let outcome = match self.request_new_pair().await {
            Ok(pair) => self.tokens.store_pair(&pair).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                info!("Session refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed, clearing session");
                self.clear_tokens_logged().await;
                if err.is_auth_error() {
                    Err(err)
                } else {
                    Err(AppError::auth(err.message))
                }
            }
        }
    }

    async fn request_new_pair(&self) -> Result<TokenPair> {
        let Some(refresh_token) = self.tokens.get_refresh_token().await? else {
            return Err(AppError::auth("No refresh token"));
        };

        let body = serde_json::to_value(RefreshRequest { refresh_token }).map_err(|e| {
            AppError::new(ErrorCode::Unknown, format!("Failed to encode request body: {e}"))
        })?;
        let exchange = self
            .dispatch(&Method::POST, &self.endpoints.refresh_path, Some(&body))
            .await?;

        if exchange.status == StatusCode::UNAUTHORIZED {
            return Err(AppError::auth("Session expired"));
        }
        if !exchange.status.is_success() {
            return Err(AppError::auth(format!(
                "Refresh failed with status {}",
                exchange.status.as_u16()
            )));
        }
        Ok(TokenPair::from_auth_payload(&exchange.body).unwrap_or_else(|v| v.raise()))
    }

    async fn clear_tokens_logged(&self) {
        if let Err(e) = self.tokens.clear_tokens().await {
            warn!(error = %e, "Failed to clear tokens");
        }
    }
}

/// Parse a response body, treating empty or non-JSON text as `{}`.
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url)
            .field("token_store", &self.transport.tokens.name())
            .field("refresh", &self.refresh)
            .finish()
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: Option<String>,
    tokens: Option<Arc<dyn TokenStore>>,
    endpoints: Endpoints,
    timeout: Duration,
    connect_timeout: Duration,
    http: Option<reqwest::Client>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            tokens: None,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            http: None,
        }
    }
}

impl ApiClientBuilder {
    /// Base address. A trailing `/` is dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Token store. Defaults to a fresh [`MemoryTokenStore`].
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client. Timeouts set on the builder are
    /// ignored in that case.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| AppError::new(ErrorCode::Unknown, "Base URL is required"))?
            .trim_end_matches('/')
            .to_string();

        let http = match self.http {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .connect_timeout(self.connect_timeout)
                .build()
                .map_err(|e| AppError::from_transport(&e))?,
        };

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));

        Ok(ApiClient {
            transport: Arc::new(Transport {
                http,
                base_url,
                tokens,
                endpoints: self.endpoints,
            }),
            refresh: Arc::new(RefreshCoordinator::new()),
        })
    }
}
