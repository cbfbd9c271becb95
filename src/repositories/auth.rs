use serde_json::Value;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{AppError, ErrorCode, Result};
use crate::models::auth::user_from_payload;
use crate::models::{LoginRequest, Me, RegisterRequest, User};
use crate::storage::TokenPair;

const PROFILE_PATH: &str = "/me";

/// Login, registration and session lifecycle.
#[derive(Debug, Clone)]
pub struct AuthRepository {
    api: ApiClient,
}

impl AuthRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in and store the returned token pair.
    ///
    /// Panics if a 2xx response carries no usable token fields.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        debug!(email, "Login request");
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body: Value = self
            .api
            .post(&self.api.endpoints().login_path, &request)
            .await?;

        let pair = TokenPair::from_auth_payload(&body).unwrap_or_else(|v| v.raise());
        let user = user_from_payload(&body).ok_or_else(|| missing_user("login"))?;
        self.api.token_store().store_pair(&pair).await?;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let body: Value = self
            .api
            .post(&self.api.endpoints().register_path, &request)
            .await?;
        user_from_payload(&body).ok_or_else(|| missing_user("register"))
    }

    /// Exchange the stored refresh token, sharing any refresh already running.
    pub async fn refresh(&self) -> Result<()> {
        self.api.refresh_session().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.api.clear_session().await?;
        info!("Logged out");
        Ok(())
    }

    /// Profile of the signed-in user. Falls back to the session endpoint
    /// when the backend has no profile route.
    pub async fn me(&self) -> Result<Me> {
        match self.api.get::<Me>(PROFILE_PATH).await {
            Err(err) if err.status_code == Some(404) => {
                debug!("Profile endpoint missing, using session user");
                match self.session_user().await {
                    Ok(Some(user)) => Ok(Me::from_display_name(user.id, &user.name)),
                    _ => Err(err),
                }
            }
            other => other,
        }
    }

    /// Auth-gate probe: `Ok(None)` when not logged in.
    pub async fn session_user(&self) -> Result<Option<User>> {
        match self
            .api
            .get::<Value>(&self.api.endpoints().session_probe_path)
            .await
        {
            Ok(body) => Ok(user_from_payload(&body)),
            Err(err) if err.status_code == Some(401) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn missing_user(operation: &str) -> AppError {
    AppError::new(
        ErrorCode::Unknown,
        format!("Malformed {operation} response: missing user"),
    )
}
