//! Multi-step flows composed from the repositories.

use tracing::{debug, info};

use crate::error::{AppError, ErrorCode, Result};
use crate::repositories::{AuthRepository, BiometricAuthenticator};

/// Prompt shown by [`biometric_login`].
pub const BIOMETRIC_LOGIN_REASON: &str = "Sign in with biometrics";

/// Unlock the stored session with a biometric prompt.
///
/// The prompt only gates access locally; the session itself is proven by
/// refreshing the stored tokens. Returns the biometry label reported by the
/// hardware, if any.
pub async fn biometric_login(
    auth: &AuthRepository,
    biometrics: &dyn BiometricAuthenticator,
) -> Result<Option<String>> {
    if !biometrics.is_available().await {
        debug!("Biometric login requested without biometric hardware");
        return Err(AppError::new(
            ErrorCode::BiometricUnavailable,
            "Biometrics not available",
        ));
    }

    let biometry = biometrics.biometry_label().await;
    debug!(biometry = biometry.as_deref().unwrap_or("unknown"), "Prompting for biometrics");

    biometrics
        .authenticate(BIOMETRIC_LOGIN_REASON)
        .await
        .map_err(|e| AppError::new(ErrorCode::BiometricFailed, e.to_string()))?;

    auth.refresh().await?;
    info!(biometry = biometry.as_deref().unwrap_or("unknown"), "Biometric login succeeded");
    Ok(biometry)
}
