//! Biometric prompt capability.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiometricError {
    #[error("Authentication cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

/// Platform biometric hardware (fingerprint, face).
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Hardware present and enrolled.
    async fn is_available(&self) -> bool;

    /// Human-readable name such as "Face ID", if known.
    async fn biometry_label(&self) -> Option<String>;

    /// Show the prompt with `reason` and wait for the user.
    async fn authenticate(&self, reason: &str) -> Result<(), BiometricError>;
}

/// Authenticator for hosts without biometric hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBiometrics;

#[async_trait]
impl BiometricAuthenticator for UnavailableBiometrics {
    async fn is_available(&self) -> bool {
        false
    }

    async fn biometry_label(&self) -> Option<String> {
        None
    }

    async fn authenticate(&self, _reason: &str) -> Result<(), BiometricError> {
        Err(BiometricError::Failed("Biometrics not available".to_string()))
    }
}
