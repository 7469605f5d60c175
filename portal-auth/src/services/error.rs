use portal_core::error::AppError;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::provider::ProviderError;

/// Domain failure taxonomy. Display strings double as the user-facing
/// reason messages on the login redirect and the registration response.
#[derive(Error, Debug)]
pub enum ServiceError {
    // OAuth configuration and policy
    #[error("LinuxDo sign-in is disabled")]
    OAuthDisabled,

    #[error("Sign-in is not configured correctly; please contact the administrator")]
    OAuthMisconfigured,

    // Callback sequencing
    #[error("Authorization was denied or cancelled")]
    ProviderDenied,

    #[error("Authorization callback parameters are missing")]
    MissingParameters,

    #[error("Authorization state check failed; the sign-in attempt was rejected")]
    StateMismatch,

    #[error("Failed to obtain an access token")]
    TokenExchangeFailed,

    #[error("Failed to fetch your profile from LinuxDo")]
    IdentityFetchFailed,

    // Identity policy gates
    #[error("Your LinuxDo account is disabled")]
    AccountDisabled,

    #[error("Your LinuxDo account is silenced")]
    AccountSilenced,

    #[error("Trust level {required} or above is required to sign in; your current level is {actual}")]
    TrustLevelTooLow { required: u8, actual: u8 },

    // Provisioning
    #[error("Automatic registration is disabled")]
    AutoRegistrationDisabled,

    #[error("Account lookup or creation failed")]
    ProvisioningFailed,

    // Direct registration
    #[error("Registration is currently closed")]
    RegistrationDisabled,

    #[error("{0}")]
    InvalidUsername(String),

    #[error("{0}")]
    InvalidPassword(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username is already taken")]
    UsernameTaken,

    // Same user-facing message as UsernameTaken; the cause differs.
    #[error("Username is already taken")]
    UsernamePendingReview,

    #[error("Username is not available")]
    ReservedUsername,

    #[error("Registration has reached the user limit")]
    UserLimitReached,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::TokenExchange(_) => ServiceError::TokenExchangeFailed,
            ProviderError::IdentityFetch(_) => ServiceError::IdentityFetchFailed,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::OAuthDisabled | ServiceError::RegistrationDisabled => {
                AppError::Forbidden(anyhow::anyhow!(message))
            }
            ServiceError::OAuthMisconfigured => AppError::ConfigError(anyhow::anyhow!(message)),
            ServiceError::StateMismatch => AppError::AuthError(anyhow::anyhow!(message)),
            ServiceError::Store(e) => AppError::StoreError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::ProvisioningFailed
            | ServiceError::TokenExchangeFailed
            | ServiceError::IdentityFetchFailed => {
                AppError::InternalError(anyhow::anyhow!(message))
            }
            _ => AppError::BadRequest(anyhow::anyhow!(message)),
        }
    }
}
