//! Identity-provider abstraction.
//!
//! Trait-based seam over the LinuxDo OAuth2 endpoints so the exchange
//! engine can be driven against a mock in tests.

pub mod linuxdo;
pub mod mock;

pub use linuxdo::LinuxDoProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::OAuthConfig;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Identity fetch failed: {0}")]
    IdentityFetch(String),
}

/// Token endpoint response. Only the access token is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
}

/// Remote identity as reported by the provider's user-info endpoint.
/// Request-scoped: fetched once per callback and discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct LinuxDoUserInfo {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub active: bool,
    pub silenced: bool,
    pub trust_level: u8,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for an access token.
    ///
    /// Authorization codes are single-use; callers must not retry a
    /// failed exchange with the same code.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        config: &OAuthConfig,
    ) -> Result<OAuthTokenResponse, ProviderError>;

    /// Fetch the remote identity behind an access token.
    async fn fetch_identity(
        &self,
        access_token: &str,
        config: &OAuthConfig,
    ) -> Result<LinuxDoUserInfo, ProviderError>;
}
