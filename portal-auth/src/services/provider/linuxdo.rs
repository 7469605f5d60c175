//! LinuxDo OAuth2 provider client.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;

use super::{IdentityProvider, LinuxDoUserInfo, OAuthTokenResponse, ProviderError};
use crate::config::OAuthConfig;

/// Remote calls get a bounded timeout; the user's only retry path is
/// restarting the authorization flow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LinuxDoProvider {
    client: reqwest::Client,
}

impl LinuxDoProvider {
    pub fn new() -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl IdentityProvider for LinuxDoProvider {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        config: &OAuthConfig,
    ) -> Result<OAuthTokenResponse, ProviderError> {
        // Client authentication per the token endpoint's contract:
        // Basic base64(client_id:client_secret)
        let credentials =
            STANDARD.encode(format!("{}:{}", config.client_id, config.client_secret));

        let response = self
            .client
            .post(&config.token_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", credentials))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token exchange request failed");
                ProviderError::TokenExchange(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %err_body, "Token endpoint returned an error");
            return Err(ProviderError::TokenExchange(format!(
                "token endpoint returned {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse token response");
            ProviderError::TokenExchange(e.to_string())
        })
    }

    async fn fetch_identity(
        &self,
        access_token: &str,
        config: &OAuthConfig,
    ) -> Result<LinuxDoUserInfo, ProviderError> {
        let response = self
            .client
            .get(&config.user_info_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "User info request failed");
                ProviderError::IdentityFetch(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %err_body, "User info endpoint returned an error");
            return Err(ProviderError::IdentityFetch(format!(
                "user info endpoint returned {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse user info response");
            ProviderError::IdentityFetch(e.to_string())
        })
    }
}
