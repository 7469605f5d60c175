//! OAuth exchange engine.
//!
//! Drives the authorize/callback sequence: builds the provider redirect,
//! validates the returned state, exchanges the authorization code, fetches
//! the remote identity, applies the policy gates, and hands off to the
//! account reconciler.

use axum::http::{header, HeaderMap, Uri};
use std::sync::Arc;

use super::error::ServiceError;
use super::provider::IdentityProvider;
use super::reconciler;
use crate::config::OAuthConfig;
use crate::db::UserStore;
use crate::dtos::auth::CallbackQuery;
use crate::models::Account;

pub const CALLBACK_PATH: &str = "/api/oauth/callback";

#[derive(Clone)]
pub struct OAuthService {
    store: Arc<dyn UserStore>,
    provider: Arc<dyn IdentityProvider>,
}

impl OAuthService {
    pub fn new(store: Arc<dyn UserStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { store, provider }
    }

    /// Build the provider authorization URL for a redirect directive.
    pub fn authorize_url(config: &OAuthConfig, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&state={}&redirect_uri={}",
            config.authorize_url,
            urlencoding::encode(&config.client_id),
            state,
            urlencoding::encode(redirect_uri)
        )
    }

    /// Compute the callback address: the configured redirect URI when
    /// present, otherwise derived from the inbound request. Proxy headers
    /// win over the raw request URI so the address is right behind a
    /// reverse proxy.
    pub fn resolve_redirect_uri(config: &OAuthConfig, headers: &HeaderMap, uri: &Uri) -> String {
        if let Some(configured) = &config.redirect_uri {
            return configured.clone();
        }

        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.host().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());

        format!("{}://{}{}", proto, host, CALLBACK_PATH)
    }

    /// Validate the callback request, in order, short-circuiting on the
    /// first failure. Returns the authorization code on success; token
    /// exchange must not be attempted otherwise.
    pub fn validate_callback(
        query: &CallbackQuery,
        stored_state: Option<&str>,
    ) -> Result<String, ServiceError> {
        if let Some(error) = &query.error {
            tracing::warn!(provider_error = %error, "Provider reported an authorization error");
            return Err(ServiceError::ProviderDenied);
        }

        let (code, state) = match (&query.code, &query.state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
            _ => return Err(ServiceError::MissingParameters),
        };

        match stored_state {
            Some(stored) if stored == state => Ok(code.clone()),
            _ => {
                // CSRF signal: the callback does not belong to a flow we
                // started for this user agent.
                tracing::warn!(
                    security = true,
                    stored = stored_state.is_some(),
                    "OAuth state mismatch"
                );
                Err(ServiceError::StateMismatch)
            }
        }
    }

    /// Exchange the code, fetch and vet the identity, and reconcile it to
    /// a local account.
    pub async fn login(
        &self,
        config: &OAuthConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Account, ServiceError> {
        let token = self
            .provider
            .exchange_code(code, redirect_uri, config)
            .await?;

        let identity = self
            .provider
            .fetch_identity(&token.access_token, config)
            .await?;

        if !identity.active {
            return Err(ServiceError::AccountDisabled);
        }

        if identity.silenced {
            return Err(ServiceError::AccountSilenced);
        }

        if identity.trust_level < config.min_trust_level {
            return Err(ServiceError::TrustLevelTooLow {
                required: config.min_trust_level,
                actual: identity.trust_level,
            });
        }

        reconciler::reconcile_or_provision(self.store.as_ref(), &identity, config).await
    }
}
