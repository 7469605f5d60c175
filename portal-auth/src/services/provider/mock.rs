//! Mock identity provider for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{IdentityProvider, LinuxDoUserInfo, OAuthTokenResponse, ProviderError};
use crate::config::OAuthConfig;

/// Call-recording provider double. Returns a canned identity, or fails
/// the exchange step when constructed with `failing_exchange`.
pub struct MockProvider {
    identity: LinuxDoUserInfo,
    fail_exchange: bool,
    exchange_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockProvider {
    pub fn returning(identity: LinuxDoUserInfo) -> Self {
        Self {
            identity,
            fail_exchange: false,
            exchange_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_exchange() -> Self {
        Self {
            identity: default_identity(),
            fail_exchange: true,
            exchange_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

pub fn default_identity() -> LinuxDoUserInfo {
    LinuxDoUserInfo {
        id: 1001,
        username: "alice".to_string(),
        name: None,
        active: true,
        silenced: false,
        trust_level: 3,
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
        _config: &OAuthConfig,
    ) -> Result<OAuthTokenResponse, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_exchange {
            return Err(ProviderError::TokenExchange(
                "mock exchange failure".to_string(),
            ));
        }

        Ok(OAuthTokenResponse {
            access_token: "mock-access-token".to_string(),
        })
    }

    async fn fetch_identity(
        &self,
        _access_token: &str,
        _config: &OAuthConfig,
    ) -> Result<LinuxDoUserInfo, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.identity.clone())
    }
}
