//! Session credential issuance.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::utils::generate_signature;

/// Bearer artifact handed to the user agent after authentication,
/// serialized into the `auth` cookie.
///
/// With a configured secret the credential carries an HMAC-SHA256
/// signature over the username and consumers can verify it. Without one
/// the credential is an unsigned claim the consumer must not trust on its
/// own; that lower-trust mode is a deliberate deployment choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCredential {
    pub username: String,
    pub role: Role,
    /// Issuance time, milliseconds since the epoch.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl AuthCredential {
    pub fn issue(username: &str, role: Role, secret: Option<&str>) -> Result<Self, anyhow::Error> {
        let signature = match secret {
            Some(secret) => Some(generate_signature(username, secret)?),
            None => None,
        };

        Ok(Self {
            username: username.to_string(),
            role,
            timestamp: Utc::now().timestamp_millis(),
            signature,
        })
    }

    /// Serialize to a URL-safe cookie value.
    pub fn encode(&self) -> Result<String, anyhow::Error> {
        let json = serde_json::to_string(self)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    /// Parse a cookie value produced by [`encode`](Self::encode).
    pub fn decode(value: &str) -> Result<Self, anyhow::Error> {
        let json = urlencoding::decode(value)?;
        Ok(serde_json::from_str(&json)?)
    }
}
