//! Services layer for portal-auth.
//!
//! Business logic for the OAuth exchange flow, account reconciliation,
//! direct registration, and session-credential issuance.

pub mod credential;
pub mod error;
pub mod oauth;
pub mod provider;
mod reconciler;
pub mod registration;

pub use credential::AuthCredential;
pub use error::ServiceError;
pub use oauth::OAuthService;
pub use provider::{IdentityProvider, LinuxDoProvider, LinuxDoUserInfo, MockProvider};
pub use registration::{RegistrationOutcome, RegistrationService};
