//! Account store adapter.
//!
//! The persistent user repository is an external collaborator; this module
//! defines the contract the service consumes plus a dashmap-backed
//! implementation used as the built-in backend and as the test double.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, PendingUser, RegistrationStats};
use crate::utils::PasswordHashString;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Uniqueness violation reported by the store's create operation.
    /// Existence checks are advisory; this is the authoritative signal
    /// under concurrent creates.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether any account (active, pending, or rejected) holds `username`.
    async fn user_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Find the account linked to a LinuxDo id, if any.
    async fn find_by_linuxdo_id(&self, linuxdo_id: i64) -> Result<Option<Account>, StoreError>;

    /// Create an account together with its password hash.
    async fn create_user(
        &self,
        account: &Account,
        password_hash: &PasswordHashString,
    ) -> Result<(), StoreError>;

    /// Refresh the linked upstream handle of an existing account.
    async fn update_linuxdo_link(
        &self,
        username: &str,
        linuxdo_username: &str,
    ) -> Result<(), StoreError>;

    /// Stage a direct registration for administrator approval.
    async fn create_pending_user(&self, pending: &PendingUser) -> Result<(), StoreError>;

    async fn list_pending_users(&self) -> Result<Vec<PendingUser>, StoreError>;

    async fn registration_stats(&self) -> Result<RegistrationStats, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
