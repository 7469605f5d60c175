//! In-memory account store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{StoreError, UserStore};
use crate::models::{Account, PendingUser, RegistrationStats};
use crate::utils::PasswordHashString;

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: PasswordHashString,
}

/// Dashmap-backed store. Creates go through the entry API so a racing
/// duplicate surfaces as `StoreError::Conflict` rather than a silent
/// overwrite.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<String, StoredAccount>,
    pending: DashMap<String, PendingUser>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/bootstrap helper: seed an account without a real password.
    pub fn seed_account(&self, account: Account) {
        let username = account.username.clone();
        self.accounts.insert(
            username,
            StoredAccount {
                account,
                password_hash: PasswordHashString::new(String::new()),
            },
        );
    }

    pub fn account(&self, username: &str) -> Option<Account> {
        self.accounts.get(username).map(|e| e.account.clone())
    }

    pub fn password_hash(&self, username: &str) -> Option<String> {
        self.accounts
            .get(username)
            .map(|e| e.password_hash.as_str().to_string())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.accounts.contains_key(username))
    }

    async fn find_by_linuxdo_id(&self, linuxdo_id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .iter()
            .find(|e| e.account.linuxdo_id == Some(linuxdo_id))
            .map(|e| e.account.clone()))
    }

    async fn create_user(
        &self,
        account: &Account,
        password_hash: &PasswordHashString,
    ) -> Result<(), StoreError> {
        match self.accounts.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                account.username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(StoredAccount {
                    account: account.clone(),
                    password_hash: password_hash.clone(),
                });
                Ok(())
            }
        }
    }

    async fn update_linuxdo_link(
        &self,
        username: &str,
        linuxdo_username: &str,
    ) -> Result<(), StoreError> {
        match self.accounts.get_mut(username) {
            Some(mut entry) => {
                // Load, rebuild, store: only the linked handle changes.
                let mut account = entry.account.clone();
                account.linuxdo_username = Some(linuxdo_username.to_string());
                entry.account = account;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "account '{}' does not exist",
                username
            ))),
        }
    }

    async fn create_pending_user(&self, pending: &PendingUser) -> Result<(), StoreError> {
        match self.pending.entry(pending.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "pending registration for '{}' already exists",
                pending.username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(pending.clone());
                Ok(())
            }
        }
    }

    async fn list_pending_users(&self) -> Result<Vec<PendingUser>, StoreError> {
        Ok(self.pending.iter().map(|e| e.value().clone()).collect())
    }

    async fn registration_stats(&self) -> Result<RegistrationStats, StoreError> {
        let today = Utc::now().date_naive();
        let today_registrations = self
            .accounts
            .iter()
            .filter(|e| e.account.registered_at.date_naive() == today)
            .count() as u64;

        Ok(RegistrationStats {
            total_users: self.accounts.len() as u64,
            pending_users: self.pending.len() as u64,
            today_registrations,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
