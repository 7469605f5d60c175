//! Direct registration workflow.

use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::db::{StoreError, UserStore};
use crate::models::{Account, PendingUser, Role};
use crate::services::error::ServiceError;
use crate::utils::{hash_password, Password};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 50;

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub message: String,
    pub needs_approval: bool,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn UserStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Validate and accept a direct signup. Checks run in a fixed order
    /// and the first failure wins.
    pub async fn register(
        &self,
        config: &RegistrationConfig,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<RegistrationOutcome, ServiceError> {
        if !config.enabled {
            return Err(ServiceError::RegistrationDisabled);
        }

        validate_username(username)?;
        validate_password(password)?;

        if password != confirm_password {
            return Err(ServiceError::PasswordMismatch);
        }

        if self.store.user_exists(username).await? {
            return Err(ServiceError::UsernameTaken);
        }

        let pending = self.store.list_pending_users().await?;
        if pending.iter().any(|p| p.username == username) {
            return Err(ServiceError::UsernamePendingReview);
        }

        if username == config.owner_username {
            return Err(ServiceError::ReservedUsername);
        }

        if let Some(max_users) = config.max_users {
            let stats = self.store.registration_stats().await?;
            if stats.total_users >= max_users {
                return Err(ServiceError::UserLimitReached);
            }
        }

        let password_hash = hash_password(&Password::new(password.to_string()));

        if config.require_approval {
            let pending_user =
                PendingUser::new(username.to_string(), password_hash.into_string());

            match self.store.create_pending_user(&pending_user).await {
                Ok(()) => {}
                // A racing submit got there first; the store decides.
                Err(StoreError::Conflict(_)) => return Err(ServiceError::UsernamePendingReview),
                Err(e) => return Err(e.into()),
            }

            tracing::info!(user = %username, "Registration queued for approval");
            return Ok(RegistrationOutcome {
                message: "Registration submitted; awaiting administrator approval".to_string(),
                needs_approval: true,
            });
        }

        let account = Account::new(username.to_string(), Role::User);
        match self.store.create_user(&account, &password_hash).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(ServiceError::UsernameTaken),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user = %username, "Registered new account");
        Ok(RegistrationOutcome {
            message: "Registration successful; sign in with your username and password"
                .to_string(),
            needs_approval: false,
        })
    }
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.trim().is_empty() {
        return Err(ServiceError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
        return Err(ServiceError::InvalidUsername(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ServiceError::InvalidUsername(
            "Username may only contain letters, digits, and underscores".to_string(),
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < PASSWORD_MIN {
        return Err(ServiceError::InvalidPassword(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        )));
    }

    if password.len() > PASSWORD_MAX {
        return Err(ServiceError::InvalidPassword(format!(
            "Password must be at most {} characters",
            PASSWORD_MAX
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn registration_config() -> RegistrationConfig {
        RegistrationConfig {
            enabled: true,
            require_approval: false,
            max_users: None,
            owner_username: "admin".to_string(),
        }
    }

    fn service(store: Arc<MemoryStore>) -> RegistrationService {
        RegistrationService::new(store)
    }

    #[tokio::test]
    async fn rejects_when_registration_disabled() {
        let store = Arc::new(MemoryStore::new());
        let mut config = registration_config();
        config.enabled = false;

        let err = service(store)
            .register(&config, "alice", "secret1", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RegistrationDisabled));
    }

    #[tokio::test]
    async fn username_length_boundaries() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let config = registration_config();

        let err = svc
            .register(&config, "ab", "secret1", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUsername(_)));

        // Three characters passes the length check
        svc.register(&config, "abc", "secret1", "secret1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_bad_username_characters() {
        let store = Arc::new(MemoryStore::new());
        let err = service(store)
            .register(&registration_config(), "bad name!", "secret1", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUsername(_)));
    }

    #[tokio::test]
    async fn password_length_boundaries() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let config = registration_config();

        let err = svc
            .register(&config, "alice", "short", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPassword(_)));

        let long = "x".repeat(51);
        let err = svc
            .register(&config, "alice", &long, &long)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPassword(_)));
    }

    #[tokio::test]
    async fn mismatched_confirmation_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let err = service(store.clone())
            .register(&registration_config(), "alice", "secret1", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PasswordMismatch));

        let stats = store.registration_stats().await.unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.pending_users, 0);
    }

    #[tokio::test]
    async fn taken_and_pending_names_share_a_message() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let config = registration_config();

        store.seed_account(Account::new("taken".to_string(), Role::User));
        let taken = svc
            .register(&config, "taken", "secret1", "secret1")
            .await
            .unwrap_err();

        store
            .create_pending_user(&PendingUser::new("queued".to_string(), "hash".to_string()))
            .await
            .unwrap();
        let queued = svc
            .register(&config, "queued", "secret1", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(taken, ServiceError::UsernameTaken));
        assert!(matches!(queued, ServiceError::UsernamePendingReview));
        assert_eq!(taken.to_string(), queued.to_string());
    }

    #[tokio::test]
    async fn rejects_reserved_owner_username() {
        let store = Arc::new(MemoryStore::new());
        let err = service(store)
            .register(&registration_config(), "admin", "secret1", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ReservedUsername));
    }

    #[tokio::test]
    async fn user_ceiling_boundary() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let mut config = registration_config();
        config.max_users = Some(2);

        store.seed_account(Account::new("first".to_string(), Role::User));

        // One below the ceiling still registers
        svc.register(&config, "second", "secret1", "secret1")
            .await
            .unwrap();

        // At the ceiling the next registration is refused
        let err = svc
            .register(&config, "third", "secret1", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserLimitReached));
    }

    #[tokio::test]
    async fn approval_mode_stages_a_pending_user() {
        let store = Arc::new(MemoryStore::new());
        let mut config = registration_config();
        config.require_approval = true;

        let outcome = service(store.clone())
            .register(&config, "alice", "secret1", "secret1")
            .await
            .unwrap();
        assert!(outcome.needs_approval);

        let pending = store.list_pending_users().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].username, "alice");
        // Stored hashed, never plaintext
        assert_ne!(pending[0].hashed_password, "secret1");
        assert_eq!(pending[0].hashed_password.len(), 64);

        // No active account was created
        assert!(!store.user_exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn direct_mode_creates_an_active_account() {
        let store = Arc::new(MemoryStore::new());
        let outcome = service(store.clone())
            .register(&registration_config(), "alice", "secret1", "secret1")
            .await
            .unwrap();
        assert!(!outcome.needs_approval);

        let account = store.account("alice").unwrap();
        assert!(account.is_active());
        assert_eq!(account.role, Role::User);
        assert_eq!(account.linuxdo_id, None);
    }
}
