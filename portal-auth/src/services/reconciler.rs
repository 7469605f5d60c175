//! Account reconciler: maps a verified external identity to a local account.

use crate::config::OAuthConfig;
use crate::db::{StoreError, UserStore};
use crate::models::Account;
use crate::services::error::ServiceError;
use crate::services::provider::LinuxDoUserInfo;
use crate::utils::{generate_random_password, hash_password};

/// Find the account linked to `identity`, or provision one under the
/// auto-registration policy.
///
/// Repeat logins refresh the linked upstream handle only; the local
/// username, role, and ban flag stay untouched.
pub(crate) async fn reconcile_or_provision(
    store: &dyn UserStore,
    identity: &LinuxDoUserInfo,
    config: &OAuthConfig,
) -> Result<Account, ServiceError> {
    let existing = store
        .find_by_linuxdo_id(identity.id)
        .await
        .map_err(provisioning_fault)?;

    if let Some(account) = existing {
        store
            .update_linuxdo_link(&account.username, &identity.username)
            .await
            .map_err(provisioning_fault)?;

        tracing::info!(
            user = %account.username,
            linuxdo_id = identity.id,
            "Linked account signed in"
        );

        let mut refreshed = account;
        refreshed.linuxdo_username = Some(identity.username.clone());
        return Ok(refreshed);
    }

    if !config.auto_register {
        tracing::info!(handle = %identity.username, "Auto-registration disabled; rejecting first-time identity");
        return Err(ServiceError::AutoRegistrationDisabled);
    }

    let username = free_username(store, &identity.username).await?;

    // Throwaway local password; satisfies the store's password-required
    // invariant and is never the authentication mechanism for this account.
    let password_hash = hash_password(&generate_random_password());

    let account = Account::linked(
        username,
        config.default_role,
        identity.id,
        identity.username.clone(),
    );

    match store.create_user(&account, &password_hash).await {
        Ok(()) => {
            tracing::info!(
                user = %account.username,
                handle = %identity.username,
                "Provisioned account for first-time LinuxDo identity"
            );
            Ok(account)
        }
        Err(StoreError::Conflict(msg)) => {
            // A racing callback won the create; the store is authoritative.
            tracing::warn!(conflict = %msg, "Provisioning lost a create race");
            Err(ServiceError::ProvisioningFailed)
        }
        Err(e) => {
            tracing::error!(error = %e, "Provisioning write failed");
            Err(ServiceError::ProvisioningFailed)
        }
    }
}

/// Synthesize a candidate username from the external handle, resolving
/// collisions with an incrementing numeric suffix. Terminates because the
/// suffixes are strictly increasing against a finite store.
async fn free_username(store: &dyn UserStore, handle: &str) -> Result<String, ServiceError> {
    let base = format!("linuxdo_{}", handle);
    let mut candidate = base.clone();
    let mut counter = 1u32;

    while store
        .user_exists(&candidate)
        .await
        .map_err(provisioning_fault)?
    {
        candidate = format!("{}_{}", base, counter);
        counter += 1;
    }

    Ok(candidate)
}

fn provisioning_fault(err: StoreError) -> ServiceError {
    tracing::error!(error = %err, "Store fault during reconciliation");
    ServiceError::ProvisioningFailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Role;

    fn oauth_config(auto_register: bool) -> OAuthConfig {
        OAuthConfig {
            enabled: true,
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            authorize_url: "https://connect.linux.do/oauth2/authorize".to_string(),
            token_url: "https://connect.linux.do/oauth2/token".to_string(),
            user_info_url: "https://connect.linux.do/api/user".to_string(),
            redirect_uri: None,
            min_trust_level: 0,
            auto_register,
            default_role: Role::User,
        }
    }

    fn identity(id: i64, handle: &str) -> LinuxDoUserInfo {
        LinuxDoUserInfo {
            id,
            username: handle.to_string(),
            name: None,
            active: true,
            silenced: false,
            trust_level: 2,
        }
    }

    #[tokio::test]
    async fn provisions_new_account_with_linkage() {
        let store = MemoryStore::new();
        let account = reconcile_or_provision(&store, &identity(7, "alice"), &oauth_config(true))
            .await
            .unwrap();

        assert_eq!(account.username, "linuxdo_alice");
        assert_eq!(account.role, Role::User);
        assert_eq!(account.linuxdo_id, Some(7));

        let stored = store.account("linuxdo_alice").unwrap();
        assert!(stored.is_active());
        // Local password exists but is a hash, not anything guessable
        assert_eq!(store.password_hash("linuxdo_alice").unwrap().len(), 64);
    }

    #[tokio::test]
    async fn repeat_login_is_idempotent() {
        let store = MemoryStore::new();
        let config = oauth_config(true);

        let first = reconcile_or_provision(&store, &identity(7, "alice"), &config)
            .await
            .unwrap();
        let second = reconcile_or_provision(&store, &identity(7, "alice"), &config)
            .await
            .unwrap();

        assert_eq!(first.username, second.username);
        assert!(store.account("linuxdo_alice_1").is_none());
    }

    #[tokio::test]
    async fn repeat_login_refreshes_handle_only() {
        let store = MemoryStore::new();
        let config = oauth_config(true);

        reconcile_or_provision(&store, &identity(7, "alice"), &config)
            .await
            .unwrap();

        let renamed = reconcile_or_provision(&store, &identity(7, "alice_v2"), &config)
            .await
            .unwrap();

        // Local username is stable across upstream renames
        assert_eq!(renamed.username, "linuxdo_alice");
        let stored = store.account("linuxdo_alice").unwrap();
        assert_eq!(stored.linuxdo_username.as_deref(), Some("alice_v2"));
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn collisions_get_incrementing_suffixes() {
        let store = MemoryStore::new();
        store.seed_account(Account::new("linuxdo_alice".to_string(), Role::User));
        store.seed_account(Account::new("linuxdo_alice_1".to_string(), Role::User));

        let account = reconcile_or_provision(&store, &identity(9, "alice"), &oauth_config(true))
            .await
            .unwrap();

        assert_eq!(account.username, "linuxdo_alice_2");
    }

    #[tokio::test]
    async fn auto_registration_disabled_rejects_first_timers() {
        let store = MemoryStore::new();
        let err = reconcile_or_provision(&store, &identity(7, "alice"), &oauth_config(false))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::AutoRegistrationDisabled));
        assert!(store.account("linuxdo_alice").is_none());
    }
}
