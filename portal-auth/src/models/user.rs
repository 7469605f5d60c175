//! Account model - local user identities and the approval queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Three-level account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Rejected => "rejected",
        }
    }
}

/// Durable local identity. The username is unique and immutable once
/// created; at most one account may carry a given LinuxDo id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub username: String,
    pub role: Role,
    pub banned: bool,
    pub status: AccountStatus,
    pub registered_at: DateTime<Utc>,
    /// Linkage to the external identity, set for OAuth-provisioned or
    /// administrator-linked accounts.
    pub linuxdo_id: Option<i64>,
    /// Upstream handle at last login; refreshed on each OAuth login.
    pub linuxdo_username: Option<String>,
}

impl Account {
    /// Create a new active account with no external linkage.
    pub fn new(username: String, role: Role) -> Self {
        Self {
            username,
            role,
            banned: false,
            status: AccountStatus::Active,
            registered_at: Utc::now(),
            linuxdo_id: None,
            linuxdo_username: None,
        }
    }

    /// Create an active account linked to a LinuxDo identity.
    pub fn linked(username: String, role: Role, linuxdo_id: i64, linuxdo_username: String) -> Self {
        Self {
            username,
            role,
            banned: false,
            status: AccountStatus::Active,
            registered_at: Utc::now(),
            linuxdo_id: Some(linuxdo_id),
            linuxdo_username: Some(linuxdo_username),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active && !self.banned
    }
}

/// Staging record for a direct registration awaiting administrator approval.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingUser {
    pub username: String,
    pub hashed_password: String,
    pub registered_at: DateTime<Utc>,
}

impl PendingUser {
    pub fn new(username: String, hashed_password: String) -> Self {
        Self {
            username,
            hashed_password,
            registered_at: Utc::now(),
        }
    }
}

/// Aggregate registration counters reported by the store.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RegistrationStats {
    pub total_users: u64,
    pub pending_users: u64,
    pub today_registrations: u64,
}
