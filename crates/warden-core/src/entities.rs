//! Records owned by the Database collaborator.
//!
//! The core never caches these across calls; each operation re-reads current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrator account able to log in with a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub account: String,
    pub user_id: String,
    /// Argon2 PHC string. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

/// Network-level block for an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpForbiddenEntry {
    pub ip: String,
    pub limit_login: bool,
    pub limit_register: bool,
    pub created_at: DateTime<Utc>,
}

/// One allowed (user, ip) pair. Any row for a user restricts that user to their listed IPs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIpAllowEntry {
    pub user_id: String,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

/// Login block for a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBlock {
    pub user_id: String,
    pub reason: String,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
}

/// An invitation code. `used_by_user_id` is empty while the code is unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationCode {
    pub code: String,
    #[serde(default)]
    pub used_by_user_id: String,
    pub created_at: DateTime<Utc>,
}

impl InvitationCode {
    pub fn unused(code: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            used_by_user_id: String::new(),
            created_at,
        }
    }

    pub fn is_used(&self) -> bool {
        !self.used_by_user_id.is_empty()
    }
}

/// A failed login attempt, consumed by login throttling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailure {
    pub account: String,
    pub ip: String,
    pub occurred_at: DateTime<Utc>,
}
