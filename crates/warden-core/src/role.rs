//! Caller roles and identity.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried in session tokens as the integer `UserType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Role {
    /// Ordinary application user.
    Normal = 1,
    /// Administrator.
    Admin = 2,
}

impl Role {
    /// Wire value of the role.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Lowercase name used in logs and JSON responses.
    pub fn name(self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Normal),
            2 => Ok(Role::Admin),
            other => Err(Error::InvalidRole(other)),
        }
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.as_i32()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Authenticated caller, built once at the transport boundary from a parsed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
