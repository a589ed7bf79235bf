//! Bootstrap administrator.

use serde::{Deserialize, Serialize};

/// Admin account created at startup when it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default = "default_account")]
    pub account: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default)]
    pub nickname: String,

    /// Inline password. Prefer `password_env`.
    #[serde(default)]
    pub password: Option<String>,

    /// Environment variable holding the password. Takes precedence over `password`.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_account() -> String {
    "admin".to_string()
}

fn default_user_id() -> String {
    "admin".to_string()
}

fn default_password_env() -> String {
    "WARDEN_ADMIN_PASSWORD".to_string()
}

impl Default for AdminBootstrapConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            user_id: default_user_id(),
            nickname: String::new(),
            password: None,
            password_env: default_password_env(),
        }
    }
}

impl AdminBootstrapConfig {
    /// Password from the environment, then the inline value. `None` skips bootstrapping.
    pub fn resolve_password(&self) -> Option<String> {
        std::env::var(&self.password_env)
            .ok()
            .or_else(|| self.password.clone())
            .filter(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_password_skips_bootstrap() {
        let cfg = AdminBootstrapConfig {
            password: Some("   ".into()),
            password_env: "WARDEN_TEST_ADMIN_PASSWORD_UNSET".into(),
            ..Default::default()
        };
        assert!(cfg.resolve_password().is_none());
    }

    #[test]
    fn test_inline_password() {
        let cfg = AdminBootstrapConfig {
            password: Some("changeme".into()),
            password_env: "WARDEN_TEST_ADMIN_PASSWORD_UNSET".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_password().as_deref(), Some("changeme"));
    }
}
