//! Session token configuration.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum accepted HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Inline HMAC secret. Prefer `secret_env` outside development.
    #[serde(default)]
    pub secret: Option<String>,

    /// Environment variable containing the HMAC secret. Takes precedence over `secret`.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,

    /// Lifetime of newly issued tokens (e.g., "7d", "12h").
    #[serde(default = "default_ttl")]
    pub ttl: String,
}

fn default_secret_env() -> String {
    "WARDEN_TOKEN_SECRET".to_string()
}

fn default_ttl() -> String {
    "7d".to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            secret_env: default_secret_env(),
            ttl: default_ttl(),
        }
    }
}

impl TokenConfig {
    pub fn ttl(&self) -> Result<Duration, Error> {
        let ttl = super::parse_duration("token.ttl", &self.ttl)?;
        if ttl.is_zero() {
            return Err(Error::Config("token.ttl must be greater than zero".into()));
        }
        Ok(ttl)
    }

    /// Resolve the secret from the environment first, then the inline value.
    pub fn resolve_secret(&self) -> Result<String, Error> {
        let secret = match std::env::var(&self.secret_env) {
            Ok(value) if !value.is_empty() => value,
            _ => self.secret.clone().unwrap_or_default(),
        };

        if secret.is_empty() {
            return Err(Error::Config(format!(
                "token secret not configured: set {} or token.secret",
                self.secret_env
            )));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(secret)
    }
}
