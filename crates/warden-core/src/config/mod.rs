//! Configuration types for the Warden service.
//!
//! Configuration is read from a single TOML file (`warden.toml` by default,
//! overridden by `WARDEN_CONFIG` or `--config`). Every section has defaults, so a
//! missing file yields a usable development configuration apart from the token
//! secret, which must be supplied through the file or the environment.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:10008"
//! database = "sqlite://data/warden.sqlite"
//! request_timeout = "5s"
//! trust_forwarded_for = false
//!
//! [token]
//! secret_env = "WARDEN_TOKEN_SECRET"
//! ttl = "7d"
//!
//! [gate]
//! max_failed_attempts = 5
//! failure_window = "15m"
//!
//! [invitation]
//! max_batch = 10000
//! max_len = 64
//!
//! [admin]
//! account = "admin"
//! password_env = "WARDEN_ADMIN_PASSWORD"
//! ```

pub mod admin;
pub mod gate;
pub mod invitation;
pub mod server;
pub mod token;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use admin::AdminBootstrapConfig;
pub use gate::GateConfig;
pub use invitation::InvitationConfig;
pub use server::{DatabaseUrl, ServerConfig};
pub use token::TokenConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "WARDEN_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "warden.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub invitation: InvitationConfig,

    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

impl WardenConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    /// Load configuration from `path`, falling back to `WARDEN_CONFIG` and then
    /// `warden.toml`. A missing file at the default location yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let explicit = path.is_some() || std::env::var_os(CONFIG_PATH_ENV).is_some();
        let path = resolve_path(path);

        if !path.exists() {
            if explicit {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let cfg = Self::from_toml_str(&raw)?;
        cfg.validate()?;
        tracing::info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Check that every duration field parses and the database setting is understood.
    pub fn validate(&self) -> Result<(), Error> {
        self.token.ttl()?;
        self.gate.failure_window()?;
        self.server.request_timeout()?;
        self.server.database_url()?;
        Ok(())
    }
}

fn resolve_path(path: Option<&Path>) -> PathBuf {
    if let Some(p) = path {
        return p.to_path_buf();
    }
    if let Some(p) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Parse a humantime duration such as `"7d"`, `"15m"` or `"1h 30m"`.
pub(crate) fn parse_duration(field: &str, value: &str) -> Result<Duration, Error> {
    humantime::parse_duration(value.trim())
        .map_err(|e| Error::Config(format!("{field}: invalid duration '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let cfg = WardenConfig::default();
        assert_eq!(cfg.token.ttl().unwrap(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(cfg.gate.max_failed_attempts, 5);
        assert_eq!(cfg.gate.failure_window().unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(cfg.invitation.max_batch, 10_000);
        assert!(matches!(cfg.server.database_url().unwrap(), DatabaseUrl::Memory));
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let cfg = WardenConfig::from_toml_str(
            r#"
            [token]
            ttl = "2h"

            [gate]
            max_failed_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.token.ttl().unwrap(), Duration::from_secs(7200));
        assert_eq!(cfg.token.secret_env, "WARDEN_TOKEN_SECRET");
        assert_eq!(cfg.gate.max_failed_attempts, 3);
        assert_eq!(cfg.gate.failure_window, "15m");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [server]
            bind = "127.0.0.1:9000"
            database = "sqlite::memory:"
            "#
        )
        .unwrap();

        let cfg = WardenConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:9000");
        assert!(matches!(
            cfg.server.database_url().unwrap(),
            DatabaseUrl::Sqlite(ref url) if url == "sqlite::memory:"
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = WardenConfig::load(Some(Path::new("/nonexistent/warden.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_request_timeout_checked_by_validate() {
        let cfg = WardenConfig::from_toml_str("[server]\nrequest_timeout = \"0s\"\n").unwrap();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = WardenConfig::from_toml_str("[server]\nrequest_timeout = \"later\"\n").unwrap();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = WardenConfig::from_toml_str("[server]\nrequest_timeout = \"250ms\"\n").unwrap();
        assert!(cfg.validate().is_ok());
        assert!(!cfg.server.trust_forwarded_for);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let cfg = WardenConfig::from_toml_str("[token]\nttl = \"soon\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }
}
