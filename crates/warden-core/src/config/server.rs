//! Server and storage settings.

use crate::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:10008"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// `"memory"` for the in-process store, or a `sqlite:` URL.
    #[serde(default = "default_database")]
    pub database: String,

    /// Per-request deadline applied to storage calls (humantime, e.g. "5s").
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Take the client address from the first `x-forwarded-for` hop. Enable only
    /// behind a proxy that overwrites the header; otherwise the peer address is used.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Parsed form of [`ServerConfig::database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Memory,
    Sqlite(String),
}

fn default_bind() -> String {
    "0.0.0.0:10008".to_string()
}

fn default_database() -> String {
    "memory".to_string()
}

fn default_request_timeout() -> String {
    "5s".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database: default_database(),
            request_timeout: default_request_timeout(),
            trust_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn database_url(&self) -> Result<DatabaseUrl, Error> {
        let db = self.database.trim();
        if db.eq_ignore_ascii_case("memory") {
            return Ok(DatabaseUrl::Memory);
        }
        if db.starts_with("sqlite:") {
            return Ok(DatabaseUrl::Sqlite(db.to_string()));
        }
        Err(Error::Config(format!(
            "server.database: expected \"memory\" or a sqlite: URL, got '{db}'"
        )))
    }

    pub fn request_timeout(&self) -> Result<std::time::Duration, Error> {
        let timeout = super::parse_duration("server.request_timeout", &self.request_timeout)?;
        if timeout.is_zero() {
            return Err(Error::Config(
                "server.request_timeout must be greater than zero".into(),
            ));
        }
        Ok(timeout)
    }
}
