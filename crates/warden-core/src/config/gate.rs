//! Login gating settings.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Failed logins within `failure_window` before an account is throttled. 0 disables throttling.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Sliding window for counting failed logins (e.g., "15m").
    #[serde(default = "default_failure_window")]
    pub failure_window: String,
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_failure_window() -> String {
    "15m".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            failure_window: default_failure_window(),
        }
    }
}

impl GateConfig {
    pub fn failure_window(&self) -> Result<Duration, Error> {
        super::parse_duration("gate.failure_window", &self.failure_window)
    }
}
