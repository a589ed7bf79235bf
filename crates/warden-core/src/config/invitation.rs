//! Invitation code limits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Largest number of codes a single generate call may produce.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Longest generated code.
    #[serde(default = "default_max_len")]
    pub max_len: usize,
}

fn default_max_batch() -> usize {
    10_000
}

fn default_max_len() -> usize {
    64
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            max_batch: default_max_batch(),
            max_len: default_max_len(),
        }
    }
}
