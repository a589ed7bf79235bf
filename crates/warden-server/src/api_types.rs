//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::Role;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub account: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Seconds until expiry.
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ParseTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCheckRequest {
    pub ip: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginCheckRequest {
    pub user_id: String,
    pub ip: String,
}

// =============================================================================
// Invitations
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CodesRequest {
    pub codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCodesRequest {
    pub num: usize,
    pub len: usize,
    #[serde(default)]
    pub charset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodesResponse {
    pub codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
    pub user_id: String,
}

// =============================================================================
// Block lists
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ForbidIpsRequest {
    pub ips: Vec<String>,
    #[serde(default)]
    pub limit_login: bool,
    #[serde(default)]
    pub limit_register: bool,
}

#[derive(Debug, Deserialize)]
pub struct IpsRequest {
    pub ips: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserIpsRequest {
    pub user_id: String,
    pub ips: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlockAccountsRequest {
    pub user_ids: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct UserIdsRequest {
    pub user_ids: Vec<String>,
}

// =============================================================================
// Common
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: u64,
}
