//! The Database trait and backend selection.

use crate::memory::MemoryDatabase;
use crate::sqlite::SqliteDatabase;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use warden_core::config::DatabaseUrl;
use warden_core::{
    AccountBlock, AdminRecord, InvitationCode, IpForbiddenEntry, LoginFailure, StorageError,
    UserIpAllowEntry,
};

/// Typed finds and updates over the records Warden gates on.
///
/// Implementations own all durable state. Callers wrap each call in
/// [`CallContext::guard`](warden_core::CallContext::guard) to apply deadlines and
/// cancellation, so implementations must be safe to drop mid-flight.
#[async_trait]
pub trait Database: Send + Sync {
    // Admins

    async fn get_admin_by_account(&self, account: &str)
    -> Result<Option<AdminRecord>, StorageError>;

    /// Insert an admin. Fails with `Duplicate` if the account exists.
    async fn create_admin(&self, admin: AdminRecord) -> Result<(), StorageError>;

    // IP block list

    async fn find_ip_forbidden(&self, ips: &[String])
    -> Result<Vec<IpForbiddenEntry>, StorageError>;

    /// Insert or replace entries keyed by IP.
    async fn upsert_ip_forbidden(&self, entries: Vec<IpForbiddenEntry>)
    -> Result<(), StorageError>;

    /// Remove entries; returns how many existed.
    async fn delete_ip_forbidden(&self, ips: &[String]) -> Result<u64, StorageError>;

    async fn list_ip_forbidden(&self) -> Result<Vec<IpForbiddenEntry>, StorageError>;

    // Per-user IP allow-list

    async fn get_user_ip_allow(
        &self,
        user_id: &str,
        ip: &str,
    ) -> Result<Option<UserIpAllowEntry>, StorageError>;

    async fn count_user_ip_allow(&self, user_id: &str) -> Result<u64, StorageError>;

    /// Insert entries, ignoring (user, ip) pairs already present.
    async fn add_user_ip_allow(&self, entries: Vec<UserIpAllowEntry>)
    -> Result<(), StorageError>;

    async fn delete_user_ip_allow(&self, user_id: &str, ips: &[String])
    -> Result<u64, StorageError>;

    async fn list_user_ip_allow(&self, user_id: &str)
    -> Result<Vec<UserIpAllowEntry>, StorageError>;

    // Account blocks

    async fn get_account_block(&self, user_id: &str)
    -> Result<Option<AccountBlock>, StorageError>;

    /// Insert or replace blocks keyed by user id.
    async fn upsert_account_block(&self, blocks: Vec<AccountBlock>) -> Result<(), StorageError>;

    async fn delete_account_block(&self, user_ids: &[String]) -> Result<u64, StorageError>;

    async fn list_account_blocks(&self) -> Result<Vec<AccountBlock>, StorageError>;

    // Login failures

    async fn record_login_failure(&self, failure: LoginFailure) -> Result<(), StorageError>;

    /// Failures for `account` at or after `since`.
    async fn count_login_failures(
        &self,
        account: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    async fn clear_login_failures(&self, account: &str) -> Result<(), StorageError>;

    // Invitation codes

    /// Existing rows among `codes`. Missing codes are simply absent.
    async fn find_invitation_codes(&self, codes: &[String])
    -> Result<Vec<InvitationCode>, StorageError>;

    /// Insert all entries or none. Fails with `Duplicate` naming the first clash.
    async fn create_invitation_codes(&self, entries: Vec<InvitationCode>)
    -> Result<(), StorageError>;

    /// Set `used_by_user_id` only where it is still empty, in one atomic step.
    /// Returns whether the update applied.
    async fn conditional_redeem(&self, code: &str, user_id: &str) -> Result<bool, StorageError>;

    async fn delete_invitation_codes(&self, codes: &[String]) -> Result<u64, StorageError>;
}

/// Open the backend named by the `server.database` setting.
pub async fn connect(url: &DatabaseUrl) -> Result<Arc<dyn Database>, StorageError> {
    match url {
        DatabaseUrl::Memory => {
            tracing::warn!("using in-memory database; state is lost on restart");
            Ok(Arc::new(MemoryDatabase::new()))
        }
        DatabaseUrl::Sqlite(url) => Ok(Arc::new(SqliteDatabase::connect(url).await?)),
    }
}
