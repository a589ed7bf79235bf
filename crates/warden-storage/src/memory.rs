//! In-process Database backend.

use crate::database::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use warden_core::{
    AccountBlock, AdminRecord, InvitationCode, IpForbiddenEntry, LoginFailure, StorageError,
    UserIpAllowEntry,
};

#[derive(Default)]
struct Tables {
    admins: HashMap<String, AdminRecord>,
    ip_forbidden: BTreeMap<String, IpForbiddenEntry>,
    user_ip_allow: BTreeMap<(String, String), UserIpAllowEntry>,
    account_blocks: BTreeMap<String, AccountBlock>,
    login_failures: Vec<LoginFailure>,
    invitation_codes: BTreeMap<String, InvitationCode>,
}

/// All tables behind one lock, so each call is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|e| StorageError::Backend(format!("failed to acquire read lock: {e}").into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|e| StorageError::Backend(format!("failed to acquire write lock: {e}").into()))
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn get_admin_by_account(
        &self,
        account: &str,
    ) -> Result<Option<AdminRecord>, StorageError> {
        Ok(self.read()?.admins.get(account).cloned())
    }

    async fn create_admin(&self, admin: AdminRecord) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        if tables.admins.contains_key(&admin.account) {
            return Err(StorageError::Duplicate(admin.account));
        }
        tables.admins.insert(admin.account.clone(), admin);
        Ok(())
    }

    async fn find_ip_forbidden(
        &self,
        ips: &[String],
    ) -> Result<Vec<IpForbiddenEntry>, StorageError> {
        let tables = self.read()?;
        Ok(ips
            .iter()
            .filter_map(|ip| tables.ip_forbidden.get(ip).cloned())
            .collect())
    }

    async fn upsert_ip_forbidden(
        &self,
        entries: Vec<IpForbiddenEntry>,
    ) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        for entry in entries {
            tables.ip_forbidden.insert(entry.ip.clone(), entry);
        }
        Ok(())
    }

    async fn delete_ip_forbidden(&self, ips: &[String]) -> Result<u64, StorageError> {
        let mut tables = self.write()?;
        Ok(ips
            .iter()
            .filter(|ip| tables.ip_forbidden.remove(*ip).is_some())
            .count() as u64)
    }

    async fn list_ip_forbidden(&self) -> Result<Vec<IpForbiddenEntry>, StorageError> {
        Ok(self.read()?.ip_forbidden.values().cloned().collect())
    }

    async fn get_user_ip_allow(
        &self,
        user_id: &str,
        ip: &str,
    ) -> Result<Option<UserIpAllowEntry>, StorageError> {
        Ok(self
            .read()?
            .user_ip_allow
            .get(&(user_id.to_string(), ip.to_string()))
            .cloned())
    }

    async fn count_user_ip_allow(&self, user_id: &str) -> Result<u64, StorageError> {
        Ok(self
            .read()?
            .user_ip_allow
            .keys()
            .filter(|(uid, _)| uid == user_id)
            .count() as u64)
    }

    async fn add_user_ip_allow(
        &self,
        entries: Vec<UserIpAllowEntry>,
    ) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        for entry in entries {
            tables
                .user_ip_allow
                .entry((entry.user_id.clone(), entry.ip.clone()))
                .or_insert(entry);
        }
        Ok(())
    }

    async fn delete_user_ip_allow(
        &self,
        user_id: &str,
        ips: &[String],
    ) -> Result<u64, StorageError> {
        let mut tables = self.write()?;
        Ok(ips
            .iter()
            .filter(|ip| {
                tables
                    .user_ip_allow
                    .remove(&(user_id.to_string(), ip.to_string()))
                    .is_some()
            })
            .count() as u64)
    }

    async fn list_user_ip_allow(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserIpAllowEntry>, StorageError> {
        Ok(self
            .read()?
            .user_ip_allow
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_account_block(
        &self,
        user_id: &str,
    ) -> Result<Option<AccountBlock>, StorageError> {
        Ok(self.read()?.account_blocks.get(user_id).cloned())
    }

    async fn upsert_account_block(&self, blocks: Vec<AccountBlock>) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        for block in blocks {
            tables.account_blocks.insert(block.user_id.clone(), block);
        }
        Ok(())
    }

    async fn delete_account_block(&self, user_ids: &[String]) -> Result<u64, StorageError> {
        let mut tables = self.write()?;
        Ok(user_ids
            .iter()
            .filter(|id| tables.account_blocks.remove(*id).is_some())
            .count() as u64)
    }

    async fn list_account_blocks(&self) -> Result<Vec<AccountBlock>, StorageError> {
        Ok(self.read()?.account_blocks.values().cloned().collect())
    }

    async fn record_login_failure(&self, failure: LoginFailure) -> Result<(), StorageError> {
        self.write()?.login_failures.push(failure);
        Ok(())
    }

    async fn count_login_failures(
        &self,
        account: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        Ok(self
            .read()?
            .login_failures
            .iter()
            .filter(|f| f.account == account && f.occurred_at >= since)
            .count() as u64)
    }

    async fn clear_login_failures(&self, account: &str) -> Result<(), StorageError> {
        self.write()?.login_failures.retain(|f| f.account != account);
        Ok(())
    }

    async fn find_invitation_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<InvitationCode>, StorageError> {
        let tables = self.read()?;
        Ok(codes
            .iter()
            .filter_map(|c| tables.invitation_codes.get(c).cloned())
            .collect())
    }

    async fn create_invitation_codes(
        &self,
        entries: Vec<InvitationCode>,
    ) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        if let Some(clash) = entries
            .iter()
            .find(|e| tables.invitation_codes.contains_key(&e.code))
        {
            return Err(StorageError::Duplicate(clash.code.clone()));
        }
        for entry in entries {
            tables.invitation_codes.insert(entry.code.clone(), entry);
        }
        Ok(())
    }

    async fn conditional_redeem(&self, code: &str, user_id: &str) -> Result<bool, StorageError> {
        let mut tables = self.write()?;
        match tables.invitation_codes.get_mut(code) {
            Some(entry) if entry.used_by_user_id.is_empty() => {
                entry.used_by_user_id = user_id.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_invitation_codes(&self, codes: &[String]) -> Result<u64, StorageError> {
        let mut tables = self.write()?;
        Ok(codes
            .iter()
            .filter(|c| tables.invitation_codes.remove(*c).is_some())
            .count() as u64)
    }
}
