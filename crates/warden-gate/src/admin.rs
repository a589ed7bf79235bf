//! Admin-only edits to the block and allow lists.

use chrono::Utc;
use std::net::IpAddr;
use std::sync::Arc;
use warden_core::{
    AccountBlock, CallContext, Error, IpForbiddenEntry, Result, UserIpAllowEntry,
};
use warden_storage::Database;

pub struct BlockListAdmin {
    db: Arc<dyn Database>,
}

impl BlockListAdmin {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Block `ips` for login and/or registration. Existing entries are replaced.
    pub async fn forbid_ips(
        &self,
        ctx: &CallContext,
        ips: &[String],
        limit_login: bool,
        limit_register: bool,
    ) -> Result<()> {
        let operator = warden_policy::require_admin(ctx)?;
        validate_ips(ips)?;
        if !limit_login && !limit_register {
            return Err(Error::Args("at least one of limit_login or limit_register is required".into()));
        }
        let now = Utc::now();
        let entries = ips
            .iter()
            .map(|ip| IpForbiddenEntry {
                ip: ip.clone(),
                limit_login,
                limit_register,
                created_at: now,
            })
            .collect();
        ctx.guard(self.db.upsert_ip_forbidden(entries)).await?;
        tracing::info!(operator = %operator, count = ips.len(), limit_login, limit_register, "ips forbidden");
        Ok(())
    }

    pub async fn unforbid_ips(&self, ctx: &CallContext, ips: &[String]) -> Result<u64> {
        let operator = warden_policy::require_admin(ctx)?;
        validate_ips(ips)?;
        let removed = ctx.guard(self.db.delete_ip_forbidden(ips)).await?;
        tracing::info!(operator = %operator, removed, "ips unforbidden");
        Ok(removed)
    }

    pub async fn list_forbidden_ips(&self, ctx: &CallContext) -> Result<Vec<IpForbiddenEntry>> {
        warden_policy::require_admin(ctx)?;
        Ok(ctx.guard(self.db.list_ip_forbidden()).await?)
    }

    /// Add IPs to a user's allow-list. Once a user has any row, other IPs are refused at login.
    pub async fn allow_user_ips(&self, ctx: &CallContext, user_id: &str, ips: &[String]) -> Result<()> {
        let operator = warden_policy::require_admin(ctx)?;
        require_user_id(user_id)?;
        validate_ips(ips)?;
        let now = Utc::now();
        let entries = ips
            .iter()
            .map(|ip| UserIpAllowEntry {
                user_id: user_id.to_string(),
                ip: ip.clone(),
                created_at: now,
            })
            .collect();
        ctx.guard(self.db.add_user_ip_allow(entries)).await?;
        tracing::info!(operator = %operator, user_id = %user_id, count = ips.len(), "user ips allowed");
        Ok(())
    }

    pub async fn disallow_user_ips(&self, ctx: &CallContext, user_id: &str, ips: &[String]) -> Result<u64> {
        let operator = warden_policy::require_admin(ctx)?;
        require_user_id(user_id)?;
        validate_ips(ips)?;
        let removed = ctx.guard(self.db.delete_user_ip_allow(user_id, ips)).await?;
        tracing::info!(operator = %operator, user_id = %user_id, removed, "user ips disallowed");
        Ok(removed)
    }

    pub async fn list_user_ips(&self, ctx: &CallContext, user_id: &str) -> Result<Vec<UserIpAllowEntry>> {
        warden_policy::require_admin(ctx)?;
        require_user_id(user_id)?;
        Ok(ctx.guard(self.db.list_user_ip_allow(user_id)).await?)
    }

    /// Block accounts with a reason shown to the user at login. The caller is recorded as operator.
    pub async fn block_accounts(&self, ctx: &CallContext, user_ids: &[String], reason: &str) -> Result<()> {
        let operator = warden_policy::require_admin(ctx)?;
        validate_user_ids(user_ids)?;
        if reason.trim().is_empty() {
            return Err(Error::Args("block reason is required".into()));
        }
        let now = Utc::now();
        let blocks = user_ids
            .iter()
            .map(|user_id| AccountBlock {
                user_id: user_id.clone(),
                reason: reason.to_string(),
                operator_id: operator.clone(),
                created_at: now,
            })
            .collect();
        ctx.guard(self.db.upsert_account_block(blocks)).await?;
        tracing::info!(operator = %operator, count = user_ids.len(), "accounts blocked");
        Ok(())
    }

    pub async fn unblock_accounts(&self, ctx: &CallContext, user_ids: &[String]) -> Result<u64> {
        let operator = warden_policy::require_admin(ctx)?;
        validate_user_ids(user_ids)?;
        let removed = ctx.guard(self.db.delete_account_block(user_ids)).await?;
        tracing::info!(operator = %operator, removed, "accounts unblocked");
        Ok(removed)
    }

    pub async fn list_account_blocks(&self, ctx: &CallContext) -> Result<Vec<AccountBlock>> {
        warden_policy::require_admin(ctx)?;
        Ok(ctx.guard(self.db.list_account_blocks()).await?)
    }
}

fn validate_ips(ips: &[String]) -> Result<()> {
    if ips.is_empty() {
        return Err(Error::Args("ips is empty".into()));
    }
    for ip in ips {
        ip.parse::<IpAddr>()
            .map_err(|_| Error::Args(format!("invalid ip: {ip:?}")))?;
    }
    Ok(())
}

fn validate_user_ids(user_ids: &[String]) -> Result<()> {
    if user_ids.is_empty() {
        return Err(Error::Args("user_ids is empty".into()));
    }
    user_ids.iter().try_for_each(|id| require_user_id(id))
}

fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(Error::Args("user_id is empty".into()));
    }
    Ok(())
}
