//! Ordered admission checks.

use std::sync::Arc;
use warden_core::{CallContext, Error, Result};
use warden_storage::Database;

/// One login admission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRule {
    /// The IP is blocked for login.
    IpForbidden,
    /// The user has an allow-list that does not contain the IP.
    UserIpNotAllowed,
    /// The account is blocked.
    AccountBlocked,
}

/// Evaluation order for [`GateKeeper::check_login`]. Broader rules come first.
pub const LOGIN_RULES: [LoginRule; 3] = [
    LoginRule::IpForbidden,
    LoginRule::UserIpNotAllowed,
    LoginRule::AccountBlocked,
];

impl LoginRule {
    /// Returns the denial reason if this rule rejects the attempt.
    async fn denial(
        self,
        db: &dyn Database,
        ctx: &CallContext,
        user_id: &str,
        ip: &str,
    ) -> Result<Option<String>> {
        match self {
            LoginRule::IpForbidden => {
                let entries = ctx.guard(db.find_ip_forbidden(&[ip.to_string()])).await?;
                Ok(entries
                    .iter()
                    .any(|e| e.limit_login)
                    .then(|| "ip forbidden".to_string()))
            }
            LoginRule::UserIpNotAllowed => {
                if ctx.guard(db.get_user_ip_allow(user_id, ip)).await?.is_some() {
                    return Ok(None);
                }
                let total = ctx.guard(db.count_user_ip_allow(user_id)).await?;
                Ok((total > 0).then(|| "user ip forbidden".to_string()))
            }
            LoginRule::AccountBlocked => {
                let block = ctx.guard(db.get_account_block(user_id)).await?;
                Ok(block.map(|b| b.reason))
            }
        }
    }
}

/// Login and registration gate.
pub struct GateKeeper {
    db: Arc<dyn Database>,
}

impl GateKeeper {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Reject registration from an IP blocked with `limit_register`.
    pub async fn check_registration(&self, ctx: &CallContext, ip: &str) -> Result<()> {
        let entries = ctx
            .guard(self.db.find_ip_forbidden(&[ip.to_string()]))
            .await?;
        if entries.iter().any(|e| e.limit_register) {
            tracing::info!(ip = %ip, "registration denied: ip forbidden");
            return Err(Error::Forbidden("ip forbidden".into()));
        }
        Ok(())
    }

    /// Apply [`LOGIN_RULES`] in order; the first denial is returned.
    pub async fn check_login(&self, ctx: &CallContext, user_id: &str, ip: &str) -> Result<()> {
        self.check_rules(ctx, &LOGIN_RULES, user_id, ip).await
    }

    /// Apply a subset of the login rules, in the order given.
    pub async fn check_rules(
        &self,
        ctx: &CallContext,
        rules: &[LoginRule],
        user_id: &str,
        ip: &str,
    ) -> Result<()> {
        for rule in rules {
            if let Some(reason) = rule.denial(self.db.as_ref(), ctx, user_id, ip).await? {
                tracing::info!(user_id = %user_id, ip = %ip, ?rule, reason = %reason, "login denied");
                return Err(Error::Forbidden(reason));
            }
        }
        tracing::debug!(user_id = %user_id, ip = %ip, "login admitted");
        Ok(())
    }
}
