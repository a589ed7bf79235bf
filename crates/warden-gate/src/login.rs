//! Password login for administrators.

use crate::gate::{GateKeeper, LoginRule};
use crate::throttle::LoginThrottle;
use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use std::sync::Arc;
use warden_core::{AdminRecord, CallContext, Error, Result, Role};
use warden_storage::Database;
use warden_token::{IssuedToken, TokenService};

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(Error::Args("password is empty".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Config(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, phc: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| Error::Config(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub struct AdminAuthenticator {
    db: Arc<dyn Database>,
    gate: GateKeeper,
    throttle: LoginThrottle,
    tokens: Arc<TokenService>,
}

impl AdminAuthenticator {
    pub fn new(db: Arc<dyn Database>, throttle: LoginThrottle, tokens: Arc<TokenService>) -> Self {
        Self {
            gate: GateKeeper::new(db.clone()),
            db,
            throttle,
            tokens,
        }
    }

    /// Authenticate an admin by account and password, returning an Admin session token.
    ///
    /// Order: account lookup, failure throttle, IP login block, password check.
    pub async fn login(
        &self,
        ctx: &CallContext,
        account: &str,
        password: &str,
        ip: &str,
    ) -> Result<IssuedToken> {
        if account.is_empty() || password.is_empty() {
            return Err(Error::Args("account and password are required".into()));
        }

        let admin = ctx
            .guard(self.db.get_admin_by_account(account))
            .await?
            .ok_or_else(|| Error::NotFound(format!("admin account {account:?}")))?;

        self.throttle.check_attempts(ctx, account).await?;
        self.gate
            .check_rules(ctx, &[LoginRule::IpForbidden], &admin.user_id, ip)
            .await?;

        if !verify_password(password, &admin.password_hash)? {
            tracing::info!(account = %account, ip = %ip, "admin password rejected");
            self.throttle.record_failure(ctx, account, ip).await?;
            return Err(Error::Args("password error".into()));
        }

        self.throttle.clear_failures(ctx, account).await?;
        let issued = self.tokens.create_token(&admin.user_id, Role::Admin.as_i32())?;
        tracing::info!(account = %account, user_id = %admin.user_id, "admin logged in");
        Ok(issued)
    }

    /// Create an admin account if `account` is not already registered.
    ///
    /// Returns `true` when a new record was written.
    pub async fn ensure_admin(
        &self,
        ctx: &CallContext,
        account: &str,
        user_id: &str,
        password: &str,
        nickname: &str,
    ) -> Result<bool> {
        if account.is_empty() || user_id.is_empty() {
            return Err(Error::Args("admin account and user_id are required".into()));
        }
        if ctx.guard(self.db.get_admin_by_account(account)).await?.is_some() {
            tracing::debug!(account = %account, "admin account already present");
            return Ok(false);
        }
        let record = AdminRecord {
            account: account.to_string(),
            user_id: user_id.to_string(),
            password_hash: hash_password(password)?,
            nickname: nickname.to_string(),
            created_at: Utc::now(),
        };
        ctx.guard(self.db.create_admin(record)).await?;
        tracing::info!(account = %account, user_id = %user_id, "admin account created");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let phc = hash_password("s3cret").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password("s3cret", &phc).unwrap());
        assert!(!verify_password("wrong", &phc).unwrap());
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hash_password(""), Err(Error::Args(_))));
    }

    #[test]
    fn test_corrupt_hash_is_config_error() {
        assert!(matches!(verify_password("x", "not-a-phc"), Err(Error::Config(_))));
    }
}
