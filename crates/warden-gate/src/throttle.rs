//! Failed-login throttling over a sliding window.

use std::sync::Arc;
use warden_core::{CallContext, Error, GateConfig, LoginFailure, Result};
use warden_storage::Database;
use warden_token::{Clock, SystemClock};

pub struct LoginThrottle {
    db: Arc<dyn Database>,
    max_failed_attempts: u32,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl LoginThrottle {
    pub fn new(db: Arc<dyn Database>, max_failed_attempts: u32, window: std::time::Duration) -> Result<Self> {
        let window = chrono::Duration::from_std(window)
            .map_err(|e| Error::Config(format!("gate.failure_window: {e}")))?;
        Ok(Self {
            db,
            max_failed_attempts,
            window,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(db: Arc<dyn Database>, cfg: &GateConfig) -> Result<Self> {
        Self::new(db, cfg.max_failed_attempts, cfg.failure_window()?)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn enabled(&self) -> bool {
        self.max_failed_attempts > 0
    }

    /// Fails with `Forbidden` once the account has reached the failure threshold inside the window.
    pub async fn check_attempts(&self, ctx: &CallContext, account: &str) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let since = self.clock.now() - self.window;
        let failures = ctx
            .guard(self.db.count_login_failures(account, since))
            .await?;
        if failures >= u64::from(self.max_failed_attempts) {
            tracing::warn!(account = %account, failures, "login throttled");
            return Err(Error::Forbidden("too many failed attempts".into()));
        }
        Ok(())
    }

    pub async fn record_failure(&self, ctx: &CallContext, account: &str, ip: &str) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let failure = LoginFailure {
            account: account.to_string(),
            ip: ip.to_string(),
            occurred_at: self.clock.now(),
        };
        ctx.guard(self.db.record_login_failure(failure)).await?;
        Ok(())
    }

    pub async fn clear_failures(&self, ctx: &CallContext, account: &str) -> Result<()> {
        ctx.guard(self.db.clear_login_failures(account)).await?;
        Ok(())
    }
}
