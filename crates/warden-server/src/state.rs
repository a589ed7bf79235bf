//! Shared application state.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{CallContext, WardenConfig};
use warden_gate::{AdminAuthenticator, BlockListAdmin, GateKeeper, LoginThrottle};
use warden_invite::InvitationLedger;
use warden_storage::Database;
use warden_token::TokenService;

/// Cheap to clone; every component sits behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tokens: Arc<TokenService>,
    gate: GateKeeper,
    blocks: BlockListAdmin,
    auth: AdminAuthenticator,
    ledger: InvitationLedger,
    request_timeout: Duration,
    trust_forwarded_for: bool,
}

impl AppState {
    /// Wire every component over `db`.
    pub fn new(
        cfg: &WardenConfig,
        db: Arc<dyn Database>,
        tokens: Arc<TokenService>,
    ) -> anyhow::Result<Self> {
        let throttle = LoginThrottle::from_config(db.clone(), &cfg.gate)?;
        let request_timeout = cfg.server.request_timeout()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                gate: GateKeeper::new(db.clone()),
                blocks: BlockListAdmin::new(db.clone()),
                auth: AdminAuthenticator::new(db.clone(), throttle, tokens.clone()),
                ledger: InvitationLedger::new(db, cfg.invitation.clone()),
                tokens,
                request_timeout,
                trust_forwarded_for: cfg.server.trust_forwarded_for,
            }),
        })
    }

    /// Connect storage, build the token service and bootstrap the admin account.
    pub async fn init(cfg: &WardenConfig) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::from_config(&cfg.token).context("token service")?);
        let url = cfg.server.database_url()?;
        let db = warden_storage::connect(&url)
            .await
            .context("failed to open database")?;

        let state = Self::new(cfg, db, tokens)?;
        state.bootstrap_admin(cfg).await?;
        Ok(state)
    }

    /// Create the configured admin account if it does not exist yet.
    ///
    /// Password source (highest precedence first):
    /// - env named by `admin.password_env` (default `WARDEN_ADMIN_PASSWORD`)
    /// - `[admin].password`
    async fn bootstrap_admin(&self, cfg: &WardenConfig) -> anyhow::Result<()> {
        let Some(password) = cfg.admin.resolve_password() else {
            tracing::warn!(
                env = %cfg.admin.password_env,
                "no admin password configured; skipping admin bootstrap"
            );
            return Ok(());
        };
        let created = self
            .auth()
            .ensure_admin(
                &CallContext::new(),
                &cfg.admin.account,
                &cfg.admin.user_id,
                &password,
                &cfg.admin.nickname,
            )
            .await?;
        if created {
            tracing::warn!(account = %cfg.admin.account, "bootstrapped admin account (password taken from env/config)");
        }
        Ok(())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn gate(&self) -> &GateKeeper {
        &self.inner.gate
    }

    pub fn blocks(&self) -> &BlockListAdmin {
        &self.inner.blocks
    }

    pub fn auth(&self) -> &AdminAuthenticator {
        &self.inner.auth
    }

    pub fn ledger(&self) -> &InvitationLedger {
        &self.inner.ledger
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.inner.trust_forwarded_for
    }
}
