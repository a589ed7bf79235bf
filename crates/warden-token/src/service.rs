//! Token issuance and parsing.

use crate::claims::SessionClaims;
use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use std::time::Duration;
use warden_core::config::TokenConfig;
use warden_core::config::token::MIN_SECRET_LEN;
use warden_core::{CallerIdentity, Error, Result, Role};

/// Clock skew tolerated by setting `nbf` this far before issuance.
pub const NOT_BEFORE_SKEW: chrono::Duration = chrono::Duration::minutes(1);

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub ttl: Duration,
    pub expires_at: DateTime<Utc>,
}

/// Issues and parses HS256 session tokens.
///
/// Pure computation: no I/O, no shared mutable state, safe to call from any
/// number of tasks at once.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service signing with `secret`. Fails on a short secret, or on a
    /// TTL that is zero or pushes the expiry past the representable date range.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if ttl.is_zero() {
            return Err(Error::Config("token ttl must be greater than zero".into()));
        }
        expiry_after(Utc::now(), ttl)?;

        // Time checks run against the injected clock in `check_window`, so the
        // library only verifies structure, signature and claim presence.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock: Arc::new(SystemClock),
        })
    }

    /// Build from the `[token]` config section.
    pub fn from_config(cfg: &TokenConfig) -> Result<Self> {
        let secret = cfg.resolve_secret()?;
        Self::new(secret.as_bytes(), cfg.ttl()?)
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` with the raw role value `user_type`.
    pub fn create_token(&self, user_id: &str, user_type: i32) -> Result<IssuedToken> {
        let role = Role::try_from(user_type)?;
        if user_id.is_empty() {
            return Err(Error::Args("user id must not be empty".into()));
        }

        let now = self.clock.now();
        let expires_at = expiry_after(now, self.ttl)?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            user_id: user_id.to_string(),
            user_type: role.as_i32(),
            platform_id: 0,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: (now - NOT_BEFORE_SKEW).timestamp(),
        };

        let token = self.sign(&claims)?;
        tracing::debug!(user_id = %user_id, role = %role, "issued session token");

        Ok(IssuedToken {
            token,
            ttl: self.ttl,
            expires_at,
        })
    }

    /// Sign arbitrary claims. Used by `create_token` and by tooling that needs
    /// tokens with a custom validity window.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::TokenUnknown(format!("failed to sign token: {e}")))
    }

    /// Verify `token` and return the caller it identifies.
    pub fn parse_token(&self, token: &str) -> Result<CallerIdentity> {
        let claims = self.parse_claims(token)?;
        let role = Role::try_from(claims.user_type)
            .map_err(|_| Error::TokenUnknown(format!("unknown role {}", claims.user_type)))?;
        if claims.user_id.is_empty() {
            return Err(Error::TokenUnknown("empty user id".into()));
        }
        Ok(CallerIdentity::new(claims.user_id, role))
    }

    /// Verify `token` and return its claims without the role check.
    pub fn parse_claims(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(classify)?;
        self.check_window(&data.claims)?;
        Ok(data.claims)
    }

    fn check_window(&self, claims: &SessionClaims) -> Result<()> {
        // A non-zero platform marks a token minted elsewhere; reject it like an expired one.
        if claims.platform_id != 0 {
            tracing::debug!(platform_id = claims.platform_id, "rejected foreign-platform token");
            return Err(Error::TokenExpired);
        }

        let now = self.clock.now();
        if claims.is_expired_at(now) {
            return Err(Error::TokenExpired);
        }
        if !claims.is_active_at(now) {
            return Err(Error::TokenNotValidYet);
        }
        Ok(())
    }
}

/// `now + ttl`, or a config error when the result does not fit in a timestamp.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| Error::Config(format!("token ttl {}s out of range", ttl.as_secs())))
}

fn classify(err: jsonwebtoken::errors::Error) -> Error {
    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => Error::TokenMalformed,
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        ErrorKind::ImmatureSignature => Error::TokenNotValidYet,
        other => Error::TokenUnknown(format!("{other:?}")),
    }
}
