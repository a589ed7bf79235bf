//! Per-call context carried from the transport into every component.
//!
//! The transport fills two metadata fields from the parsed session token:
//! [`OPERATOR_ID`] (a single string) and [`OPERATOR_ROLE`] (a list whose first
//! element is the decimal role value). The context also carries the caller's
//! deadline and cancellation token, which every Database call honors through
//! [`CallContext::guard`].

use crate::error::StorageError;
use crate::role::CallerIdentity;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Metadata key holding the caller's user id.
pub const OPERATOR_ID: &str = "operator-id";

/// Metadata key holding the caller's role as a list of strings.
pub const OPERATOR_ROLE: &str = "operator-role";

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: HashMap<String, Vec<String>>,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Empty context with no identity, no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context populated with the two operator fields for `identity`.
    pub fn for_caller(identity: &CallerIdentity) -> Self {
        let mut ctx = Self::new();
        ctx.insert(OPERATOR_ID, vec![identity.user_id.clone()]);
        ctx.insert(OPERATOR_ROLE, vec![identity.role.as_i32().to_string()]);
        ctx
    }

    /// Replace the values stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.metadata.insert(key.into(), values);
    }

    /// Append a single value under `key`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.metadata.get(key).map(Vec::as_slice)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Run a storage future under this context's cancellation token and deadline.
    ///
    /// The inner future is dropped as soon as either fires.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        if self.cancellation.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(StorageError::DeadlineExceeded);
        }

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                tracing::debug!("storage call cancelled by caller");
                Err(StorageError::Cancelled)
            }
            _ = expiry => {
                tracing::debug!("storage call hit caller deadline");
                Err(StorageError::DeadlineExceeded)
            }
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[test]
    fn test_for_caller_sets_operator_fields() {
        let ctx = CallContext::for_caller(&CallerIdentity::new("u-1", Role::Admin));
        assert_eq!(ctx.get(OPERATOR_ID), Some(&["u-1".to_string()][..]));
        assert_eq!(ctx.get(OPERATOR_ROLE), Some(&["2".to_string()][..]));
    }

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let ctx = CallContext::new();
        let value = ctx.guard(async { Ok::<_, StorageError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_guard_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::new().with_cancellation(token.clone());
        token.cancel();
        let res = ctx
            .guard(async { Ok::<_, StorageError>(()) })
            .await;
        assert!(matches!(res, Err(StorageError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_reports_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        let res = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, StorageError>(())
            })
            .await;
        assert!(matches!(res, Err(StorageError::DeadlineExceeded)));
    }
}
