//! Invitation code lifecycle.

use crate::charset::Charset;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use warden_core::{CallContext, Error, InvitationCode, InvitationConfig, Result, StorageError};
use warden_storage::Database;

pub struct InvitationLedger {
    db: Arc<dyn Database>,
    limits: InvitationConfig,
}

impl InvitationLedger {
    pub fn new(db: Arc<dyn Database>, limits: InvitationConfig) -> Self {
        Self { db, limits }
    }

    /// Insert admin-chosen codes as one batch.
    ///
    /// Fails with `Args` on duplicates inside `codes` or on codes that already
    /// exist; the error names every conflicting code and nothing is inserted.
    pub async fn add_explicit_codes(&self, ctx: &CallContext, codes: &[String]) -> Result<()> {
        if codes.is_empty() {
            return Err(Error::Args("codes is empty".into()));
        }
        self.check_batch(codes)?;
        if codes.iter().any(|c| c.is_empty()) {
            return Err(Error::Args("invitation code must not be empty".into()));
        }
        let repeated = repeated(codes);
        if !repeated.is_empty() {
            return Err(Error::Args(format!("duplicate codes in request: {}", repeated.join(","))));
        }
        self.insert_new(ctx, codes.to_vec()).await?;
        tracing::info!(count = codes.len(), "invitation codes added");
        Ok(())
    }

    /// Generate `num` random codes of `len` characters and insert them as one batch.
    ///
    /// A collision, either inside the batch or with stored codes, fails the whole
    /// call with `Args` naming the collisions. There is no retry.
    pub async fn generate_codes(
        &self,
        ctx: &CallContext,
        num: usize,
        len: usize,
        charset: Option<&str>,
    ) -> Result<Vec<String>> {
        if num == 0 {
            return Err(Error::Args("num must be at least 1".into()));
        }
        if len == 0 {
            return Err(Error::Args("len must be at least 1".into()));
        }
        if num > self.limits.max_batch {
            return Err(Error::Args(format!("num exceeds the limit of {}", self.limits.max_batch)));
        }
        if len > self.limits.max_len {
            return Err(Error::Args(format!("len exceeds the limit of {}", self.limits.max_len)));
        }
        let charset = match charset {
            Some(chars) => Charset::new(chars)?,
            None => Charset::default(),
        };

        let codes: Vec<String> = {
            let mut rng = rand::rng();
            (0..num).map(|_| charset.sample(&mut rng, len)).collect()
        };

        let repeated = repeated(&codes);
        if !repeated.is_empty() {
            tracing::warn!(num, len, charset_len = charset.len(), "generated codes collided");
            return Err(Error::Args(format!("generated codes collided: {}", repeated.join(","))));
        }
        self.insert_new(ctx, codes.clone()).await?;
        tracing::info!(count = num, len, "invitation codes generated");
        Ok(codes)
    }

    /// Stored rows among `codes`. Unknown codes are omitted.
    pub async fn find_by_code(&self, ctx: &CallContext, codes: &[String]) -> Result<Vec<InvitationCode>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.check_batch(codes)?;
        Ok(ctx.guard(self.db.find_invitation_codes(codes)).await?)
    }

    /// Mark `code` used by `user_id`. Succeeds at most once per code.
    pub async fn redeem(&self, ctx: &CallContext, code: &str, user_id: &str) -> Result<()> {
        if code.is_empty() {
            return Err(Error::Args("code is empty".into()));
        }
        if user_id.is_empty() {
            return Err(Error::Args("user_id is empty".into()));
        }

        let found = ctx
            .guard(self.db.find_invitation_codes(&[code.to_string()]))
            .await?;
        let Some(entry) = found.into_iter().next() else {
            return Err(Error::NotFound(format!("invitation code {code:?}")));
        };
        if entry.is_used() {
            return Err(Error::AlreadyUsed(code.to_string()));
        }

        // The read above only produces friendlier errors; this write decides the winner.
        if !ctx.guard(self.db.conditional_redeem(code, user_id)).await? {
            tracing::debug!(code = %code, user_id = %user_id, "lost redemption race");
            return Err(Error::AlreadyUsed(code.to_string()));
        }
        tracing::info!(code = %code, user_id = %user_id, "invitation code redeemed");
        Ok(())
    }

    /// Delete codes in any state. Every code must exist.
    pub async fn delete(&self, ctx: &CallContext, codes: &[String]) -> Result<u64> {
        if codes.is_empty() {
            return Err(Error::Args("codes is empty".into()));
        }
        self.check_batch(codes)?;
        let found = ctx.guard(self.db.find_invitation_codes(codes)).await?;
        let present: HashSet<&str> = found.iter().map(|c| c.code.as_str()).collect();
        let missing: Vec<&str> = codes
            .iter()
            .map(String::as_str)
            .filter(|c| !present.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Args(format!("codes not found: {}", missing.join(","))));
        }

        let removed = ctx.guard(self.db.delete_invitation_codes(codes)).await?;
        tracing::info!(removed, "invitation codes deleted");
        Ok(removed)
    }

    fn check_batch(&self, codes: &[String]) -> Result<()> {
        if codes.len() > self.limits.max_batch {
            return Err(Error::Args(format!(
                "{} codes exceeds the limit of {}",
                codes.len(),
                self.limits.max_batch
            )));
        }
        Ok(())
    }

    async fn insert_new(&self, ctx: &CallContext, codes: Vec<String>) -> Result<()> {
        let existing = ctx.guard(self.db.find_invitation_codes(&codes)).await?;
        if !existing.is_empty() {
            let names: Vec<&str> = existing.iter().map(|c| c.code.as_str()).collect();
            return Err(Error::Args(format!("codes already exist: {}", names.join(","))));
        }

        let now = Utc::now();
        let entries = codes
            .into_iter()
            .map(|code| InvitationCode::unused(code, now))
            .collect();
        match ctx.guard(self.db.create_invitation_codes(entries)).await {
            Ok(()) => Ok(()),
            // Inserted concurrently between the check and the write.
            Err(StorageError::Duplicate(code)) => Err(Error::AlreadyExists(code)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Values appearing more than once, each reported once, in first-seen order.
fn repeated(codes: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    codes
        .iter()
        .map(String::as_str)
        .filter(|c| !seen.insert(*c) && reported.insert(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_storage::MemoryDatabase;

    fn ledger() -> InvitationLedger {
        InvitationLedger::new(Arc::new(MemoryDatabase::new()), InvitationConfig::default())
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn args_message<T: std::fmt::Debug>(res: Result<T>) -> String {
        match res {
            Err(Error::Args(msg)) => msg,
            other => panic!("expected Args, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_reports_each_once() {
        let input = codes(&["a", "b", "a", "a", "c", "b"]);
        assert_eq!(repeated(&input), vec!["a", "b"]);
        assert!(repeated(&codes(&["a", "b"])).is_empty());
    }

    #[tokio::test]
    async fn test_explicit_conflict_names_only_existing() {
        let ledger = ledger();
        let ctx = CallContext::new();
        ledger.add_explicit_codes(&ctx, &codes(&["A1"])).await.unwrap();

        let msg = args_message(ledger.add_explicit_codes(&ctx, &codes(&["A1", "B2"])).await);
        assert!(msg.contains("A1"));
        assert!(!msg.contains("B2"));

        // Nothing from the failed batch was inserted.
        assert!(ledger.find_by_code(&ctx, &codes(&["B2"])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_internal_duplicates() {
        let ledger = ledger();
        let msg = args_message(
            ledger
                .add_explicit_codes(&CallContext::new(), &codes(&["X", "Y", "X"]))
                .await,
        );
        assert!(msg.contains('X'));
        assert!(!msg.contains('Y'));
    }

    #[tokio::test]
    async fn test_explicit_rejects_empty_input() {
        let ledger = ledger();
        let ctx = CallContext::new();
        args_message(ledger.add_explicit_codes(&ctx, &[]).await);
        args_message(ledger.add_explicit_codes(&ctx, &codes(&["ok", ""])).await);
    }

    #[tokio::test]
    async fn test_generate_degenerate_charset_inserts_nothing() {
        let ledger = ledger();
        let ctx = CallContext::new();

        let msg = args_message(ledger.generate_codes(&ctx, 2, 3, Some("x")).await);
        assert!(msg.contains("xxx"));
        assert!(ledger.find_by_code(&ctx, &codes(&["xxx"])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_collision_with_storage() {
        let ledger = ledger();
        let ctx = CallContext::new();
        ledger.add_explicit_codes(&ctx, &codes(&["zz"])).await.unwrap();

        let msg = args_message(ledger.generate_codes(&ctx, 1, 2, Some("z")).await);
        assert!(msg.contains("zz"));
    }

    #[tokio::test]
    async fn test_generate_stores_unused_codes() {
        let ledger = ledger();
        let ctx = CallContext::new();

        let generated = ledger.generate_codes(&ctx, 20, 12, None).await.unwrap();
        assert_eq!(generated.len(), 20);
        assert!(generated.iter().all(|c| c.len() == 12));

        let stored = ledger.find_by_code(&ctx, &generated).await.unwrap();
        assert_eq!(stored.len(), 20);
        assert!(stored.iter().all(|c| !c.is_used()));
    }

    #[tokio::test]
    async fn test_generate_argument_checks() {
        let ledger = InvitationLedger::new(
            Arc::new(MemoryDatabase::new()),
            InvitationConfig { max_batch: 5, max_len: 8 },
        );
        let ctx = CallContext::new();

        args_message(ledger.generate_codes(&ctx, 0, 4, None).await);
        args_message(ledger.generate_codes(&ctx, 1, 0, None).await);
        args_message(ledger.generate_codes(&ctx, 1, 4, Some("")).await);
        args_message(ledger.generate_codes(&ctx, 6, 4, None).await);
        args_message(ledger.generate_codes(&ctx, 1, 9, None).await);
        assert_eq!(ledger.generate_codes(&ctx, 5, 8, None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_code_lists_capped_by_max_batch() {
        let ledger = InvitationLedger::new(
            Arc::new(MemoryDatabase::new()),
            InvitationConfig { max_batch: 3, max_len: 8 },
        );
        let ctx = CallContext::new();
        let three = codes(&["K1", "K2", "K3"]);
        let four = codes(&["K1", "K2", "K3", "K4"]);

        let msg = args_message(ledger.add_explicit_codes(&ctx, &four).await);
        assert!(msg.contains("limit of 3"));
        assert!(ledger.find_by_code(&ctx, &three).await.unwrap().is_empty());

        ledger.add_explicit_codes(&ctx, &three).await.unwrap();
        args_message(ledger.find_by_code(&ctx, &four).await);
        args_message(ledger.delete(&ctx, &four).await);

        assert_eq!(ledger.find_by_code(&ctx, &three).await.unwrap().len(), 3);
        assert_eq!(ledger.delete(&ctx, &three).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_redeem_transitions_once() {
        let ledger = ledger();
        let ctx = CallContext::new();
        ledger.add_explicit_codes(&ctx, &codes(&["C1"])).await.unwrap();

        ledger.redeem(&ctx, "C1", "alice").await.unwrap();
        let err = ledger.redeem(&ctx, "C1", "bob").await.unwrap_err();
        assert!(matches!(err, Error::AlreadyUsed(_)));

        let stored = ledger.find_by_code(&ctx, &codes(&["C1"])).await.unwrap();
        assert_eq!(stored[0].used_by_user_id, "alice");
    }

    #[tokio::test]
    async fn test_redeem_errors() {
        let ledger = ledger();
        let ctx = CallContext::new();
        ledger.add_explicit_codes(&ctx, &codes(&["C1"])).await.unwrap();

        assert!(matches!(
            ledger.redeem(&ctx, "missing", "alice").await,
            Err(Error::NotFound(_))
        ));
        args_message(ledger.redeem(&ctx, "C1", "").await);
        args_message(ledger.redeem(&ctx, "", "alice").await);
    }

    #[tokio::test]
    async fn test_delete_requires_all_present() {
        let ledger = ledger();
        let ctx = CallContext::new();
        ledger.add_explicit_codes(&ctx, &codes(&["D1", "D2"])).await.unwrap();
        ledger.redeem(&ctx, "D2", "alice").await.unwrap();

        let msg = args_message(ledger.delete(&ctx, &codes(&["D1", "nope"])).await);
        assert!(msg.contains("nope"));
        assert!(!msg.contains("D1"));
        assert_eq!(ledger.find_by_code(&ctx, &codes(&["D1"])).await.unwrap().len(), 1);

        // Used codes can be deleted too.
        assert_eq!(ledger.delete(&ctx, &codes(&["D1", "D2"])).await.unwrap(), 2);
        assert!(ledger.find_by_code(&ctx, &codes(&["D1", "D2"])).await.unwrap().is_empty());
    }
}
