//! Concurrent redemption against both backends.

use futures::future::join_all;
use std::sync::Arc;
use warden_core::{CallContext, Error, InvitationConfig};
use warden_invite::InvitationLedger;
use warden_storage::{Database, MemoryDatabase, SqliteDatabase};

const CONTENDERS: usize = 32;

async fn race(ledger: Arc<InvitationLedger>) {
    let ctx = CallContext::new();
    ledger
        .add_explicit_codes(&ctx, &["RACE".to_string()])
        .await
        .unwrap();

    let attempts = (0..CONTENDERS).map(|i| {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            ledger
                .redeem(&CallContext::new(), "RACE", &format!("user-{i}"))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(Error::AlreadyUsed(_))))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, CONTENDERS - 1);

    let stored = ledger
        .find_by_code(&ctx, &["RACE".to_string()])
        .await
        .unwrap();
    assert!(stored[0].used_by_user_id.starts_with("user-"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeem_memory() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    race(Arc::new(InvitationLedger::new(db, InvitationConfig::default()))).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeem_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invite.db");
    let db: Arc<dyn Database> = Arc::new(
        SqliteDatabase::connect(&format!("sqlite://{}", path.display()))
            .await
            .unwrap(),
    );
    race(Arc::new(InvitationLedger::new(db, InvitationConfig::default()))).await;
}
