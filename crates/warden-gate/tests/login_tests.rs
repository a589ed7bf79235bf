//! Admin login and gate behavior over the in-memory backend.

use std::sync::Arc;
use std::time::Duration;
use warden_core::{
    CallContext, Error, IpForbiddenEntry, Role, StorageError,
};
use warden_gate::{AdminAuthenticator, GateKeeper, LoginThrottle};
use warden_storage::{Database, MemoryDatabase};
use warden_token::TokenService;

const SECRET: &[u8] = b"an-integration-test-secret-of-32+bytes";

struct Fixture {
    db: Arc<MemoryDatabase>,
    tokens: Arc<TokenService>,
    auth: AdminAuthenticator,
}

async fn fixture(max_failed_attempts: u32) -> Fixture {
    let db = Arc::new(MemoryDatabase::new());
    let tokens = Arc::new(TokenService::new(SECRET, Duration::from_secs(3600)).unwrap());
    let throttle =
        LoginThrottle::new(db.clone(), max_failed_attempts, Duration::from_secs(900)).unwrap();
    let auth = AdminAuthenticator::new(db.clone(), throttle, tokens.clone());
    assert!(
        auth.ensure_admin(&CallContext::new(), "root", "admin-1", "hunter2", "Root")
            .await
            .unwrap()
    );
    Fixture { db, tokens, auth }
}

#[tokio::test]
async fn test_login_issues_admin_token() {
    let f = fixture(5).await;
    let issued = f
        .auth
        .login(&CallContext::new(), "root", "hunter2", "10.0.0.1")
        .await
        .unwrap();

    assert_eq!(issued.ttl, Duration::from_secs(3600));
    let caller = f.tokens.parse_token(&issued.token).unwrap();
    assert_eq!(caller.user_id, "admin-1");
    assert_eq!(caller.role, Role::Admin);
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent() {
    let f = fixture(5).await;
    let created = f
        .auth
        .ensure_admin(&CallContext::new(), "root", "admin-1", "other", "Root")
        .await
        .unwrap();
    assert!(!created);

    // The original password still works.
    assert!(
        f.auth
            .login(&CallContext::new(), "root", "hunter2", "10.0.0.1")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let f = fixture(5).await;
    let err = f
        .auth
        .login(&CallContext::new(), "nobody", "hunter2", "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_bad_password_counts_toward_throttle() {
    let f = fixture(2).await;
    let ctx = CallContext::new();

    for _ in 0..2 {
        match f.auth.login(&ctx, "root", "wrong", "10.0.0.1").await {
            Err(Error::Args(msg)) => assert_eq!(msg, "password error"),
            other => panic!("expected Args, got {other:?}"),
        }
    }

    // Even the right password is refused while throttled.
    match f.auth.login(&ctx, "root", "hunter2", "10.0.0.1").await {
        Err(Error::Forbidden(msg)) => assert_eq!(msg, "too many failed attempts"),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_clears_failures() {
    let f = fixture(2).await;
    let ctx = CallContext::new();

    let _ = f.auth.login(&ctx, "root", "wrong", "10.0.0.1").await;
    f.auth.login(&ctx, "root", "hunter2", "10.0.0.1").await.unwrap();
    let _ = f.auth.login(&ctx, "root", "wrong", "10.0.0.1").await;

    // One failure since the successful login, so still below the threshold.
    assert!(f.auth.login(&ctx, "root", "hunter2", "10.0.0.1").await.is_ok());
}

#[tokio::test]
async fn test_forbidden_ip_blocks_admin_login() {
    let f = fixture(5).await;
    f.db.upsert_ip_forbidden(vec![IpForbiddenEntry {
        ip: "6.6.6.6".into(),
        limit_login: true,
        limit_register: false,
        created_at: chrono::Utc::now(),
    }])
    .await
    .unwrap();

    match f.auth.login(&CallContext::new(), "root", "hunter2", "6.6.6.6").await {
        Err(Error::Forbidden(msg)) => assert_eq!(msg, "ip forbidden"),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_context_surfaces_storage_error() {
    let gate = GateKeeper::new(Arc::new(MemoryDatabase::new()));
    let ctx = CallContext::new();
    ctx.cancellation().cancel();

    let err = gate.check_login(&ctx, "u1", "1.1.1.1").await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Cancelled)));
    assert_eq!(err.code(), "CANCELLED");
}

#[tokio::test(start_paused = true)]
async fn test_expired_deadline_surfaces_storage_error() {
    let gate = GateKeeper::new(Arc::new(MemoryDatabase::new()));
    let ctx = CallContext::new().with_timeout(Duration::from_millis(10));
    tokio::time::advance(Duration::from_millis(20)).await;

    let err = gate.check_registration(&ctx, "1.1.1.1").await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::DeadlineExceeded)));
}
