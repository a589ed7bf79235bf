//! Route handlers. Each one authorizes through `warden_policy` before touching state.

pub mod auth;
pub mod blocks;
pub mod invitations;

use axum::Json;
use serde_json::{Value, json};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "warden" }))
}
