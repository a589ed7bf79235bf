//! Route definitions.

use crate::handlers::{self, auth, blocks, invitations};
use crate::middleware::{attach_context, require_session};
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/auth/token/parse", post(auth::parse_token));

    let protected = Router::new()
        .route("/auth/register/check", post(auth::check_registration))
        .route("/auth/login/check", post(auth::check_login))
        .route("/invitations", post(invitations::add_codes))
        .route("/invitations/generate", post(invitations::generate_codes))
        .route("/invitations/find", post(invitations::find_codes))
        .route("/invitations/delete", post(invitations::delete_codes))
        .route("/invitations/redeem", post(invitations::redeem_code))
        .route(
            "/blocks/ips",
            get(blocks::list_forbidden_ips)
                .post(blocks::forbid_ips)
                .delete(blocks::unforbid_ips),
        )
        .route(
            "/blocks/user-ips",
            post(blocks::allow_user_ips).delete(blocks::disallow_user_ips),
        )
        .route("/blocks/user-ips/{user_id}", get(blocks::list_user_ips))
        .route(
            "/blocks/accounts",
            get(blocks::list_account_blocks)
                .post(blocks::block_accounts)
                .delete(blocks::unblock_accounts),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), attach_context))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
