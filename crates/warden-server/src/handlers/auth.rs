use crate::api_types::{
    AdminLoginRequest, IdentityResponse, LoginCheckRequest, OkResponse, ParseTokenRequest,
    RegisterCheckRequest, TokenResponse,
};
use crate::error::ApiError;
use crate::middleware::ClientIp;
use crate::state::AppState;
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use warden_core::CallContext;

/// Password login for administrators.
pub async fn admin_login(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    body: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(req) = body?;
    let issued = state
        .auth()
        .login(&ctx, &req.account, &req.password, &ip)
        .await?;
    Ok(Json(TokenResponse {
        token: issued.token,
        expires_in: issued.ttl.as_secs(),
        expires_at: issued.expires_at,
    }))
}

/// Resolve a token to the identity it carries.
pub async fn parse_token(
    State(state): State<AppState>,
    body: Result<Json<ParseTokenRequest>, JsonRejection>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let Json(req) = body?;
    let caller = state.tokens().parse_token(&req.token)?;
    Ok(Json(IdentityResponse {
        user_id: caller.user_id,
        role: caller.role,
    }))
}

pub async fn check_registration(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<RegisterCheckRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    state.gate().check_registration(&ctx, &req.ip).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn check_login(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<LoginCheckRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    if req.user_id.is_empty() {
        return Err(warden_core::Error::Args("user_id is empty".into()).into());
    }
    state.gate().check_login(&ctx, &req.user_id, &req.ip).await?;
    Ok(Json(OkResponse::ok()))
}
