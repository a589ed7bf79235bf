use crate::api_types::{
    CodesRequest, CodesResponse, GenerateCodesRequest, OkResponse, RedeemRequest, RemovedResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use warden_core::{CallContext, InvitationCode};

pub async fn add_codes(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<CodesRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    state.ledger().add_explicit_codes(&ctx, &req.codes).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn generate_codes(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<GenerateCodesRequest>, JsonRejection>,
) -> Result<Json<CodesResponse>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    let codes = state
        .ledger()
        .generate_codes(&ctx, req.num, req.len, req.charset.as_deref())
        .await?;
    Ok(Json(CodesResponse { codes }))
}

pub async fn find_codes(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<CodesRequest>, JsonRejection>,
) -> Result<Json<Vec<InvitationCode>>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    Ok(Json(state.ledger().find_by_code(&ctx, &req.codes).await?))
}

pub async fn delete_codes(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<CodesRequest>, JsonRejection>,
) -> Result<Json<RemovedResponse>, ApiError> {
    warden_policy::require_admin(&ctx)?;
    let Json(req) = body?;
    let removed = state.ledger().delete(&ctx, &req.codes).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// Admins may redeem on anyone's behalf; users only for themselves.
pub async fn redeem_code(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    warden_policy::require_admin_or_self(&ctx, &[req.user_id.as_str()])?;
    state.ledger().redeem(&ctx, &req.code, &req.user_id).await?;
    Ok(Json(OkResponse::ok()))
}
