use crate::api_types::{
    BlockAccountsRequest, ForbidIpsRequest, IpsRequest, OkResponse, RemovedResponse,
    UserIdsRequest, UserIpsRequest,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use warden_core::{AccountBlock, CallContext, IpForbiddenEntry, UserIpAllowEntry};

// IP block list

pub async fn forbid_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<ForbidIpsRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    state
        .blocks()
        .forbid_ips(&ctx, &req.ips, req.limit_login, req.limit_register)
        .await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn unforbid_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<IpsRequest>, JsonRejection>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let Json(req) = body?;
    let removed = state.blocks().unforbid_ips(&ctx, &req.ips).await?;
    Ok(Json(RemovedResponse { removed }))
}

pub async fn list_forbidden_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
) -> Result<Json<Vec<IpForbiddenEntry>>, ApiError> {
    Ok(Json(state.blocks().list_forbidden_ips(&ctx).await?))
}

// Per-user allow-list

pub async fn allow_user_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<UserIpsRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    state
        .blocks()
        .allow_user_ips(&ctx, &req.user_id, &req.ips)
        .await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn disallow_user_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<UserIpsRequest>, JsonRejection>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let Json(req) = body?;
    let removed = state
        .blocks()
        .disallow_user_ips(&ctx, &req.user_id, &req.ips)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

pub async fn list_user_ips(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserIpAllowEntry>>, ApiError> {
    Ok(Json(state.blocks().list_user_ips(&ctx, &user_id).await?))
}

// Account blocks

pub async fn block_accounts(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<BlockAccountsRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = body?;
    state
        .blocks()
        .block_accounts(&ctx, &req.user_ids, &req.reason)
        .await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn unblock_accounts(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
    body: Result<Json<UserIdsRequest>, JsonRejection>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let Json(req) = body?;
    let removed = state.blocks().unblock_accounts(&ctx, &req.user_ids).await?;
    Ok(Json(RemovedResponse { removed }))
}

pub async fn list_account_blocks(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallContext>,
) -> Result<Json<Vec<AccountBlock>>, ApiError> {
    Ok(Json(state.blocks().list_account_blocks(&ctx).await?))
}
