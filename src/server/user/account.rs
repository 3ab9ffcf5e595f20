use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAccount;
use crate::server::AppState;
use crate::server::dto::RecomputeResponse;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

pub async fn get_account(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Re-read so the cached count reflects the latest recompute.
    let account = state
        .store
        .get_account(&auth.account.id)
        .api_err("Failed to get account")?
        .or_not_found("Account not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(account)))
}

pub async fn get_quota(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let status = state
        .quota
        .status(&auth.account.id)
        .api_err("Failed to get quota")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(status)))
}

pub async fn recompute_quota(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let content_count = state
        .quota
        .recompute(&auth.account.id)
        .api_err("Failed to recompute content count")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(RecomputeResponse {
        content_count,
    })))
}
