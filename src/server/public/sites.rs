use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::SiteQuery;
use crate::server::response::{ApiError, ApiResponse, NotFoundExt};

/// Resolves a domain to its site, or to one story with `?story=<slug>`.
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Query(query): Query<SiteQuery>,
) -> impl IntoResponse {
    let view = state
        .tenants
        .resolve(&domain, query.story.as_deref())
        .not_found_as("Site not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}

pub async fn get_site_story(
    State(state): State<Arc<AppState>>,
    Path((domain, slug)): Path<(String, String)>,
) -> impl IntoResponse {
    let view = state
        .tenants
        .resolve(&domain, Some(&slug))
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}
