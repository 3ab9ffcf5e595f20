use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAccount;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, NotFoundExt, StoreResultExt};
use crate::server::validation::{validate_color, validate_title};
use crate::stories::{NewStory, SettingsPatch, StoryPatch};

pub async fn list_stories(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let stories = state
        .stories
        .list(&auth.account.id)
        .api_err("Failed to list stories")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(stories)))
}

pub async fn create_story(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewStory>,
) -> impl IntoResponse {
    validate_title(&req.title)?;

    let story = state
        .stories
        .create(&auth.account, req)
        .map_err(|e| match e {
            crate::error::Error::Forbidden => {
                ApiError::forbidden("This template is not available on your tier")
            }
            e => ApiError::from(e),
        })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(story))))
}

pub async fn get_story(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let detail = state
        .stories
        .detail(&auth.account.id, &id)
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(detail)))
}

pub async fn update_story(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<StoryPatch>,
) -> impl IntoResponse {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }

    let story = state
        .stories
        .update(&auth.account, &id, patch)
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(story)))
}

pub async fn update_settings(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<SettingsPatch>,
) -> impl IntoResponse {
    if let Some(color) = &patch.primary_color {
        validate_color(color)?;
    }

    let settings = state
        .stories
        .update_settings(&auth.account.id, &id, patch)
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(settings)))
}

pub async fn delete_story(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .stories
        .delete(&auth.account.id, &id)
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
