use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAccount;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, NotFoundExt};
use crate::server::validation::validate_title;
use crate::stories::{ChapterPatch, NewChapter};

pub async fn create_chapter(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<String>,
    Json(req): Json<NewChapter>,
) -> impl IntoResponse {
    validate_title(&req.title)?;

    let chapter = state
        .stories
        .create_chapter(&auth.account.id, &story_id, req)
        .not_found_as("Story not found")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(chapter))))
}

pub async fn get_chapter(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path((story_id, chapter_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let chapter = state
        .stories
        .chapter(&auth.account.id, &story_id, &chapter_id)
        .not_found_as("Chapter not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(chapter)))
}

pub async fn update_chapter(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path((story_id, chapter_id)): Path<(String, String)>,
    Json(patch): Json<ChapterPatch>,
) -> impl IntoResponse {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }

    let chapter = state
        .stories
        .update_chapter(&auth.account.id, &story_id, &chapter_id, patch)
        .not_found_as("Chapter not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(chapter)))
}

pub async fn delete_chapter(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path((story_id, chapter_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state
        .stories
        .delete_chapter(&auth.account.id, &story_id, &chapter_id)
        .not_found_as("Chapter not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
