use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;

use crate::auth::RequireAccount;
use crate::error::Error;
use crate::media::NewUpload;
use crate::server::AppState;
use crate::server::dto::{LinkMediaRequest, ReorderReferenceRequest};
use crate::server::response::{ApiError, ApiResponse, NotFoundExt, StoreResultExt};
use crate::server::validation::validate_link_batch;

pub async fn list_media(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let media = state
        .media
        .list(&auth.account.id)
        .api_err("Failed to list media")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(media)))
}

struct FilePart {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// Accepts a multipart form with a `file` part and an optional `title`.
pub async fn upload_media(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<FilePart> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file = Some(FilePart {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid title: {e}")))?;
                title = Some(text);
            }
            _ => {}
        }
    }

    let Some(file) = file else {
        return Err(ApiError::bad_request("file is required"));
    };

    let media = state
        .media
        .upload(
            &auth.account.id,
            NewUpload {
                file_name: &file.file_name,
                content_type: file.content_type.as_deref(),
                title,
                data: &file.data,
            },
        )
        .await
        .api_err("Failed to upload media")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(media))))
}

pub async fn delete_media(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let outcome = state
        .media
        .delete_media(&auth.account.id, &id)
        .await
        .not_found_as("Media not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(outcome)))
}

pub async fn link_media(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LinkMediaRequest>,
) -> impl IntoResponse {
    validate_link_batch(&req.media_ids)?;

    let created = state
        .media
        .link(
            &auth.account.id,
            &req.story_id,
            req.chapter_id.as_deref(),
            &req.media_ids,
        )
        .map_err(|e| match e {
            Error::NotFound => ApiError::not_found("Story, chapter or media not found"),
            e => ApiError::from(e),
        })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn reorder_reference(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReorderReferenceRequest>,
) -> impl IntoResponse {
    let reference = state
        .media
        .reorder(&auth.account.id, &id, req.order)
        .not_found_as("Reference not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(reference)))
}

pub async fn unlink_reference(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .media
        .unlink(&auth.account.id, &id)
        .not_found_as("Reference not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
