use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::blob::BlobError;
use crate::server::AppState;
use crate::server::response::ApiError;

fn content_type_for(asset_id: &str) -> &'static str {
    let ext = asset_id
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Streams an asset stored on local disk.
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Response {
    let Some(storage) = &state.local_assets else {
        return ApiError::not_found("Asset not found").into_response();
    };

    let (reader, size) = match storage.open(&asset_id).await {
        Ok(result) => result,
        Err(BlobError::NotFound | BlobError::InvalidAssetId) => {
            return ApiError::not_found("Asset not found").into_response();
        }
        Err(e) => {
            tracing::warn!("Asset storage error: {e}");
            return ApiError::internal("Storage error").into_response();
        }
    };

    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&asset_id))
        .header(header::CONTENT_LENGTH, size)
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
