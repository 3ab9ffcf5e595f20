mod account;
mod chapters;
mod media;
mod stories;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

/// Largest accepted media upload.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Account
        .route("/account", get(account::get_account))
        .route("/quota", get(account::get_quota))
        .route("/quota/recompute", post(account::recompute_quota))
        // Stories
        .route("/stories", get(stories::list_stories).post(stories::create_story))
        .route(
            "/stories/{id}",
            get(stories::get_story)
                .patch(stories::update_story)
                .delete(stories::delete_story),
        )
        .route("/stories/{id}/settings", put(stories::update_settings))
        // Chapters
        .route("/stories/{id}/chapters", post(chapters::create_chapter))
        .route(
            "/stories/{id}/chapters/{chapter_id}",
            get(chapters::get_chapter)
                .patch(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        // Gallery
        .route(
            "/media",
            get(media::list_media)
                .post(media::upload_media)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/media/{id}", delete(media::delete_media))
        .route("/media/link", post(media::link_media))
        // Placements
        .route(
            "/media-references/{id}",
            patch(media::reorder_reference).delete(media::unlink_reference),
        )
}
