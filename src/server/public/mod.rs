mod assets;
mod signup;
mod sites;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

/// Routes that need no authentication.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public sites
        .route("/sites/{domain}", get(sites::get_site))
        .route("/sites/{domain}/{slug}", get(sites::get_site_story))
        // Signup
        .route("/domains/check", post(signup::check_domain))
        .route("/accounts", post(signup::register))
        .route("/sessions", post(signup::login))
}

pub fn assets_router() -> Router<Arc<AppState>> {
    Router::new().route("/{*asset_id}", get(assets::get_asset))
}
