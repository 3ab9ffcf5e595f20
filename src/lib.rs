//! # Taleweave
//!
//! A story publishing server. Every account owns a public domain under the
//! platform suffix (`my-family.taleweave.site`), writes stories and chapters,
//! and places media from a shared gallery into them. Usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! taleweave = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taleweave::config::ServerConfig;
//! use taleweave::server::{AppState, create_router};
//! use taleweave::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! An external blob provider can be plugged in with
//! [`server::AppState::with_blob_storage`].
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `taleweave` binary. Disable with `default-features = false`.

pub mod accounts;
pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod ident;
pub mod media;
pub mod quota;
pub mod server;
pub mod store;
pub mod stories;
pub mod tenant;
pub mod types;
