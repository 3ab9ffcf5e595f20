use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::public::{assets_router, public_router};
use super::user::user_router;
use crate::accounts::AccountService;
use crate::blob::{BlobStorage, LocalBlobStorage};
use crate::config::ServerConfig;
use crate::ident::IdentifierAllocator;
use crate::media::MediaManager;
use crate::quota::QuotaEnforcer;
use crate::store::Store;
use crate::stories::StoryService;
use crate::tenant::TenantResolver;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
    /// Set when assets live on local disk and are served by this process.
    pub local_assets: Option<Arc<LocalBlobStorage>>,
    pub allocator: Arc<IdentifierAllocator>,
    pub quota: Arc<QuotaEnforcer>,
    pub accounts: Arc<AccountService>,
    pub stories: StoryService,
    pub media: MediaManager,
    pub tenants: TenantResolver,
}

impl AppState {
    /// Builds the state with assets stored under `config.assets_dir()`.
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        let local = Arc::new(LocalBlobStorage::new(
            &config.assets_dir(),
            &config.asset_base_url(),
        ));
        let mut state = Self::with_blob_storage(store, config, local.clone());
        state.local_assets = Some(local);
        state
    }

    /// Builds the state around an external blob provider. `/assets` is not
    /// served in this mode.
    pub fn with_blob_storage(
        store: Arc<dyn Store>,
        config: ServerConfig,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        let allocator = Arc::new(IdentifierAllocator::new(
            store.clone(),
            config.platform_suffix.clone(),
        ));
        let quota = Arc::new(QuotaEnforcer::new(store.clone()));
        let accounts = Arc::new(AccountService::new(store.clone(), allocator.clone()));
        let stories = StoryService::new(
            store.clone(),
            allocator.clone(),
            accounts.clone(),
            quota.clone(),
        );
        let media = MediaManager::new(store.clone(), blobs, quota.clone());
        let tenants = TenantResolver::new(store.clone(), config.platform_suffix.clone());

        Self {
            store,
            config,
            local_assets: None,
            allocator,
            quota,
            accounts,
            stories,
            media,
            tenants,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", public_router())
        .nest("/api/v1", user_router())
        .nest("/assets", assets_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
