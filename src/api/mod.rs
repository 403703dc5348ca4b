use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::{self, RevocationSet, TokenSigner};
use crate::config::Config;
use crate::state::SharedState;

mod error;
mod home;
mod observability;
mod posts;
mod types;
mod uploads;
mod users;
pub mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.shared.tokens
    }

    #[must_use]
    pub fn revoked_tokens(&self) -> &RevocationSet {
        &self.shared.revoked_tokens
    }

    pub async fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.shared.config.read().await.uploads.path)
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (upload_path, cors_origins, max_upload_bytes) = {
        let config = state.config().read().await;
        (
            config.uploads.path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.uploads.max_bytes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/home/register", post(home::register))
        .route("/home/login", post(home::login))
        .route("/home/posts/search", get(home::search_by_title))
        .route("/splash", get(uploads::splash))
        .route("/upload", post(uploads::upload_file))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(api_router)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(upload_path),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/home/logout", post(home::logout))
        .route("/home/search", get(home::search))
        .route("/home/posts/{post_id}", get(home::get_post))
        .route("/home/category", get(home::by_category))
        .route("/posts/create", post(posts::create_post))
        .route("/posts/posts/{post_id}", put(posts::update_post))
        .route("/posts/posts/{post_id}", delete(posts::delete_post))
        .route("/posts/{post_id}/status", patch(posts::mark_availability))
        .route("/users/user/posts", get(users::get_user_posts))
        .route("/users/user/posts/{post_id}", get(users::get_user_post))
        .route("/users/user/profile", get(users::get_profile))
        .route("/users/user", put(users::update_user))
        .route("/users/user/{user_id}", delete(users::delete_user))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
