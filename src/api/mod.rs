use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, CatalogService, CommentService, ProfileService};
use crate::state::SharedState;

mod anime;
pub mod auth;
pub mod calendar;
mod comments;
mod error;
mod favorites;
pub mod observability;
mod profiles;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.shared.catalog
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn comment_service(&self) -> &Arc<dyn CommentService> {
        &self.shared.comment_service
    }

    #[must_use]
    pub fn profile_service(&self) -> &Arc<dyn ProfileService> {
        &self.shared.profile_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
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
    let (static_path, cors_origins, secure_cookies) = {
        let config = state.config();
        (
            config.server.static_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(14)));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/landing", get(anime::landing))
        .route("/anime/search", get(anime::search_anime))
        .route("/anime/top", get(anime::top_anime))
        .route("/anime/popular", get(anime::popular_anime))
        .route("/anime/season", get(anime::season_anime))
        .route("/anime/local", get(anime::local_anime))
        .route("/anime/{id}", get(anime::get_anime))
        .route("/anime/{id}/comments", get(anime::list_comments))
        .route("/schedule/{weekday}", get(calendar::get_schedule))
        .route("/calendar/week", get(calendar::get_week))
        .route("/calendar/{year}/{month}", get(calendar::get_month))
        .route("/users/{username}", get(profiles::get_user_profile))
        .route(
            "/users/{username}/comments",
            get(profiles::get_user_comments),
        )
        .route(
            "/users/{username}/favorites",
            get(profiles::get_user_favorites),
        )
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/system/health", get(system::health))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/static", ServeDir::new(static_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn_with_state(
            state,
            observability::allowed_hosts_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let staff_routes = Router::new()
        .route("/system/status", get(system::get_status))
        .route("/system/cache", delete(system::clear_cache))
        .route(
            "/system/cache/schedule",
            delete(system::clear_schedule_cache),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_staff));

    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/anime/{id}/comments", post(anime::create_comment))
        .route("/anime/{id}/favorite", post(favorites::toggle_favorite))
        .route("/comments/{id}", put(comments::update_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/favorites", get(favorites::list_favorites))
        .route("/profile", put(profiles::update_profile))
        .merge(staff_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
