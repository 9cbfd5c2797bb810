//! System API endpoints: health, status and catalog cache maintenance.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CacheClearedDto, SystemStatus};
use crate::config::CacheBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// `GET /api/system/health`
///
/// Reports whether the database answers. The catalog is not probed: an upstream
/// outage degrades pages but never makes the service unhealthy.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
        })),
    )
        .into_response()
}

/// Returns version, uptime and storage counters.
///
/// # Endpoint
/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let users = state
        .store()
        .count_users()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let local_anime = state
        .store()
        .count_local_anime()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let cache_backend = match state.config().cache.backend {
        CacheBackend::Memory => "memory",
        CacheBackend::Database => "database",
    };

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        cache_backend: cache_backend.to_string(),
        cache_entries: state.catalog().cache().entry_count().await,
        users,
        local_anime,
    })))
}

/// `DELETE /api/system/cache/schedule`
///
/// Drops the seven weekday schedule entries.
pub async fn clear_schedule_cache(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<CacheClearedDto>> {
    let removed = state.catalog().clear_schedule_cache().await;
    Json(ApiResponse::success(CacheClearedDto { removed }))
}

/// `DELETE /api/system/cache`
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheClearedDto>> {
    let removed = state.catalog().clear_all().await;
    Json(ApiResponse::success(CacheClearedDto { removed }))
}
