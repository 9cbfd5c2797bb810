use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_anime_id;
use super::{ApiError, ApiResponse, AppState, CurrentUser, FavoriteDto, FavoriteToggleDto};

/// POST /api/anime/{id}/favorite
/// Flips the favorite. Unknown anime cannot be favorited.
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FavoriteToggleDto>>, ApiError> {
    let anime_id = validate_anime_id(id)?;

    let already = state
        .store()
        .is_favorited(user.id, anime_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // Only adding needs the catalog.
    if !already && state.catalog().get_by_id(anime_id).await.is_none() {
        return Err(ApiError::anime_not_found(id));
    }

    let is_favorited = state
        .store()
        .toggle_favorite(user.id, anime_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::info!(user_id = user.id, anime_id = %anime_id, is_favorited, "Favorite toggled");

    Ok(Json(ApiResponse::success(FavoriteToggleDto {
        anime_id,
        is_favorited,
    })))
}

/// GET /api/favorites
/// The caller's favorites, newest first, each with its catalog record.
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<FavoriteDto>>>, ApiError> {
    let favorites = state
        .store()
        .list_favorites(user.id, None)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // Upstream rate-limits bursts; one lookup at a time.
    let mut dtos = Vec::with_capacity(favorites.len());
    for favorite in favorites {
        let anime = state.catalog().get_by_id(favorite.anime_id).await;
        dtos.push(FavoriteDto {
            anime_id: favorite.anime_id,
            created_at: favorite.created_at,
            anime,
        });
    }

    Ok(Json(ApiResponse::success(dtos)))
}
