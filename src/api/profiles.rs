use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser};
use crate::db::{Comment, Favorite, Profile};
use crate::services::{ProfileUpdate, PublicProfile};

/// GET /api/users/{username}
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<PublicProfile>>, ApiError> {
    let profile = state.profile_service().public_profile(&username).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /api/users/{username}/comments
pub async fn get_user_comments(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = state.profile_service().comments_of(&username).await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// GET /api/users/{username}/favorites
pub async fn get_user_favorites(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<Favorite>>>, ApiError> {
    let favorites = state.profile_service().favorites_of(&username).await?;
    Ok(Json(ApiResponse::success(favorites)))
}

/// PUT /api/profile
/// Updates the caller's own profile. Custom images are dropped unless VIP.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.profile_service().update(user.id, update).await?;
    Ok(Json(ApiResponse::success(profile)))
}
