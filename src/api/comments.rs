use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser};
use crate::db::Comment;
use crate::domain::CommentStatus;
use crate::services::{Actor, CommentInput};

#[derive(Debug, Serialize)]
pub struct CommentRemovedDto {
    pub id: i32,
    pub status: CommentStatus,
}

const fn actor(user: &CurrentUser) -> Actor {
    Actor {
        user_id: user.id,
        is_staff: user.is_staff,
    }
}

/// PUT /api/comments/{id}
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<CommentInput>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let comment = state
        .comment_service()
        .edit(actor(&user), id, input)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// DELETE /api/comments/{id}
/// Authors remove their own comments, staff moderate the rest.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CommentRemovedDto>>, ApiError> {
    let status = state.comment_service().delete(actor(&user), id).await?;
    Ok(Json(ApiResponse::success(CommentRemovedDto { id, status })))
}
