use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{validate_anime_id, validate_limit, validate_page, validate_search_query};
use super::{
    AnimeDetailDto, ApiError, ApiResponse, AppState, CurrentUser, LandingDto, LocalAnimeListDto,
    PageQuery, SearchQuery, auth,
};
use crate::constants::limits::{CAROUSEL_SIZE, MAX_PAGE_SIZE};
use crate::db::Comment;
use crate::models::CatalogEntry;
use crate::services::normalizer::{NormalizeOptions, reshape};
use crate::services::{Actor, CommentInput};

const DEFAULT_LIST_SIZE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn carousel(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    entries
        .into_iter()
        .map(|e| reshape(e, NormalizeOptions::CAROUSEL))
        .collect()
}

/// GET /api/landing
/// Search results when `q` is given, otherwise today's schedule and two carousels.
pub async fn landing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LandingQuery>,
) -> Json<ApiResponse<LandingDto>> {
    let catalog = state.catalog();

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let results = catalog.search(q, MAX_PAGE_SIZE).await;
        return Json(ApiResponse::success(LandingDto {
            query: Some(q.to_string()),
            results: Some(carousel(results)),
            today: None,
            popular: Vec::new(),
            top_rated: Vec::new(),
        }));
    }

    let today = catalog.schedule_for_date(Local::now().date_naive()).await;
    let popular = catalog.popular(CAROUSEL_SIZE, 1).await;
    let top_rated = catalog.top_rated(CAROUSEL_SIZE, 1).await;

    Json(ApiResponse::success(LandingDto {
        query: None,
        results: None,
        today: Some(today),
        popular: carousel(popular),
        top_rated: carousel(top_rated),
    }))
}

/// GET /api/anime/search
pub async fn search_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry>>>, ApiError> {
    let text = validate_search_query(&query.q)?;
    let limit = validate_limit(query.limit, DEFAULT_LIST_SIZE)?;

    let results = state.catalog().search(text, limit).await;
    Ok(Json(ApiResponse::success(results)))
}

/// GET /api/anime/top
pub async fn top_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry>>>, ApiError> {
    let limit = validate_limit(query.limit, DEFAULT_LIST_SIZE)?;
    let page = validate_page(query.page)?;

    let results = state.catalog().top_rated(limit, page).await;
    Ok(Json(ApiResponse::success(results)))
}

/// GET /api/anime/popular
pub async fn popular_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry>>>, ApiError> {
    let limit = validate_limit(query.limit, DEFAULT_LIST_SIZE)?;
    let page = validate_page(query.page)?;

    let results = state.catalog().popular(limit, page).await;
    Ok(Json(ApiResponse::success(results)))
}

/// GET /api/anime/season
pub async fn season_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry>>>, ApiError> {
    let limit = validate_limit(query.limit, MAX_PAGE_SIZE)?;

    let results = state.catalog().season_now(limit).await;
    Ok(Json(ApiResponse::success(results)))
}

/// GET /api/anime/local
/// Snapshots stored by the import command.
pub async fn local_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocalQuery>,
) -> Result<Json<ApiResponse<LocalAnimeListDto>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0);

    let items = state
        .store()
        .list_local_anime(limit, offset)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let total = state
        .store()
        .count_local_anime()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(ApiResponse::success(LocalAnimeListDto { items, total })))
}

/// GET /api/anime/{id}
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    session: Session,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<AnimeDetailDto>>, ApiError> {
    let anime_id = validate_anime_id(id)?;

    let anime = state
        .catalog()
        .get_by_id(anime_id)
        .await
        .ok_or_else(|| ApiError::anime_not_found(id))?;

    let comments = state.comment_service().list_for_anime(anime_id).await?;

    let is_favorited = match auth::resolve_user(&state, &session, &headers).await {
        Some(user) => state
            .store()
            .is_favorited(user.id, anime_id)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?,
        None => false,
    };

    Ok(Json(ApiResponse::success(AnimeDetailDto {
        anime,
        comments,
        is_favorited,
    })))
}

/// GET /api/anime/{id}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let anime_id = validate_anime_id(id)?;
    let comments = state.comment_service().list_for_anime(anime_id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// POST /api/anime/{id}/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<CommentInput>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let anime_id = validate_anime_id(id)?;

    let comment = state
        .comment_service()
        .create(
            Actor {
                user_id: user.id,
                is_staff: user.is_staff,
            },
            anime_id,
            input,
        )
        .await?;

    Ok(Json(ApiResponse::success(comment)))
}
