use serde::{Deserialize, Serialize};

use crate::db::{Comment, LocalAnime};
use crate::domain::AnimeId;
use crate::models::{CatalogEntry, ScheduleDay};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// The authenticated caller, attached to the request by the auth middleware.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LandingDto {
    /// Present when the landing page was asked to search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CatalogEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<ScheduleDay>,
    pub popular: Vec<CatalogEntry>,
    pub top_rated: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct AnimeDetailDto {
    pub anime: CatalogEntry,
    pub comments: Vec<Comment>,
    pub is_favorited: bool,
}

#[derive(Debug, Serialize)]
pub struct LocalAnimeListDto {
    pub items: Vec<LocalAnime>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggleDto {
    pub anime_id: AnimeId,
    pub is_favorited: bool,
}

/// A favorite with the catalog record when upstream could provide it.
#[derive(Debug, Serialize)]
pub struct FavoriteDto {
    pub anime_id: AnimeId,
    pub created_at: String,
    pub anime: Option<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct CacheClearedDto {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub cache_backend: String,
    pub cache_entries: u64,
    pub users: u64,
    pub local_anime: u64,
}
