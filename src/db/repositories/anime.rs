use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TryInsertResult,
};
use serde::Serialize;

use crate::entities::local_anime;
use crate::models::CatalogEntry;

/// An imported catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAnime {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub synopsis: String,
    pub image_url: String,
    pub score: Option<f64>,
    pub episodes: Option<i32>,
    pub kind: Option<String>,
    pub status: String,
    pub genres: Vec<String>,
    pub imported_at: String,
}

impl From<local_anime::Model> for LocalAnime {
    fn from(model: local_anime::Model) -> Self {
        Self {
            mal_id: model.mal_id,
            title: model.title,
            title_english: model.title_english,
            synopsis: model.synopsis,
            image_url: model.image_url,
            score: model.score,
            episodes: model.episodes,
            kind: model.kind,
            status: model.status,
            genres: model
                .genres
                .split(',')
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect(),
            imported_at: model.imported_at,
        }
    }
}

pub struct LocalAnimeRepository {
    conn: DatabaseConnection,
}

impl LocalAnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, mal_id: i32) -> Result<bool> {
        let count = local_anime::Entity::find()
            .filter(local_anime::Column::MalId.eq(mal_id))
            .count(&self.conn)
            .await
            .context("Failed to check local anime")?;

        Ok(count > 0)
    }

    /// Stores a snapshot unless one already exists for the id. Returns
    /// whether a row was written.
    pub async fn insert_snapshot(&self, entry: &CatalogEntry) -> Result<bool> {
        let model = local_anime::ActiveModel {
            mal_id: Set(entry.id.value()),
            title: Set(entry.title.clone()),
            title_english: Set(entry.title_english.clone()),
            synopsis: Set(entry.synopsis.clone()),
            image_url: Set(entry.image_url.clone()),
            score: Set(entry.score),
            episodes: Set(entry.episodes),
            kind: Set(entry.kind.clone()),
            status: Set(entry.status.as_str().to_string()),
            genres: Set(entry
                .genres
                .iter()
                .map(|g| g.to_lowercase())
                .collect::<Vec<_>>()
                .join(",")),
            imported_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = local_anime::Entity::insert(model)
            .on_conflict(
                OnConflict::column(local_anime::Column::MalId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.conn)
            .await
            .context("Failed to insert local anime")?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    /// Best scored first.
    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<LocalAnime>> {
        let rows = local_anime::Entity::find()
            .order_by_desc(local_anime::Column::Score)
            .order_by_asc(local_anime::Column::Title)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list local anime")?;

        Ok(rows.into_iter().map(LocalAnime::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        local_anime::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count local anime")
    }
}
