use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;

use crate::domain::AnimeId;
use crate::entities::favorites;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub anime_id: AnimeId,
    pub created_at: String,
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            anime_id: AnimeId::new(model.anime_id),
            created_at: model.created_at,
        }
    }
}

pub struct FavoriteRepository {
    conn: DatabaseConnection,
}

impl FavoriteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn is_favorited(&self, user_id: i32, anime_id: AnimeId) -> Result<bool> {
        let count = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::AnimeId.eq(anime_id.value()))
            .count(&self.conn)
            .await
            .context("Failed to check favorite")?;

        Ok(count > 0)
    }

    /// Adds the favorite; a second add for the same pair is a no-op.
    pub async fn add(&self, user_id: i32, anime_id: AnimeId) -> Result<()> {
        let model = favorites::ActiveModel {
            user_id: Set(user_id),
            anime_id: Set(anime_id.value()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        favorites::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([favorites::Column::UserId, favorites::Column::AnimeId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.conn)
            .await
            .context("Failed to add favorite")?;

        Ok(())
    }

    pub async fn remove(&self, user_id: i32, anime_id: AnimeId) -> Result<bool> {
        let result = favorites::Entity::delete_many()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::AnimeId.eq(anime_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to remove favorite")?;

        Ok(result.rows_affected > 0)
    }

    /// Flips the favorite state and returns the new one.
    pub async fn toggle(&self, user_id: i32, anime_id: AnimeId) -> Result<bool> {
        if self.remove(user_id, anime_id).await? {
            Ok(false)
        } else {
            self.add(user_id, anime_id).await?;
            Ok(true)
        }
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: i32, limit: Option<u64>) -> Result<Vec<Favorite>> {
        let rows = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .order_by_desc(favorites::Column::CreatedAt)
            .order_by_desc(favorites::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list favorites")?;

        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count favorites")
    }
}
