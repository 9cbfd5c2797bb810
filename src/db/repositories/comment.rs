use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

use crate::domain::{AnimeId, CommentStatus};
use crate::entities::{comments, users};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i32,
    pub anime_id: AnimeId,
    pub user_id: i32,
    pub username: String,
    pub parent_id: Option<i32>,
    pub text: String,
    pub rating: Option<i32>,
    pub status: CommentStatus,
    pub edited: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Comment {
    fn from_row(model: comments::Model, user: Option<users::Model>) -> Self {
        Self {
            id: model.id,
            anime_id: AnimeId::new(model.anime_id),
            user_id: model.user_id,
            username: user.map(|u| u.username).unwrap_or_default(),
            parent_id: model.parent_id,
            text: model.text,
            rating: model.rating,
            // Unknown values can only come from manual edits; hide them.
            status: model
                .status
                .parse()
                .unwrap_or(CommentStatus::RemovedByModerator),
            edited: model.edited,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub anime_id: AnimeId,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub text: String,
    pub rating: Option<i32>,
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, comment: NewComment) -> Result<Comment> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = comments::ActiveModel {
            anime_id: Set(comment.anime_id.value()),
            user_id: Set(comment.user_id),
            parent_id: Set(comment.parent_id),
            text: Set(comment.text),
            rating: Set(comment.rating),
            status: Set(CommentStatus::Active.as_str().to_string()),
            edited: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert comment")?;

        self.get(model.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment {} vanished after insert", model.id))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Comment>> {
        let row = comments::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query comment")?;

        Ok(row.map(|(comment, user)| Comment::from_row(comment, user)))
    }

    /// Active comments on an anime, newest first.
    pub async fn list_for_anime(&self, anime_id: AnimeId) -> Result<Vec<Comment>> {
        let rows = comments::Entity::find()
            .filter(comments::Column::AnimeId.eq(anime_id.value()))
            .filter(comments::Column::Status.eq(CommentStatus::Active.as_str()))
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list comments for anime")?;

        Ok(rows
            .into_iter()
            .map(|(comment, user)| Comment::from_row(comment, user))
            .collect())
    }

    /// Active comments written by a user, newest first.
    pub async fn list_for_user(&self, user_id: i32, limit: Option<u64>) -> Result<Vec<Comment>> {
        let rows = comments::Entity::find()
            .filter(comments::Column::UserId.eq(user_id))
            .filter(comments::Column::Status.eq(CommentStatus::Active.as_str()))
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list comments for user")?;

        Ok(rows
            .into_iter()
            .map(|(comment, user)| Comment::from_row(comment, user))
            .collect())
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        comments::Entity::find()
            .filter(comments::Column::UserId.eq(user_id))
            .filter(comments::Column::Status.eq(CommentStatus::Active.as_str()))
            .count(&self.conn)
            .await
            .context("Failed to count comments")
    }

    pub async fn update_text(&self, id: i32, text: String, rating: Option<i32>) -> Result<()> {
        let model = comments::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment {id} not found"))?;

        let mut active: comments::ActiveModel = model.into();
        active.text = Set(text);
        active.rating = Set(rating);
        active.edited = Set(true);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_status(&self, id: i32, status: CommentStatus) -> Result<()> {
        let model = comments::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment {id} not found"))?;

        let mut active: comments::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }
}
