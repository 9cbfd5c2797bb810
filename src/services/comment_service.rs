//! Domain service for anime comments.
//!
//! Comments are threaded (a reply points at a parent on the same anime),
//! carry an optional 1-10 rating and are soft-deleted through their status.

use serde::Deserialize;
use thiserror::Error;

use crate::constants::comments::{MAX_RATING, MAX_TEXT_CHARS, MIN_RATING, MIN_TEXT_CHARS};
use crate::db::Comment;
use crate::domain::{AnimeId, CommentStatus};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment not found: {0}")]
    NotFound(i32),

    #[error("Not allowed to modify comment {0}")]
    Forbidden(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CommentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CommentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The authenticated user acting on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub text: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub parent_id: Option<i32>,
}

/// Trims the text and checks length and rating bounds. Returns the text to store.
pub fn validate_comment(text: &str, rating: Option<i32>) -> Result<String, CommentError> {
    let text = text.trim();
    let len = text.chars().count();

    if len < MIN_TEXT_CHARS {
        return Err(CommentError::Validation(format!(
            "Comment must be at least {MIN_TEXT_CHARS} characters"
        )));
    }
    if len > MAX_TEXT_CHARS {
        return Err(CommentError::Validation(format!(
            "Comment must be at most {MAX_TEXT_CHARS} characters"
        )));
    }
    if let Some(rating) = rating
        && !(MIN_RATING..=MAX_RATING).contains(&rating)
    {
        return Err(CommentError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }

    Ok(text.to_string())
}

#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// Active comments on an anime, newest first.
    async fn list_for_anime(&self, anime_id: AnimeId) -> Result<Vec<Comment>, CommentError>;

    /// Posts a comment or a reply.
    ///
    /// # Errors
    ///
    /// Returns [`CommentError::Validation`] for bad text or rating, or when
    /// the parent is missing, hidden or belongs to another anime.
    async fn create(
        &self,
        actor: Actor,
        anime_id: AnimeId,
        input: CommentInput,
    ) -> Result<Comment, CommentError>;

    /// Replaces text and rating. Only the author may edit.
    async fn edit(
        &self,
        actor: Actor,
        comment_id: i32,
        input: CommentInput,
    ) -> Result<Comment, CommentError>;

    /// Soft-deletes a comment and returns the status it ended up in.
    ///
    /// Authors remove their own comments; staff moderate everyone else's.
    async fn delete(&self, actor: Actor, comment_id: i32) -> Result<CommentStatus, CommentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_trims_and_checks_length() {
        assert_eq!(validate_comment("  great show  ", None).unwrap(), "great show");
        assert!(matches!(
            validate_comment("   abc    ", None),
            Err(CommentError::Validation(_))
        ));
        assert!(validate_comment(&"x".repeat(MAX_TEXT_CHARS), None).is_ok());
        assert!(validate_comment(&"x".repeat(MAX_TEXT_CHARS + 1), None).is_err());
    }

    #[test]
    fn validation_checks_rating_range() {
        assert!(validate_comment("loved it", Some(1)).is_ok());
        assert!(validate_comment("loved it", Some(10)).is_ok());
        assert!(validate_comment("loved it", Some(0)).is_err());
        assert!(validate_comment("loved it", Some(11)).is_err());
    }
}
