//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;

use crate::db::{Comment, NewComment, Store};
use crate::domain::{AnimeId, CommentStatus};
use crate::services::comment_service::{
    Actor, CommentError, CommentInput, CommentService, validate_comment,
};

pub struct SeaOrmCommentService {
    store: Store,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn visible(&self, comment_id: i32) -> Result<Comment, CommentError> {
        self.store
            .get_comment(comment_id)
            .await?
            .filter(|c| c.status.is_visible())
            .ok_or(CommentError::NotFound(comment_id))
    }
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn list_for_anime(&self, anime_id: AnimeId) -> Result<Vec<Comment>, CommentError> {
        Ok(self.store.list_comments_for_anime(anime_id).await?)
    }

    async fn create(
        &self,
        actor: Actor,
        anime_id: AnimeId,
        input: CommentInput,
    ) -> Result<Comment, CommentError> {
        if !anime_id.is_valid() {
            return Err(CommentError::Validation("Invalid anime id".to_string()));
        }

        let text = validate_comment(&input.text, input.rating)?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .store
                .get_comment(parent_id)
                .await?
                .filter(|p| p.status.is_visible() && p.anime_id == anime_id);
            if parent.is_none() {
                return Err(CommentError::Validation(format!(
                    "Parent comment {parent_id} does not exist on this anime"
                )));
            }
        }

        let comment = self
            .store
            .create_comment(NewComment {
                anime_id,
                user_id: actor.user_id,
                parent_id: input.parent_id,
                text,
                rating: input.rating,
            })
            .await?;

        tracing::info!(
            comment_id = comment.id,
            anime_id = %anime_id,
            user_id = actor.user_id,
            "Comment created"
        );
        Ok(comment)
    }

    async fn edit(
        &self,
        actor: Actor,
        comment_id: i32,
        input: CommentInput,
    ) -> Result<Comment, CommentError> {
        let comment = self.visible(comment_id).await?;
        if comment.user_id != actor.user_id {
            return Err(CommentError::Forbidden(comment_id));
        }

        let text = validate_comment(&input.text, input.rating)?;
        self.store
            .update_comment_text(comment_id, text, input.rating)
            .await?;

        self.visible(comment_id).await
    }

    async fn delete(&self, actor: Actor, comment_id: i32) -> Result<CommentStatus, CommentError> {
        let comment = self.visible(comment_id).await?;

        let status = if comment.user_id == actor.user_id {
            CommentStatus::RemovedByAuthor
        } else if actor.is_staff {
            CommentStatus::RemovedByModerator
        } else {
            return Err(CommentError::Forbidden(comment_id));
        };

        self.store.set_comment_status(comment_id, status).await?;
        tracing::info!(comment_id, status = %status, "Comment removed");

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;

    struct Fixture {
        comments: SeaOrmCommentService,
        author: Actor,
        other: Actor,
        staff: Actor,
    }

    async fn fixture() -> Fixture {
        let path = std::env::temp_dir().join(format!(
            "animecalendar-comments-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            min_password_length: 8,
        };

        let author = store
            .create_user("author", "password-1", false, &security)
            .await
            .unwrap();
        let other = store
            .create_user("other", "password-2", false, &security)
            .await
            .unwrap();
        let staff = store
            .create_user("moderator", "password-3", true, &security)
            .await
            .unwrap();

        Fixture {
            comments: SeaOrmCommentService::new(store),
            author: Actor {
                user_id: author.id,
                is_staff: false,
            },
            other: Actor {
                user_id: other.id,
                is_staff: false,
            },
            staff: Actor {
                user_id: staff.id,
                is_staff: true,
            },
        }
    }

    fn input(text: &str) -> CommentInput {
        CommentInput {
            text: text.to_string(),
            rating: Some(8),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let f = fixture().await;
        let anime = AnimeId::new(21);

        let created = f
            .comments
            .create(f.author, anime, input("  One Piece is peak  "))
            .await
            .unwrap();
        assert_eq!(created.text, "One Piece is peak");
        assert_eq!(created.username, "author");
        assert_eq!(created.rating, Some(8));

        let listed = f.comments.list_for_anime(anime).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(f.comments.list_for_anime(AnimeId::new(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_requires_parent_on_same_anime() {
        let f = fixture().await;
        let parent = f
            .comments
            .create(f.author, AnimeId::new(21), input("top level comment"))
            .await
            .unwrap();

        let reply = CommentInput {
            parent_id: Some(parent.id),
            ..input("agreed, great arc")
        };
        let created = f
            .comments
            .create(f.other, AnimeId::new(21), reply.clone())
            .await
            .unwrap();
        assert_eq!(created.parent_id, Some(parent.id));

        let wrong_anime = f.comments.create(f.other, AnimeId::new(22), reply).await;
        assert!(matches!(wrong_anime, Err(CommentError::Validation(_))));
    }

    #[tokio::test]
    async fn only_author_edits() {
        let f = fixture().await;
        let comment = f
            .comments
            .create(f.author, AnimeId::new(5), input("first thoughts"))
            .await
            .unwrap();

        let denied = f
            .comments
            .edit(f.other, comment.id, input("hijacked text"))
            .await;
        assert!(matches!(denied, Err(CommentError::Forbidden(_))));

        let edited = f
            .comments
            .edit(f.author, comment.id, input("second thoughts"))
            .await
            .unwrap();
        assert_eq!(edited.text, "second thoughts");
        assert!(edited.edited);
    }

    #[tokio::test]
    async fn delete_sets_status_by_role() {
        let f = fixture().await;
        let anime = AnimeId::new(9);
        let mine = f
            .comments
            .create(f.author, anime, input("my own comment"))
            .await
            .unwrap();
        let theirs = f
            .comments
            .create(f.other, anime, input("spam spam spam"))
            .await
            .unwrap();

        assert!(matches!(
            f.comments.delete(f.author, theirs.id).await,
            Err(CommentError::Forbidden(_))
        ));
        assert_eq!(
            f.comments.delete(f.author, mine.id).await.unwrap(),
            CommentStatus::RemovedByAuthor
        );
        assert_eq!(
            f.comments.delete(f.staff, theirs.id).await.unwrap(),
            CommentStatus::RemovedByModerator
        );

        assert!(f.comments.list_for_anime(anime).await.unwrap().is_empty());
        assert!(matches!(
            f.comments.delete(f.staff, mine.id).await,
            Err(CommentError::NotFound(_))
        ));
    }
}
