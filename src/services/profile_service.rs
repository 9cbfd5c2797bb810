//! Domain service for public user profiles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Comment, Favorite, Profile};

/// Errors specific to profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProfileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Everything shown on a user's public page.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub username: String,
    pub is_staff: bool,
    pub joined_at: String,
    pub profile: Profile,
    pub avatar_url: String,
    pub banner_url: Option<String>,
    pub recent_comments: Vec<Comment>,
    pub recent_favorites: Vec<Favorite>,
    pub total_comments: u64,
    pub total_favorites: u64,
}

/// Fields a user may change on their own profile. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub avatar_choice: Option<String>,
    pub bio: Option<String>,
    pub custom_avatar: Option<String>,
    pub custom_banner: Option<String>,
}

#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// Gets the public page of a user.
    async fn public_profile(&self, username: &str) -> Result<PublicProfile, ProfileError>;

    /// All active comments written by a user, newest first.
    async fn comments_of(&self, username: &str) -> Result<Vec<Comment>, ProfileError>;

    /// All favorites of a user, newest first.
    async fn favorites_of(&self, username: &str) -> Result<Vec<Favorite>, ProfileError>;

    /// Applies an update to the user's own profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Validation`] for an unknown avatar choice or
    /// an overlong bio.
    async fn update(&self, user_id: i32, update: ProfileUpdate) -> Result<Profile, ProfileError>;

    /// Grants or revokes VIP. Revoking clears the custom images.
    async fn set_vip(&self, username: &str, is_vip: bool) -> Result<Profile, ProfileError>;
}
