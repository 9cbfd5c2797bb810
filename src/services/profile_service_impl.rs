//! `SeaORM` implementation of the `ProfileService` trait.

use async_trait::async_trait;

use crate::constants::limits::{RECENT_PROFILE_COMMENTS, RECENT_PROFILE_FAVORITES};
use crate::constants::profiles::{AVATAR_CHOICES, MAX_BIO_CHARS};
use crate::db::{Comment, Favorite, Profile, Store, User};
use crate::services::profile_service::{
    ProfileError, ProfileService, ProfileUpdate, PublicProfile,
};

pub struct SeaOrmProfileService {
    store: Store,
}

impl SeaOrmProfileService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn user(&self, username: &str) -> Result<User, ProfileError> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ProfileError::UserNotFound(username.to_string()))
    }
}

/// Applies the update to a profile, validating what changed.
fn apply_update(mut profile: Profile, update: ProfileUpdate) -> Result<Profile, ProfileError> {
    if let Some(choice) = update.avatar_choice {
        if !AVATAR_CHOICES.contains(&choice.as_str()) {
            return Err(ProfileError::Validation(format!(
                "Unknown avatar choice: {choice}"
            )));
        }
        profile.avatar_choice = choice;
    }

    if let Some(bio) = update.bio {
        let bio = bio.trim().to_string();
        if bio.chars().count() > MAX_BIO_CHARS {
            return Err(ProfileError::Validation(format!(
                "Bio must be at most {MAX_BIO_CHARS} characters"
            )));
        }
        profile.bio = bio;
    }

    // Non-empty paths only; clearing on non-VIP profiles happens on save.
    if let Some(avatar) = update.custom_avatar {
        profile.custom_avatar = Some(avatar).filter(|p| !p.trim().is_empty());
    }
    if let Some(banner) = update.custom_banner {
        profile.custom_banner = Some(banner).filter(|p| !p.trim().is_empty());
    }

    Ok(profile)
}

#[async_trait]
impl ProfileService for SeaOrmProfileService {
    async fn public_profile(&self, username: &str) -> Result<PublicProfile, ProfileError> {
        let user = self.user(username).await?;
        let profile = self.store.get_or_create_profile(user.id).await?;

        let recent_comments = self
            .store
            .list_comments_for_user(user.id, Some(RECENT_PROFILE_COMMENTS))
            .await?;
        let recent_favorites = self
            .store
            .list_favorites(user.id, Some(RECENT_PROFILE_FAVORITES))
            .await?;
        let total_comments = self.store.count_comments_for_user(user.id).await?;
        let total_favorites = self.store.count_favorites(user.id).await?;

        Ok(PublicProfile {
            username: user.username,
            is_staff: user.is_staff,
            joined_at: user.created_at,
            avatar_url: profile.avatar_url(),
            banner_url: profile.banner_url(),
            profile,
            recent_comments,
            recent_favorites,
            total_comments,
            total_favorites,
        })
    }

    async fn comments_of(&self, username: &str) -> Result<Vec<Comment>, ProfileError> {
        let user = self.user(username).await?;
        Ok(self.store.list_comments_for_user(user.id, None).await?)
    }

    async fn favorites_of(&self, username: &str) -> Result<Vec<Favorite>, ProfileError> {
        let user = self.user(username).await?;
        Ok(self.store.list_favorites(user.id, None).await?)
    }

    async fn update(&self, user_id: i32, update: ProfileUpdate) -> Result<Profile, ProfileError> {
        let current = self.store.get_or_create_profile(user_id).await?;
        let updated = apply_update(current, update)?;
        Ok(self.store.save_profile(updated).await?)
    }

    async fn set_vip(&self, username: &str, is_vip: bool) -> Result<Profile, ProfileError> {
        let user = self.user(username).await?;
        let mut profile = self.store.get_or_create_profile(user.id).await?;
        profile.is_vip = is_vip;

        let saved = self.store.save_profile(profile).await?;
        tracing::info!(username, is_vip, "VIP status changed");
        Ok(saved)
    }
}
