use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Serialize;

use crate::constants::profiles::{AVATAR_CHOICES, DEFAULT_AVATAR};
use crate::entities::profiles;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: i32,
    pub avatar_choice: String,
    pub is_vip: bool,
    pub custom_avatar: Option<String>,
    pub custom_banner: Option<String>,
    pub bio: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// VIP custom avatar first, then the chosen built-in avatar, then the default.
    #[must_use]
    pub fn avatar_url(&self) -> String {
        if self.is_vip
            && let Some(custom) = self.custom_avatar.as_deref().filter(|p| !p.is_empty())
        {
            return format!("/static/{}", custom.trim_start_matches('/'));
        }

        let choice = if AVATAR_CHOICES.contains(&self.avatar_choice.as_str()) {
            self.avatar_choice.as_str()
        } else {
            DEFAULT_AVATAR
        };
        format!("/static/avatars/{choice}")
    }

    /// Banners are a VIP feature.
    #[must_use]
    pub fn banner_url(&self) -> Option<String> {
        if !self.is_vip {
            return None;
        }
        self.custom_banner
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("/static/{}", p.trim_start_matches('/')))
    }

    /// Drops VIP-only fields from a non-VIP profile.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.is_vip {
            self.custom_avatar = None;
            self.custom_banner = None;
        }
        self
    }
}

impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Self {
            user_id: model.user_id,
            avatar_choice: model.avatar_choice,
            is_vip: model.is_vip,
            custom_avatar: model.custom_avatar,
            custom_banner: model.custom_banner,
            bio: model.bio,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, user_id: i32) -> Result<Option<Profile>> {
        let row = profiles::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query profile")?;

        Ok(row.map(Profile::from))
    }

    /// Returns the profile, creating a default one for users that predate it.
    pub async fn get_or_create(&self, user_id: i32) -> Result<Profile> {
        if let Some(profile) = self.get(user_id).await? {
            return Ok(profile);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let model = profiles::ActiveModel {
            user_id: Set(user_id),
            avatar_choice: Set(DEFAULT_AVATAR.to_string()),
            is_vip: Set(false),
            custom_avatar: Set(None),
            custom_banner: Set(None),
            bio: Set(String::new()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to create profile")?;

        Ok(Profile::from(model))
    }

    /// Persists the profile. VIP-only fields of non-VIP profiles are cleared
    /// on the way in.
    pub async fn save(&self, profile: Profile) -> Result<Profile> {
        let profile = profile.sanitized();

        let existing = profiles::Entity::find_by_id(profile.user_id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found for user {}", profile.user_id))?;

        let mut active: profiles::ActiveModel = existing.into();
        active.avatar_choice = Set(profile.avatar_choice);
        active.is_vip = Set(profile.is_vip);
        active.custom_avatar = Set(profile.custom_avatar);
        active.custom_banner = Set(profile.custom_banner);
        active.bio = Set(profile.bio);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Profile::from(model))
    }
}
