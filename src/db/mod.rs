use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{AnimeId, CommentStatus};
use crate::models::CatalogEntry;

pub mod migrator;
pub mod repositories;

pub use repositories::anime::LocalAnime;
pub use repositories::cache::DbCacheStore;
pub use repositories::comment::{Comment, NewComment};
pub use repositories::favorite::Favorite;
pub use repositories::profile::Profile;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn profile_repo(&self) -> repositories::profile::ProfileRepository {
        repositories::profile::ProfileRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    fn favorite_repo(&self) -> repositories::favorite::FavoriteRepository {
        repositories::favorite::FavoriteRepository::new(self.conn.clone())
    }

    fn local_anime_repo(&self) -> repositories::anime::LocalAnimeRepository {
        repositories::anime::LocalAnimeRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn catalog_cache_store(&self) -> DbCacheStore {
        DbCacheStore::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_staff: bool,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, is_staff, config)
            .await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn set_user_staff(&self, username: &str, is_staff: bool) -> Result<()> {
        self.user_repo().set_staff(username, is_staff).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }

    // Profiles

    pub async fn get_or_create_profile(&self, user_id: i32) -> Result<Profile> {
        self.profile_repo().get_or_create(user_id).await
    }

    pub async fn save_profile(&self, profile: Profile) -> Result<Profile> {
        self.profile_repo().save(profile).await
    }

    // Comments

    pub async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        self.comment_repo().create(comment).await
    }

    pub async fn get_comment(&self, id: i32) -> Result<Option<Comment>> {
        self.comment_repo().get(id).await
    }

    pub async fn list_comments_for_anime(&self, anime_id: AnimeId) -> Result<Vec<Comment>> {
        self.comment_repo().list_for_anime(anime_id).await
    }

    pub async fn list_comments_for_user(
        &self,
        user_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<Comment>> {
        self.comment_repo().list_for_user(user_id, limit).await
    }

    pub async fn count_comments_for_user(&self, user_id: i32) -> Result<u64> {
        self.comment_repo().count_for_user(user_id).await
    }

    pub async fn update_comment_text(
        &self,
        id: i32,
        text: String,
        rating: Option<i32>,
    ) -> Result<()> {
        self.comment_repo().update_text(id, text, rating).await
    }

    pub async fn set_comment_status(&self, id: i32, status: CommentStatus) -> Result<()> {
        self.comment_repo().set_status(id, status).await
    }

    // Favorites

    pub async fn is_favorited(&self, user_id: i32, anime_id: AnimeId) -> Result<bool> {
        self.favorite_repo().is_favorited(user_id, anime_id).await
    }

    pub async fn toggle_favorite(&self, user_id: i32, anime_id: AnimeId) -> Result<bool> {
        self.favorite_repo().toggle(user_id, anime_id).await
    }

    pub async fn list_favorites(&self, user_id: i32, limit: Option<u64>) -> Result<Vec<Favorite>> {
        self.favorite_repo().list_for_user(user_id, limit).await
    }

    pub async fn count_favorites(&self, user_id: i32) -> Result<u64> {
        self.favorite_repo().count_for_user(user_id).await
    }

    // Imported snapshots

    pub async fn local_anime_exists(&self, mal_id: i32) -> Result<bool> {
        self.local_anime_repo().exists(mal_id).await
    }

    pub async fn insert_local_anime(&self, entry: &CatalogEntry) -> Result<bool> {
        self.local_anime_repo().insert_snapshot(entry).await
    }

    pub async fn list_local_anime(&self, limit: u64, offset: u64) -> Result<Vec<LocalAnime>> {
        self.local_anime_repo().list(limit, offset).await
    }

    pub async fn count_local_anime(&self) -> Result<u64> {
        self.local_anime_repo().count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_cache::{CacheEntry, CacheStore};
    use chrono::Utc;

    async fn temp_store() -> Store {
        let name = format!("animecalendar-db-{}.db", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        Store::new(&format!("sqlite:{}", path.display())).await.unwrap()
    }

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn seeded_admin_is_staff_with_profile() {
        let store = temp_store().await;

        let admin = store.get_user_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_staff);
        assert!(store.verify_user_password("admin", "password").await.unwrap());

        let profile = store.get_or_create_profile(admin.id).await.unwrap();
        assert_eq!(profile.avatar_choice, "avatar_1.jpg");
    }

    #[tokio::test]
    async fn created_user_gets_profile_and_api_key() {
        let store = temp_store().await;
        let user = store
            .create_user("hana", "secret-pass", false, &fast_security())
            .await
            .unwrap();

        assert!(!user.is_staff);
        assert_eq!(
            store.verify_api_key(&user.api_key).await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(store.verify_user_password("hana", "secret-pass").await.unwrap());
        assert!(!store.verify_user_password("hana", "wrong").await.unwrap());

        let profile = store.get_or_create_profile(user.id).await.unwrap();
        assert!(!profile.is_vip);
        assert_eq!(store.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn saving_non_vip_profile_clears_custom_images() {
        let store = temp_store().await;
        let user = store
            .create_user("kei", "secret-pass", false, &fast_security())
            .await
            .unwrap();

        let mut profile = store.get_or_create_profile(user.id).await.unwrap();
        profile.custom_avatar = Some("avatars/custom/kei.png".to_string());
        profile.bio = "hello".to_string();
        let saved = store.save_profile(profile.clone()).await.unwrap();
        assert_eq!(saved.custom_avatar, None);
        assert_eq!(saved.bio, "hello");

        profile.is_vip = true;
        let saved = store.save_profile(profile).await.unwrap();
        assert_eq!(saved.custom_avatar.as_deref(), Some("avatars/custom/kei.png"));
    }

    #[tokio::test]
    async fn favorites_toggle_and_stay_unique() {
        let store = temp_store().await;
        let admin = store.get_user_by_username("admin").await.unwrap().unwrap();
        let anime = AnimeId::new(21);

        assert!(store.toggle_favorite(admin.id, anime).await.unwrap());
        assert!(store.is_favorited(admin.id, anime).await.unwrap());
        assert_eq!(store.count_favorites(admin.id).await.unwrap(), 1);

        assert!(!store.toggle_favorite(admin.id, anime).await.unwrap());
        assert!(!store.is_favorited(admin.id, anime).await.unwrap());
        assert_eq!(store.count_favorites(admin.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn removed_comments_are_hidden_from_listings() {
        let store = temp_store().await;
        let admin = store.get_user_by_username("admin").await.unwrap().unwrap();
        let anime = AnimeId::new(1);

        let kept = store
            .create_comment(NewComment {
                anime_id: anime,
                user_id: admin.id,
                parent_id: None,
                text: "Great show".to_string(),
                rating: Some(9),
            })
            .await
            .unwrap();
        let removed = store
            .create_comment(NewComment {
                anime_id: anime,
                user_id: admin.id,
                parent_id: Some(kept.id),
                text: "Spoilers ahead".to_string(),
                rating: None,
            })
            .await
            .unwrap();
        assert_eq!(kept.username, "admin");
        assert_eq!(removed.parent_id, Some(kept.id));

        store
            .set_comment_status(removed.id, CommentStatus::RemovedByAuthor)
            .await
            .unwrap();

        let listed = store.list_comments_for_anime(anime).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
        assert_eq!(store.count_comments_for_user(admin.id).await.unwrap(), 1);

        let still_there = store.get_comment(removed.id).await.unwrap().unwrap();
        assert_eq!(still_there.status, CommentStatus::RemovedByAuthor);
    }

    #[tokio::test]
    async fn db_cache_store_upserts_and_purges() {
        let store = temp_store().await;
        let cache = store.catalog_cache_store();
        let now = Utc::now();

        let entry = |value: i32, ttl_secs: u64| CacheEntry {
            payload: serde_json::json!([value]),
            stored_at: now,
            ttl: std::time::Duration::from_secs(ttl_secs),
        };

        cache.put("top:/top/anime", entry(1, 3600)).await.unwrap();
        cache.put("top:/top/anime", entry(2, 3600)).await.unwrap();
        cache.put("search:/anime?q=x", entry(3, 60)).await.unwrap();

        let got = cache.get("top:/top/anime").await.unwrap().unwrap();
        assert_eq!(got.payload, serde_json::json!([2]));
        assert_eq!(cache.entry_count().await.unwrap(), 2);

        let purged = cache
            .purge_expired(now + chrono::Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(purged, 1);

        assert_eq!(
            cache.remove(&["top:/top/anime".to_string()]).await.unwrap(),
            1
        );
        assert!(cache.get("top:/top/anime").await.unwrap().is_none());

        cache.put("schedule:/schedules?filter=monday", entry(4, 3600)).await.unwrap();
        cache.put("schedule:/schedules?filter=friday", entry(5, 3600)).await.unwrap();
        cache.put("season:/seasons/now", entry(6, 3600)).await.unwrap();

        assert_eq!(cache.remove_prefix("schedule:").await.unwrap(), 2);
        assert_eq!(cache.entry_count().await.unwrap(), 1);
        assert!(cache.get("season:/seasons/now").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn local_anime_snapshot_is_inserted_once() {
        let store = temp_store().await;
        let entry = crate::services::normalizer::normalize_value(
            &serde_json::json!({
                "mal_id": 5114,
                "title": "Fullmetal Alchemist: Brotherhood",
                "score": 9.1,
                "genres": [{"name": "Action"}, {"name": "Drama"}]
            }),
            crate::services::normalizer::NormalizeOptions::DETAIL,
        )
        .unwrap();

        assert!(store.insert_local_anime(&entry).await.unwrap());
        assert!(!store.insert_local_anime(&entry).await.unwrap());
        assert!(store.local_anime_exists(5114).await.unwrap());

        let listed = store.list_local_anime(10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].genres, vec!["action", "drama"]);
        assert_eq!(store.count_local_anime().await.unwrap(), 1);
    }
}
