use std::sync::Arc;
use std::time::Duration;

use crate::clients::jikan::JikanClient;
use crate::config::{CacheBackend, Config};
use crate::db::Store;
use crate::services::{
    AuthService, CacheLayer, CacheStore, CatalogService, CatalogTtls, CommentService,
    MemoryCacheStore, ProfileService, SeaOrmAuthService, SeaOrmCommentService,
    SeaOrmProfileService,
};

/// Everything the web server and the CLI commands share.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub catalog: Arc<CatalogService>,

    pub auth_service: Arc<dyn AuthService>,

    pub comment_service: Arc<dyn CommentService>,

    pub profile_service: Arc<dyn ProfileService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let jikan = Arc::new(JikanClient::new(
            config.jikan.base_url.clone(),
            Duration::from_secs(config.jikan.timeout_seconds),
        )?);

        let cache_store: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
            CacheBackend::Database => Arc::new(store.catalog_cache_store()),
        };
        tracing::debug!(backend = ?config.cache.backend, "Catalog cache ready");

        let catalog = Arc::new(CatalogService::new(
            jikan,
            CacheLayer::new(cache_store),
            CatalogTtls::from_hours(
                config.cache.catalog_ttl_hours,
                config.cache.detail_ttl_hours,
            ),
        ));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;
        let comment_service =
            Arc::new(SeaOrmCommentService::new(store.clone())) as Arc<dyn CommentService>;
        let profile_service =
            Arc::new(SeaOrmProfileService::new(store.clone())) as Arc<dyn ProfileService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            catalog,
            auth_service,
            comment_service,
            profile_service,
        })
    }
}
