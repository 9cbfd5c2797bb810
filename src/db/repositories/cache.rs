use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::time::Duration;

use crate::entities::catalog_cache;
use crate::services::catalog_cache::{CacheEntry, CacheStore};

/// Fixed-width timestamps so string comparison in SQL orders them correctly.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Catalog cache kept in the `catalog_cache` table, one row per fingerprint.
pub struct DbCacheStore {
    conn: DatabaseConnection,
}

impl DbCacheStore {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn entry_from_row(row: catalog_cache::Model) -> Result<CacheEntry> {
        let stored_at = DateTime::parse_from_rfc3339(&row.stored_at)
            .with_context(|| format!("Bad stored_at for cache key {}", row.key))?
            .with_timezone(&Utc);

        Ok(CacheEntry {
            payload: serde_json::from_str(&row.payload)?,
            stored_at,
            ttl: Duration::from_secs(u64::try_from(row.ttl_seconds).unwrap_or_default()),
        })
    }
}

#[async_trait]
impl CacheStore for DbCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = catalog_cache::Entity::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .context("Failed to read catalog cache")?;

        row.map(Self::entry_from_row).transpose()
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let model = catalog_cache::ActiveModel {
            key: Set(key.to_string()),
            payload: Set(serde_json::to_string(&entry.payload)?),
            stored_at: Set(timestamp(entry.stored_at)),
            ttl_seconds: Set(i64::try_from(entry.ttl.as_secs()).unwrap_or(i64::MAX)),
            expires_at: Set(timestamp(entry.expires_at())),
        };

        catalog_cache::Entity::insert(model)
            .on_conflict(
                OnConflict::column(catalog_cache::Column::Key)
                    .update_columns([
                        catalog_cache::Column::Payload,
                        catalog_cache::Column::StoredAt,
                        catalog_cache::Column::TtlSeconds,
                        catalog_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to write catalog cache")?;

        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let result = catalog_cache::Entity::delete_many()
            .filter(catalog_cache::Column::Key.is_in(keys.iter().cloned()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<u64> {
        let result = catalog_cache::Entity::delete_many()
            .filter(catalog_cache::Column::Key.starts_with(prefix))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn clear(&self) -> Result<u64> {
        let result = catalog_cache::Entity::delete_many()
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = catalog_cache::Entity::delete_many()
            .filter(catalog_cache::Column::ExpiresAt.lte(timestamp(now)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn entry_count(&self) -> Result<u64> {
        catalog_cache::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count catalog cache rows")
    }
}
