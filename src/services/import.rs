//! Bulk import of top scored catalog records into the `local_anime` table.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::Store;
use crate::services::catalog::CatalogService;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Stop after this many new rows.
    pub limit: usize,
    pub min_score: f64,
    /// Pause after every inserted record. Pages wait twice as long.
    pub delay: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            limit: 25,
            min_score: 6.5,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pages: u32,
    /// Set when an upstream failure ended the run early.
    pub aborted: Option<String>,
}

/// Walks the score-ordered catalog page by page, storing records not seen before.
pub async fn import_top_scored(
    catalog: &CatalogService,
    store: &Store,
    options: &ImportOptions,
) -> ImportReport {
    let mut report = ImportReport::default();
    let mut page = 1;

    'pages: while report.imported < options.limit {
        let entries = match catalog.discover_top_scored(page, options.min_score).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(page, error = %e, "Import stopped by upstream failure");
                report.aborted = Some(e.to_string());
                break;
            }
        };
        report.pages = page;

        if entries.is_empty() {
            break;
        }

        for entry in entries {
            if report.imported >= options.limit {
                break 'pages;
            }

            match store.insert_local_anime(&entry).await {
                Ok(true) => {
                    info!(id = %entry.id, title = %entry.title, "Imported");
                    report.imported += 1;
                    tokio::time::sleep(options.delay).await;
                }
                Ok(false) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "Failed to import");
                    report.failed += 1;
                }
            }
        }

        page += 1;
        tokio::time::sleep(options.delay * 2).await;
    }

    info!(
        imported = report.imported,
        skipped = report.skipped,
        failed = report.failed,
        "Import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::jikan::{CatalogSource, FetchError, ParamValue, QueryParams};
    use crate::services::catalog::CatalogTtls;
    use crate::services::catalog_cache::{CacheLayer, MemoryCacheStore};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;

    /// Two pages of three records, then an empty page.
    struct PagedSource;

    #[async_trait]
    impl CatalogSource for PagedSource {
        async fn fetch(&self, _endpoint: &str, params: &QueryParams) -> Result<Value, FetchError> {
            let page = params
                .iter()
                .find(|(k, _)| *k == "page")
                .map(|(_, v)| v.clone());
            let start = match page {
                Some(ParamValue::Integer(1)) => 1,
                Some(ParamValue::Integer(2)) => 4,
                _ => return Ok(json!({ "data": [] })),
            };
            let data: Vec<Value> = (start..start + 3)
                .map(|id| json!({ "mal_id": id, "title": format!("Show {id}"), "score": 8.0 }))
                .collect();
            Ok(json!({ "data": data }))
        }
    }

    async fn setup() -> (CatalogService, Store) {
        let path = std::env::temp_dir().join(format!(
            "animecalendar-import-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        let catalog = CatalogService::new(
            Arc::new(PagedSource),
            CacheLayer::new(Arc::new(MemoryCacheStore::new())),
            CatalogTtls::default(),
        );
        (catalog, store)
    }

    fn quick(limit: usize) -> ImportOptions {
        ImportOptions {
            limit,
            delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stops_at_limit() {
        let (catalog, store) = setup().await;

        let report = import_top_scored(&catalog, &store, &quick(4)).await;
        assert_eq!(report.imported, 4);
        assert_eq!(report.pages, 2);
        assert_eq!(store.count_local_anime().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn skips_existing_and_ends_on_empty_page() {
        let (catalog, store) = setup().await;
        import_top_scored(&catalog, &store, &quick(2)).await;

        let report = import_top_scored(&catalog, &store, &quick(100)).await;
        assert_eq!(report.imported, 4);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.aborted, None);
        assert_eq!(store.count_local_anime().await.unwrap(), 6);
    }
}
