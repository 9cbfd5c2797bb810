//! Query façade over the remote catalog.
//!
//! Everything outside this module asks [`CatalogService`] for catalog data.
//! Upstream failures never escape: they turn into `None`, an empty list or an
//! empty [`ScheduleDay`], and get logged by the cache layer.

use crate::clients::jikan::{CatalogSource, FetchError, QueryParams};
use crate::constants::limits::{MAX_PAGE_SIZE, SCHEDULE_PAGE_SIZE};
use crate::domain::{AnimeId, Weekday};
use crate::models::{CatalogEntry, ScheduleDay};
use crate::services::catalog_cache::{CacheLayer, Fingerprint, Namespace};
use crate::services::normalizer::{NormalizeOptions, normalize_list, normalize_single};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogTtls {
    /// Listings: search, top, popular, schedule, season.
    pub catalog: Duration,
    /// Single-anime lookups.
    pub detail: Duration,
}

impl CatalogTtls {
    #[must_use]
    pub const fn from_hours(catalog: u64, detail: u64) -> Self {
        Self {
            catalog: Duration::from_secs(catalog.saturating_mul(3600)),
            detail: Duration::from_secs(detail.saturating_mul(3600)),
        }
    }
}

impl Default for CatalogTtls {
    fn default() -> Self {
        use crate::constants::cache::{CATALOG_TTL_HOURS, DETAIL_TTL_HOURS};
        Self::from_hours(CATALOG_TTL_HOURS, DETAIL_TTL_HOURS)
    }
}

#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    cache: CacheLayer,
    ttls: CatalogTtls,
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

fn schedule_request(weekday: Weekday) -> (&'static str, QueryParams) {
    let params = QueryParams::new()
        .with("filter", weekday.as_str())
        .with("limit", SCHEDULE_PAGE_SIZE)
        .with("page", 1u32);
    ("/schedules", params)
}

impl CatalogService {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, cache: CacheLayer, ttls: CatalogTtls) -> Self {
        Self {
            source,
            cache,
            ttls,
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    async fn cached_list(
        &self,
        namespace: Namespace,
        endpoint: &str,
        params: QueryParams,
    ) -> Vec<CatalogEntry> {
        let fingerprint = Fingerprint::new(namespace, endpoint, &params);
        let source = &self.source;
        let params = &params;

        self.cache
            .get_or_fetch(&fingerprint, self.ttls.catalog, || async move {
                let payload = source.fetch(endpoint, params).await?;
                Ok(normalize_list(&payload, NormalizeOptions::LISTING))
            })
            .await
            .unwrap_or_default()
    }

    /// Full record for one anime. `None` when upstream does not know the id
    /// or cannot be reached.
    pub async fn get_by_id(&self, id: AnimeId) -> Option<CatalogEntry> {
        if !id.is_valid() {
            return None;
        }

        let endpoint = format!("/anime/{id}/full");
        let params = QueryParams::new();
        let fingerprint = Fingerprint::new(Namespace::Anime, &endpoint, &params);
        let source = &self.source;
        let endpoint = endpoint.as_str();
        let params = &params;

        self.cache
            .get_or_fetch(&fingerprint, self.ttls.detail, || async move {
                let payload = source.fetch(endpoint, params).await?;
                normalize_single(&payload, NormalizeOptions::DETAIL)
                    .map_err(|skip| FetchError::MalformedResponse(skip.to_string()))
            })
            .await
    }

    /// Free-text search. Blank text returns nothing without asking upstream.
    pub async fn search(&self, text: &str, limit: u32) -> Vec<CatalogEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let params = QueryParams::new()
            .with("q", text)
            .with("limit", clamp_limit(limit));
        self.cached_list(Namespace::Search, "/anime", params).await
    }

    pub async fn top_rated(&self, limit: u32, page: u32) -> Vec<CatalogEntry> {
        let params = QueryParams::new()
            .with("limit", clamp_limit(limit))
            .with("page", page.max(1));
        self.cached_list(Namespace::Top, "/top/anime", params).await
    }

    pub async fn popular(&self, limit: u32, page: u32) -> Vec<CatalogEntry> {
        let params = QueryParams::new()
            .with("filter", "bypopularity")
            .with("limit", clamp_limit(limit))
            .with("page", page.max(1));
        self.cached_list(Namespace::Popular, "/top/anime", params).await
    }

    /// Current season, upstream order.
    pub async fn season_now(&self, limit: u32) -> Vec<CatalogEntry> {
        let params = QueryParams::new().with("limit", clamp_limit(limit));
        self.cached_list(Namespace::Season, "/seasons/now", params).await
    }

    pub async fn schedule(&self, weekday: Weekday) -> ScheduleDay {
        let (endpoint, params) = schedule_request(weekday);
        let entries = self.cached_list(Namespace::Schedule, endpoint, params).await;
        ScheduleDay { weekday, entries }
    }

    pub async fn schedule_for_date(&self, date: NaiveDate) -> ScheduleDay {
        self.schedule(Weekday::from_date(date)).await
    }

    /// Monday through Sunday. Days are fetched one after another to stay
    /// under the upstream rate limit.
    pub async fn week_schedule(&self) -> Vec<ScheduleDay> {
        let mut week = Vec::with_capacity(Weekday::ALL.len());
        for weekday in Weekday::ALL {
            week.push(self.schedule(weekday).await);
        }
        week
    }

    /// Drops the seven weekday schedules so the next request refetches them.
    pub async fn clear_schedule_cache(&self) -> u64 {
        let fingerprints: Vec<Fingerprint> = Weekday::ALL
            .into_iter()
            .map(|weekday| {
                let (endpoint, params) = schedule_request(weekday);
                Fingerprint::new(Namespace::Schedule, endpoint, &params)
            })
            .collect();

        let removed = self.cache.invalidate(&fingerprints).await;
        info!(removed, "Cleared schedule cache");
        removed
    }

    pub async fn clear_namespace(&self, namespace: Namespace) -> u64 {
        let removed = self.cache.invalidate_namespace(namespace).await;
        info!(namespace = namespace.as_str(), removed, "Cleared catalog cache namespace");
        removed
    }

    pub async fn clear_all(&self) -> u64 {
        let removed = self.cache.clear().await;
        info!(removed, "Cleared catalog cache");
        removed
    }

    /// One page of the highest scored anime, straight from upstream.
    ///
    /// Used for bulk imports, so errors are returned instead of swallowed and
    /// nothing is cached.
    pub async fn discover_top_scored(
        &self,
        page: u32,
        min_score: f64,
    ) -> Result<Vec<CatalogEntry>, FetchError> {
        let params = QueryParams::new()
            .with("order_by", "score")
            .with("sort", "desc")
            .with("min_score", min_score)
            .with("limit", MAX_PAGE_SIZE)
            .with("page", page.max(1));

        debug!(page, min_score, "Discovering top scored anime");
        let payload = self.source.fetch("/anime", &params).await?;
        Ok(normalize_list(&payload, NormalizeOptions::DETAIL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AiringStatus;
    use crate::services::catalog_cache::{ManualClock, MemoryCacheStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned responses keyed by endpoint, recording every call.
    #[derive(Default)]
    struct FakeSource {
        responses: HashMap<String, Result<Value, FetchError>>,
        calls: Mutex<Vec<(String, QueryParams)>>,
    }

    impl FakeSource {
        fn respond(mut self, endpoint: &str, response: Result<Value, FetchError>) -> Self {
            self.responses.insert(endpoint.to_string(), response);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last_params(&self) -> QueryParams {
            self.calls.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), params.clone()));
            self.responses
                .get(endpoint)
                .cloned()
                .unwrap_or(Err(FetchError::UpstreamError { status: 404 }))
        }
    }

    fn build(source: FakeSource) -> (CatalogService, Arc<FakeSource>, Arc<ManualClock>) {
        let source = Arc::new(source);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = CacheLayer::with_clock(Arc::new(MemoryCacheStore::new()), clock.clone());
        let service = CatalogService::new(source.clone(), cache, CatalogTtls::default());
        (service, source, clock)
    }

    fn example_payload() -> Value {
        json!({"data": [{
            "mal_id": 1,
            "title": "Example",
            "score": 8.1,
            "images": {"jpg": {"image_url": "http://x/img.jpg"}},
            "genres": [{"name": "Action"}]
        }]})
    }

    #[tokio::test]
    async fn top_rated_scenario() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/top/anime", Ok(example_payload())));

        let first = service.top_rated(1, 1).await;
        assert_eq!(first.len(), 1);
        let entry = &first[0];
        assert_eq!(entry.id, AnimeId::new(1));
        assert_eq!(entry.title, "Example");
        assert_eq!(entry.score, Some(8.1));
        assert_eq!(entry.image_url, "http://x/img.jpg");
        assert_eq!(entry.genres, vec!["Action"]);

        let second = service.top_rated(1, 1).await;
        assert_eq!(second, first);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn cached_listing_expires_after_ttl() {
        let (service, source, clock) =
            build(FakeSource::default().respond("/top/anime", Ok(example_payload())));

        service.top_rated(1, 1).await;
        clock.advance(Duration::from_secs(4 * 3600));
        service.top_rated(1, 1).await;

        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn blank_search_skips_network() {
        let (service, source, _clock) = build(FakeSource::default());

        assert!(service.search("   ", 10).await.is_empty());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn search_failure_is_empty_and_uncached() {
        let (service, source, _clock) = build(
            FakeSource::default().respond("/anime", Err(FetchError::UpstreamError { status: 500 })),
        );

        assert!(service.search("naruto", 10).await.is_empty());
        assert!(service.search("naruto", 10).await.is_empty());

        assert_eq!(source.call_count(), 2);
        assert_eq!(service.cache().entry_count().await, 0);
    }

    #[tokio::test]
    async fn search_trims_text_and_clamps_limit() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/anime", Ok(json!({"data": []}))));

        service.search("  naruto ", 100).await;

        let params = source.last_params();
        let pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "25".to_string()),
                ("q".to_string(), "naruto".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn popular_and_top_do_not_share_entries() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/top/anime", Ok(example_payload())));

        service.top_rated(10, 1).await;
        service.popular(10, 1).await;

        assert_eq!(source.call_count(), 2);
        let filter = source
            .last_params()
            .iter()
            .find(|(k, _)| *k == "filter")
            .map(|(_, v)| v.to_string());
        assert_eq!(filter.as_deref(), Some("bypopularity"));
    }

    #[tokio::test]
    async fn get_by_id_uses_detail_shape() {
        let synopsis = "s".repeat(300);
        let (service, _source, _clock) = build(FakeSource::default().respond(
            "/anime/5114/full",
            Ok(json!({"data": {
                "mal_id": 5114,
                "title": "Fullmetal Alchemist: Brotherhood",
                "status": "Finished Airing",
                "synopsis": synopsis
            }})),
        ));

        let entry = service.get_by_id(AnimeId::new(5114)).await.unwrap();
        assert_eq!(entry.synopsis.len(), 300);
        assert_eq!(entry.status, AiringStatus::Finished);
    }

    #[tokio::test]
    async fn unknown_id_is_none_and_retried() {
        let (service, source, _clock) = build(FakeSource::default());

        assert!(service.get_by_id(AnimeId::new(999)).await.is_none());
        assert!(service.get_by_id(AnimeId::new(999)).await.is_none());
        assert!(service.get_by_id(AnimeId::new(0)).await.is_none());

        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn null_detail_payload_is_none() {
        let (service, _source, _clock) =
            build(FakeSource::default().respond("/anime/3/full", Ok(json!({"data": null}))));

        assert!(service.get_by_id(AnimeId::new(3)).await.is_none());
        assert_eq!(service.cache().entry_count().await, 0);
    }

    #[tokio::test]
    async fn detail_without_id_is_none_and_uncached() {
        let (service, _source, _clock) = build(FakeSource::default().respond(
            "/anime/12/full",
            Ok(json!({"data": {"title": "Missing id"}})),
        ));

        assert!(service.get_by_id(AnimeId::new(12)).await.is_none());
        assert_eq!(service.cache().entry_count().await, 0);
    }

    #[tokio::test]
    async fn listing_drops_entries_without_id() {
        let (service, _source, _clock) = build(FakeSource::default().respond(
            "/seasons/now",
            Ok(json!({"data": [{"title": "No id"}, {"mal_id": 0}, {"mal_id": 21}]})),
        ));

        let entries = service.season_now(10).await;
        let ids: Vec<AnimeId> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![AnimeId::new(21)]);
    }

    #[test]
    fn huge_ttl_hours_saturate() {
        let ttls = CatalogTtls::from_hours(u64::MAX, 2);
        assert_eq!(ttls.catalog, Duration::from_secs(u64::MAX));
        assert_eq!(ttls.detail, Duration::from_secs(7200));
    }

    #[tokio::test]
    async fn schedule_requests_weekday_page() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/schedules", Ok(example_payload())));

        let day = service.schedule(Weekday::Friday).await;
        assert_eq!(day.weekday, Weekday::Friday);
        assert_eq!(day.entries.len(), 1);

        let params: Vec<(String, String)> = source
            .last_params()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("filter".to_string(), "friday".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn schedule_failure_is_empty_day() {
        let (service, _source, _clock) = build(
            FakeSource::default().respond("/schedules", Err(FetchError::Timeout)),
        );

        let day = service
            .schedule_for_date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
            .await;
        assert_eq!(day, ScheduleDay::empty(Weekday::Wednesday));
    }

    #[tokio::test]
    async fn week_schedule_and_clear() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/schedules", Ok(example_payload())));

        let week = service.week_schedule().await;
        let days: Vec<Weekday> = week.iter().map(|d| d.weekday).collect();
        assert_eq!(days, Weekday::ALL.to_vec());
        assert_eq!(source.call_count(), 7);

        service.week_schedule().await;
        assert_eq!(source.call_count(), 7);

        assert_eq!(service.clear_schedule_cache().await, 7);
        service.schedule(Weekday::Monday).await;
        assert_eq!(source.call_count(), 8);
    }

    #[tokio::test]
    async fn clear_all_empties_cache() {
        let (service, _source, _clock) = build(
            FakeSource::default()
                .respond("/top/anime", Ok(example_payload()))
                .respond("/seasons/now", Ok(example_payload())),
        );

        service.top_rated(5, 1).await;
        service.season_now(5).await;

        assert_eq!(service.clear_all().await, 2);
        assert_eq!(service.cache().entry_count().await, 0);
    }

    #[tokio::test]
    async fn clear_namespace_keeps_other_listings() {
        let (service, source, _clock) = build(
            FakeSource::default()
                .respond("/top/anime", Ok(example_payload()))
                .respond("/seasons/now", Ok(example_payload())),
        );

        service.top_rated(5, 1).await;
        service.top_rated(5, 2).await;
        service.season_now(5).await;

        assert_eq!(service.clear_namespace(Namespace::Top).await, 2);
        assert_eq!(service.cache().entry_count().await, 1);

        service.season_now(5).await;
        assert_eq!(source.call_count(), 3);
        service.top_rated(5, 1).await;
        assert_eq!(source.call_count(), 4);
    }

    #[tokio::test]
    async fn discovery_is_uncached_and_reports_errors() {
        let (service, source, _clock) =
            build(FakeSource::default().respond("/anime", Ok(example_payload())));

        assert_eq!(service.discover_top_scored(1, 6.5).await.unwrap().len(), 1);
        assert_eq!(service.discover_top_scored(1, 6.5).await.unwrap().len(), 1);
        assert_eq!(source.call_count(), 2);
        assert_eq!(service.cache().entry_count().await, 0);

        let (failing, _source, _clock) = build(
            FakeSource::default().respond("/anime", Err(FetchError::Timeout)),
        );
        assert_eq!(
            failing.discover_top_scored(1, 6.5).await,
            Err(FetchError::Timeout)
        );
    }
}
