//! Time-boxed cache in front of the catalog source.
//!
//! Keys are [`Fingerprint`]s derived from the request; values are the
//! normalized results serialized as JSON. A failed fetch is never stored, so
//! the next request retries upstream.

use crate::clients::jikan::{FetchError, QueryParams};
use crate::constants::cache::MEMORY_MAX_ENTRIES;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Anime,
    Search,
    Top,
    Popular,
    Schedule,
    Season,
}

impl Namespace {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Search => "search",
            Self::Top => "top",
            Self::Popular => "popular",
            Self::Schedule => "schedule",
            Self::Season => "season",
        }
    }

    /// Every fingerprint in this namespace starts with this prefix.
    #[must_use]
    pub fn key_prefix(&self) -> String {
        format!("{}:", self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anime" => Ok(Self::Anime),
            "search" => Ok(Self::Search),
            "top" => Ok(Self::Top),
            "popular" => Ok(Self::Popular),
            "schedule" => Ok(Self::Schedule),
            "season" => Ok(Self::Season),
            other => anyhow::bail!("Unknown cache namespace: {other}"),
        }
    }
}

/// Deterministic cache key: `namespace:endpoint?k=v&...` with keys sorted
/// and values URL-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    namespace: Namespace,
    key: String,
}

impl Fingerprint {
    #[must_use]
    pub fn new(namespace: Namespace, endpoint: &str, params: &QueryParams) -> Self {
        let mut key = format!("{}:{endpoint}", namespace.as_str());

        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(k),
                        urlencoding::encode(&v.to_string())
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            key.push('?');
            key.push_str(&query);
        }

        Self { namespace, key }
    }

    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            // stored "in the future" (clock skew): still fresh
            Err(_) => true,
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Backing storage for cache entries. Each `put` replaces the whole entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<()>;

    async fn remove(&self, keys: &[String]) -> Result<u64>;

    async fn remove_prefix(&self, prefix: &str) -> Result<u64>;

    async fn clear(&self) -> Result<u64>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Physically present entries, expired ones included.
    async fn entry_count(&self) -> Result<u64>;
}

/// In-process store. Expired entries are dropped on every write and the map
/// never holds more than `max_entries`; the oldest entry goes first.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_capacity(MEMORY_MAX_ENTRIES)
    }
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.is_live(entry.stored_at));

        if !entries.contains_key(key) {
            while entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, existing)| existing.stored_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => entries.remove(&k),
                    None => break,
                };
            }
        }

        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let removed = keys.iter().filter(|k| entries.remove(*k).is_some()).count();
        Ok(removed as u64)
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        Ok(count as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok((before - entries.len()) as u64)
    }

    async fn entry_count(&self) -> Result<u64> {
        Ok(self.entries.read().await.len() as u64)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl CacheLayer {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the live cached value for `fingerprint`, or runs `fetch`,
    /// stores its result for `ttl` and returns it.
    ///
    /// `None` means the fetch failed. Store trouble is logged and otherwise
    /// ignored: an unreadable entry is a miss and a failed write still
    /// returns the fetched value.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        ttl: Duration,
        fetch: F,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let namespace = fingerprint.namespace().as_str();

        match self.store.get(fingerprint.as_str()).await {
            Ok(Some(entry)) if entry.is_live(self.clock.now()) => {
                match serde_json::from_value::<T>(entry.payload) {
                    Ok(value) => {
                        metrics::counter!("catalog_cache_hits_total", "namespace" => namespace)
                            .increment(1);
                        debug!(fingerprint = %fingerprint, "Catalog cache hit");
                        return Some(value);
                    }
                    Err(e) => {
                        warn!(
                            fingerprint = %fingerprint,
                            error = %e,
                            "Discarding undecodable cache entry"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
            }
        }

        metrics::counter!("catalog_cache_misses_total", "namespace" => namespace).increment(1);

        match fetch().await {
            Ok(value) => {
                self.store_value(fingerprint, ttl, &value).await;
                Some(value)
            }
            Err(err) => {
                metrics::counter!(
                    "catalog_fetch_errors_total",
                    "namespace" => namespace,
                    "kind" => err.kind()
                )
                .increment(1);
                warn!(
                    fingerprint = %fingerprint,
                    kind = err.kind(),
                    error = %err,
                    "Catalog fetch failed"
                );
                None
            }
        }
    }

    async fn store_value<T: Serialize>(&self, fingerprint: &Fingerprint, ttl: Duration, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(fingerprint = %fingerprint, error = %e, "Failed to serialize cache payload");
                return;
            }
        };

        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
            ttl,
        };

        if let Err(e) = self.store.put(fingerprint.as_str(), entry).await {
            warn!(fingerprint = %fingerprint, error = %e, "Cache write failed");
        }
    }

    pub async fn invalidate(&self, fingerprints: &[Fingerprint]) -> u64 {
        let keys: Vec<String> = fingerprints.iter().map(|f| f.as_str().to_string()).collect();
        self.store.remove(&keys).await.unwrap_or_else(|e| {
            warn!(error = %e, "Cache invalidation failed");
            0
        })
    }

    pub async fn invalidate_namespace(&self, namespace: Namespace) -> u64 {
        self.store
            .remove_prefix(&namespace.key_prefix())
            .await
            .unwrap_or_else(|e| {
                warn!(namespace = namespace.as_str(), error = %e, "Cache invalidation failed");
                0
            })
    }

    pub async fn clear(&self) -> u64 {
        self.store.clear().await.unwrap_or_else(|e| {
            warn!(error = %e, "Cache clear failed");
            0
        })
    }

    pub async fn purge_expired(&self) -> u64 {
        self.store
            .purge_expired(self.clock.now())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Cache purge failed");
                0
            })
    }

    pub async fn entry_count(&self) -> u64 {
        self.store.entry_count().await.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn layer_with_clock() -> (CacheLayer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let layer = CacheLayer::with_clock(Arc::new(MemoryCacheStore::new()), clock.clone());
        (layer, clock)
    }

    const HOUR: Duration = Duration::from_secs(3600);

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
            anyhow::bail!("store offline")
        }
        async fn put(&self, _key: &str, _entry: CacheEntry) -> Result<()> {
            anyhow::bail!("store offline")
        }
        async fn remove(&self, _keys: &[String]) -> Result<u64> {
            anyhow::bail!("store offline")
        }
        async fn remove_prefix(&self, _prefix: &str) -> Result<u64> {
            anyhow::bail!("store offline")
        }
        async fn clear(&self) -> Result<u64> {
            anyhow::bail!("store offline")
        }
        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
            anyhow::bail!("store offline")
        }
        async fn entry_count(&self) -> Result<u64> {
            anyhow::bail!("store offline")
        }
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a = QueryParams::new().with("page", 1u32).with("limit", 10u32);
        let b = QueryParams::new().with("limit", 10u32).with("page", 1u32);

        let fa = Fingerprint::new(Namespace::Top, "/top/anime", &a);
        let fb = Fingerprint::new(Namespace::Top, "/top/anime", &b);

        assert_eq!(fa, fb);
        assert_eq!(fa.as_str(), "top:/top/anime?limit=10&page=1");
    }

    #[test]
    fn fingerprint_encodes_values_and_separates_namespaces() {
        let params = QueryParams::new().with("q", "one piece&more");
        let search = Fingerprint::new(Namespace::Search, "/anime", &params);
        assert_eq!(search.as_str(), "search:/anime?q=one%20piece%26more");

        let top = Fingerprint::new(Namespace::Top, "/top/anime", &QueryParams::new());
        let popular = Fingerprint::new(Namespace::Popular, "/top/anime", &QueryParams::new());
        assert_ne!(top, popular);
        assert_eq!(top.as_str(), "top:/top/anime");
    }

    #[test]
    fn entry_liveness_is_strict() {
        let stored_at = Utc::now();
        let entry = CacheEntry {
            payload: Value::Null,
            stored_at,
            ttl: HOUR,
        };
        assert!(entry.is_live(stored_at));
        assert!(entry.is_live(stored_at + chrono::Duration::minutes(59)));
        assert!(!entry.is_live(stored_at + chrono::Duration::hours(1)));
        assert_eq!(entry.expires_at(), stored_at + chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn hit_does_not_fetch_again() {
        let (layer, _clock) = layer_with_clock();
        let fp = Fingerprint::new(Namespace::Top, "/top/anime", &QueryParams::new());
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Option<Vec<i32>> = layer
                .get_or_fetch(&fp, HOUR, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value, Some(vec![1, 2, 3]));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let (layer, clock) = layer_with_clock();
        let fp = Fingerprint::new(Namespace::Schedule, "/schedules", &QueryParams::new());
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchError>(n)
        };

        assert_eq!(layer.get_or_fetch(&fp, HOUR, fetch).await, Some(0));

        clock.advance(Duration::from_secs(3599));
        assert_eq!(layer.get_or_fetch(&fp, HOUR, fetch).await, Some(0));

        clock.advance(Duration::from_secs(1));
        assert_eq!(layer.get_or_fetch(&fp, HOUR, fetch).await, Some(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let (layer, _clock) = layer_with_clock();
        let params = QueryParams::new().with("q", "naruto");
        let fp = Fingerprint::new(Namespace::Search, "/anime", &params);

        let first: Option<Vec<i32>> = layer
            .get_or_fetch(&fp, HOUR, || async {
                Err(FetchError::UpstreamError { status: 500 })
            })
            .await;
        assert_eq!(first, None);
        assert_eq!(layer.entry_count().await, 0);

        let second: Option<Vec<i32>> = layer
            .get_or_fetch(&fp, HOUR, || async { Ok(vec![7]) })
            .await;
        assert_eq!(second, Some(vec![7]));
    }

    #[tokio::test]
    async fn broken_store_degrades_to_passthrough() {
        let layer = CacheLayer::new(Arc::new(FailingStore));
        let fp = Fingerprint::new(Namespace::Anime, "/anime/1/full", &QueryParams::new());

        let value: Option<String> = layer
            .get_or_fetch(&fp, HOUR, || async { Ok("fresh".to_string()) })
            .await;

        assert_eq!(value.as_deref(), Some("fresh"));
        assert_eq!(layer.invalidate(&[fp]).await, 0);
        assert_eq!(layer.invalidate_namespace(Namespace::Anime).await, 0);
        assert_eq!(layer.clear().await, 0);
    }

    #[tokio::test]
    async fn invalidation_by_key() {
        let (layer, _clock) = layer_with_clock();
        let monday = Fingerprint::new(
            Namespace::Schedule,
            "/schedules",
            &QueryParams::new().with("filter", "monday"),
        );
        let tuesday = Fingerprint::new(
            Namespace::Schedule,
            "/schedules",
            &QueryParams::new().with("filter", "tuesday"),
        );
        let top = Fingerprint::new(Namespace::Top, "/top/anime", &QueryParams::new());

        for fp in [&monday, &tuesday, &top] {
            let _: Option<u8> = layer.get_or_fetch(fp, HOUR, || async { Ok(1) }).await;
        }
        assert_eq!(layer.entry_count().await, 3);

        assert_eq!(layer.invalidate(&[monday.clone()]).await, 1);
        assert_eq!(layer.invalidate(&[monday, tuesday]).await, 1);
        assert_eq!(layer.entry_count().await, 1);
        assert_eq!(layer.clear().await, 1);
    }

    #[tokio::test]
    async fn invalidation_by_namespace() {
        let (layer, _clock) = layer_with_clock();
        let schedule = |day: &str| {
            Fingerprint::new(
                Namespace::Schedule,
                "/schedules",
                &QueryParams::new().with("filter", day),
            )
        };
        let season = Fingerprint::new(Namespace::Season, "/seasons/now", &QueryParams::new());

        for fp in [&schedule("monday"), &schedule("sunday"), &season] {
            let _: Option<u8> = layer.get_or_fetch(fp, HOUR, || async { Ok(1) }).await;
        }

        assert_eq!(layer.invalidate_namespace(Namespace::Schedule).await, 2);
        assert_eq!(layer.invalidate_namespace(Namespace::Schedule).await, 0);
        assert_eq!(layer.entry_count().await, 1);

        let hits = AtomicUsize::new(0);
        let calls = &hits;
        let _: Option<u8> = layer
            .get_or_fetch(&season, HOUR, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn namespace_parses_case_insensitively() {
        assert_eq!("Schedule".parse::<Namespace>().unwrap(), Namespace::Schedule);
        assert_eq!(Namespace::Top.key_prefix(), "top:");
        assert!("weekly".parse::<Namespace>().is_err());
    }

    #[tokio::test]
    async fn memory_store_sheds_expired_entries_on_write() {
        let (layer, clock) = layer_with_clock();
        let ttl = Duration::from_secs(60);

        for i in 0..500u32 {
            let params = QueryParams::new().with("q", format!("title {i}"));
            let fp = Fingerprint::new(Namespace::Search, "/anime", &params);
            let _: Option<u32> = layer.get_or_fetch(&fp, ttl, || async move { Ok(i) }).await;
            clock.advance(Duration::from_secs(120));
        }

        assert!(layer.entry_count().await <= 1);
    }

    #[tokio::test]
    async fn memory_store_evicts_oldest_at_capacity() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let layer =
            CacheLayer::with_clock(Arc::new(MemoryCacheStore::with_capacity(2)), clock.clone());
        let fps: Vec<Fingerprint> = ["a", "b", "c"]
            .into_iter()
            .map(|q| {
                Fingerprint::new(Namespace::Search, "/anime", &QueryParams::new().with("q", q))
            })
            .collect();

        for fp in &fps {
            let _: Option<u8> = layer.get_or_fetch(fp, HOUR, || async { Ok(1) }).await;
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(layer.entry_count().await, 2);

        let refetched = AtomicUsize::new(0);
        let calls = &refetched;
        for fp in &fps {
            let _: Option<u8> = layer
                .get_or_fetch(fp, HOUR, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
        }
        assert!(refetched.load(Ordering::SeqCst) >= 1);
        assert_eq!(layer.entry_count().await, 2);
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() {
        let (layer, clock) = layer_with_clock();
        let short = Fingerprint::new(Namespace::Search, "/anime", &QueryParams::new());
        let long = Fingerprint::new(Namespace::Top, "/top/anime", &QueryParams::new());

        let _: Option<u8> = layer
            .get_or_fetch(&short, Duration::from_secs(60), || async { Ok(1) })
            .await;
        let _: Option<u8> = layer.get_or_fetch(&long, HOUR, || async { Ok(2) }).await;

        clock.advance(Duration::from_secs(120));
        assert_eq!(layer.purge_expired().await, 1);
        assert_eq!(layer.entry_count().await, 1);
    }
}
