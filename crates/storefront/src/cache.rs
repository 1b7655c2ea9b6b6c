//! TTL response cache for catalogue and search reads.
//!
//! Values are stored as JSON so any serializable response can be cached under
//! one key space. Every entry carries its own TTL, applied through moka's
//! [`Expiry`] hook. Reads and writes never fail the caller: a value that does
//! not (de)serialize is logged and treated as a miss.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// TTLs per cached resource.
pub mod ttl {
    use std::time::Duration;

    pub const SEARCH: Duration = Duration::from_secs(5 * 60);
    pub const PRODUCTS: Duration = Duration::from_secs(10 * 60);
    pub const PRODUCT: Duration = Duration::from_secs(15 * 60);
    pub const CATEGORIES: Duration = Duration::from_secs(30 * 60);
    pub const SERIES: Duration = Duration::from_secs(30 * 60);
    pub const HEADER: Duration = Duration::from_secs(15 * 60);
}

/// Cache key builders.
///
/// Keys share the `cache:` namespace so a scope can be dropped by prefix.
pub mod keys {
    /// Normalizes the query (trimmed, lower-cased) so equivalent searches share an entry.
    #[must_use]
    pub fn search(query: &str, limit: usize) -> String {
        format!("cache:search:{}:{limit}", query.trim().to_lowercase())
    }

    #[must_use]
    pub fn products(page: usize, limit: usize, filters: Option<&str>) -> String {
        match filters {
            Some(filters) if !filters.is_empty() => {
                format!("cache:products:{page}:{limit}:{filters}")
            }
            _ => format!("cache:products:{page}:{limit}"),
        }
    }

    #[must_use]
    pub fn product(slug: &str) -> String {
        format!("cache:product:{slug}")
    }

    #[must_use]
    pub fn categories() -> String {
        "cache:categories:all".to_string()
    }

    #[must_use]
    pub fn category(slug: &str) -> String {
        format!("cache:category:{slug}")
    }

    #[must_use]
    pub fn series() -> String {
        "cache:series:all".to_string()
    }

    #[must_use]
    pub fn series_detail(slug: &str) -> String {
        format!("cache:series:{slug}")
    }

    #[must_use]
    pub fn header_data() -> String {
        "cache:header:data".to_string()
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: Arc<serde_json::Value>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was inserted with.
struct EntryTtl;

impl Expiry<String, CachedEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Shared response cache. Cloning is cheap and clones share entries.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<String, CachedEntry>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl ResponseCache {
    /// Create a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self { cache }
    }

    /// Fetch and decode a cached value.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.cache.get(key).await?;

        match T::deserialize(entry.value.as_ref()) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape, treating as miss");
                None
            }
        }
    }

    /// Encode and store a value for `ttl`.
    pub async fn set<T: Serialize>(&self, key: String, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => {
                let entry = CachedEntry {
                    value: Arc::new(json),
                    ttl,
                };
                self.cache.insert(key, entry).await;
            }
            Err(e) => warn!(key, error = %e, "Failed to encode value for cache"),
        }
    }

    /// Drop every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let matching: Vec<Arc<String>> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();

        for key in &matching {
            self.cache.invalidate(key.as_str()).await;
        }

        debug!(prefix, removed = matching.len(), "Cache prefix invalidated");
        matching.len()
    }

    /// Drop every entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Number of live entries, after flushing pending maintenance.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Listing {
        names: Vec<String>,
        total: u32,
    }

    fn listing() -> Listing {
        Listing {
            names: vec!["Moxie".to_string(), "Zenith".to_string()],
            total: 2,
        }
    }

    #[test]
    fn test_search_key_normalizes_query() {
        assert_eq!(keys::search("  Power Bank ", 8), "cache:search:power bank:8");
    }

    #[test]
    fn test_products_key_filters() {
        assert_eq!(keys::products(1, 12, None), "cache:products:1:12");
        assert_eq!(keys::products(1, 12, Some("")), "cache:products:1:12");
        assert_eq!(
            keys::products(2, 24, Some("cat:audio:q:buds")),
            "cache:products:2:24:cat:audio:q:buds"
        );
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = ResponseCache::new(100);
        cache
            .set(keys::product("moxie"), &listing(), ttl::PRODUCT)
            .await;

        let cached: Option<Listing> = cache.get(&keys::product("moxie")).await;
        assert_eq!(cached, Some(listing()));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let cache = ResponseCache::new(100);
        let cached: Option<Listing> = cache.get("cache:product:none").await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_get_with_wrong_shape_is_miss() {
        let cache = ResponseCache::new(100);
        cache.set("cache:header:data".to_string(), &"plain", ttl::HEADER).await;

        let cached: Option<Listing> = cache.get("cache:header:data").await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(100);
        cache
            .set(
                "cache:search:buds:8".to_string(),
                &listing(),
                Duration::from_millis(50),
            )
            .await;
        cache
            .set("cache:product:buds".to_string(), &listing(), ttl::PRODUCT)
            .await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get::<Listing>("cache:search:buds:8").await.is_none());
        assert!(cache.get::<Listing>("cache:product:buds").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_prefix_covers_product_and_products() {
        let cache = ResponseCache::new(100);
        cache.set(keys::product("x"), &listing(), ttl::PRODUCT).await;
        cache
            .set(keys::products(1, 12, None), &listing(), ttl::PRODUCTS)
            .await;
        cache.set(keys::category("x"), &listing(), ttl::CATEGORIES).await;

        let removed = cache.invalidate_prefix("cache:product").await;

        assert_eq!(removed, 2);
        assert!(cache.get::<Listing>(&keys::product("x")).await.is_none());
        assert!(
            cache
                .get::<Listing>(&keys::products(1, 12, None))
                .await
                .is_none()
        );
        assert!(cache.get::<Listing>(&keys::category("x")).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = ResponseCache::new(100);
        cache.set(keys::series(), &listing(), ttl::SERIES).await;
        cache.set(keys::header_data(), &listing(), ttl::HEADER).await;

        cache.invalidate_all().await;

        assert_eq!(cache.entry_count().await, 0);
    }
}
