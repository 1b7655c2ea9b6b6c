//! Cache invalidation driven by catalogue mutations.
//!
//! Each cached resource lives under a key prefix ("scope"). A change to a
//! collection drops that collection's scope plus the search and header
//! scopes, since both embed documents from every collection.

use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::error::add_breadcrumb;

/// A group of cache keys invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Single products and product listings.
    Product,
    /// Single categories and the category list.
    Category,
    /// Series list and series detail.
    Series,
    Search,
    Header,
    /// Every cached response.
    All,
}

impl CacheScope {
    /// Key prefix covered by this scope.
    ///
    /// `cache:product` also matches `cache:products:` listings, and
    /// `cache:categor` matches both `cache:category:` and `cache:categories:`.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Product => "cache:product",
            Self::Category => "cache:categor",
            Self::Series => "cache:series",
            Self::Search => "cache:search",
            Self::Header => "cache:header",
            Self::All => "cache:",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "category",
            Self::Series => "series",
            Self::Search => "search",
            Self::Header => "header",
            Self::All => "all",
        }
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalogue collections whose mutations invalidate the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Products,
    Categories,
    ProductSeries,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::ProductSeries => "product-series",
        }
    }

    /// Scope owned by this collection.
    #[must_use]
    pub const fn scope(self) -> CacheScope {
        match self {
            Self::Products => CacheScope::Product,
            Self::Categories => CacheScope::Category,
            Self::ProductSeries => CacheScope::Series,
        }
    }
}

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" => Ok(Self::Products),
            "categories" => Ok(Self::Categories),
            "product-series" => Ok(Self::ProductSeries),
            other => Err(UnknownCollection(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

/// Kind of document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Scopes dropped by a manual invalidation request of `kind`.
///
/// Unknown or missing kinds drop everything.
#[must_use]
pub fn scopes_for_request(kind: Option<&str>) -> &'static [CacheScope] {
    match kind {
        Some("products") => &[CacheScope::Product, CacheScope::Search, CacheScope::Header],
        Some("categories") => &[CacheScope::Category, CacheScope::Header],
        Some("series") => &[CacheScope::Series, CacheScope::Header],
        _ => &[CacheScope::All],
    }
}

/// Applies invalidation scopes to the response cache.
#[derive(Debug, Clone)]
pub struct CacheInvalidator {
    cache: ResponseCache,
}

impl CacheInvalidator {
    #[must_use]
    pub const fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }

    /// Hook for a created or updated document.
    pub async fn after_change(&self, collection: Collection, operation: Operation) {
        let scope = collection.scope();
        self.invalidate(&[scope, CacheScope::Search, CacheScope::Header])
            .await;

        tracing::info!(
            collection = collection.as_str(),
            "Invalidated {scope} cache after {operation}"
        );
        let operation = operation.to_string();
        add_breadcrumb(
            "cache",
            "Cache invalidated",
            Some(&[
                ("collection", collection.as_str()),
                ("operation", operation.as_str()),
            ]),
        );
    }

    /// Hook for a deleted document.
    pub async fn after_delete(&self, collection: Collection) {
        self.after_change(collection, Operation::Delete).await;
    }

    /// Manual invalidation by kind (`products`, `categories`, `series`, `all`).
    ///
    /// Returns the message reported to the caller.
    pub async fn invalidate_request(&self, kind: Option<&str>) -> String {
        let scopes = scopes_for_request(kind);
        self.invalidate(scopes).await;

        let label = kind.filter(|k| !k.is_empty()).unwrap_or("all");
        tracing::info!(kind = label, "Cache invalidated on request");
        format!("Cache invalidated for: {label}")
    }

    /// Drop every scope in `scopes`. Returns the number of entries removed.
    pub async fn invalidate(&self, scopes: &[CacheScope]) -> usize {
        let mut removed = 0;
        for scope in scopes {
            removed += self.cache.invalidate_prefix(scope.prefix()).await;
        }
        removed
    }
}

// =============================================================================
// Bearer token check
// =============================================================================

/// `true` if `headers` carry `Authorization: Bearer <secret>`.
///
/// Always `false` when no secret is configured.
#[must_use]
pub fn bearer_matches(headers: &HeaderMap, secret: Option<&SecretString>) -> bool {
    let Some(secret) = secret else {
        return false;
    };

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_compare(token, secret.expose_secret()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;
    use crate::cache::{keys, ttl};

    async fn seeded() -> ResponseCache {
        let cache = ResponseCache::new(100);
        for key in [
            keys::product("moxie"),
            keys::products(1, 12, None),
            keys::category("audio"),
            keys::categories(),
            keys::series(),
            keys::series_detail("moxie"),
            keys::search("moxie", 8),
            keys::header_data(),
        ] {
            cache.set(key, &json!({"ok": true}), ttl::PRODUCT).await;
        }
        cache
    }

    async fn present(cache: &ResponseCache, key: &str) -> bool {
        cache.get::<serde_json::Value>(key).await.is_some()
    }

    #[test]
    fn test_request_scopes() {
        assert_eq!(
            scopes_for_request(Some("products")),
            &[CacheScope::Product, CacheScope::Search, CacheScope::Header]
        );
        assert_eq!(
            scopes_for_request(Some("categories")),
            &[CacheScope::Category, CacheScope::Header]
        );
        assert_eq!(
            scopes_for_request(Some("series")),
            &[CacheScope::Series, CacheScope::Header]
        );
        assert_eq!(scopes_for_request(Some("all")), &[CacheScope::All]);
        assert_eq!(scopes_for_request(None), &[CacheScope::All]);
        assert_eq!(scopes_for_request(Some("widgets")), &[CacheScope::All]);
    }

    #[test]
    fn test_collection_parse() {
        assert_eq!(
            "product-series".parse::<Collection>().unwrap(),
            Collection::ProductSeries
        );
        assert!("orders".parse::<Collection>().is_err());
    }

    #[tokio::test]
    async fn test_product_change_keeps_category_and_series() {
        let cache = seeded().await;
        let invalidator = CacheInvalidator::new(cache.clone());

        invalidator
            .after_change(Collection::Products, Operation::Update)
            .await;

        assert!(!present(&cache, &keys::product("moxie")).await);
        assert!(!present(&cache, &keys::products(1, 12, None)).await);
        assert!(!present(&cache, &keys::search("moxie", 8)).await);
        assert!(!present(&cache, &keys::header_data()).await);
        assert!(present(&cache, &keys::category("audio")).await);
        assert!(present(&cache, &keys::categories()).await);
        assert!(present(&cache, &keys::series()).await);
    }

    #[tokio::test]
    async fn test_category_delete_covers_category_list() {
        let cache = seeded().await;
        let invalidator = CacheInvalidator::new(cache.clone());

        invalidator.after_delete(Collection::Categories).await;

        assert!(!present(&cache, &keys::category("audio")).await);
        assert!(!present(&cache, &keys::categories()).await);
        assert!(!present(&cache, &keys::search("moxie", 8)).await);
        assert!(present(&cache, &keys::product("moxie")).await);
    }

    #[tokio::test]
    async fn test_series_request_keeps_search() {
        let cache = seeded().await;
        let invalidator = CacheInvalidator::new(cache.clone());

        let message = invalidator.invalidate_request(Some("series")).await;

        assert_eq!(message, "Cache invalidated for: series");
        assert!(!present(&cache, &keys::series()).await);
        assert!(!present(&cache, &keys::series_detail("moxie")).await);
        assert!(!present(&cache, &keys::header_data()).await);
        assert!(present(&cache, &keys::search("moxie", 8)).await);
    }

    #[tokio::test]
    async fn test_missing_kind_drops_everything() {
        let cache = seeded().await;
        let invalidator = CacheInvalidator::new(cache.clone());

        let message = invalidator.invalidate_request(None).await;

        assert_eq!(message, "Cache invalidated for: all");
        assert_eq!(cache.entry_count().await, 0);
    }

    #[test]
    fn test_bearer_matches() {
        let secret = SecretString::from("s3cr3t-T0ken".to_string());
        let mut headers = HeaderMap::new();
        assert!(!bearer_matches(&headers, Some(&secret)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert!(!bearer_matches(&headers, Some(&secret)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cr3t-T0ken"));
        assert!(bearer_matches(&headers, Some(&secret)));
        assert!(!bearer_matches(&headers, None));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "world"));
    }
}
