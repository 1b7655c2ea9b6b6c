//! Instant search over products, categories and series.
//!
//! A search runs in three steps:
//!
//! 1. Queries shorter than two characters return empty results without
//!    touching the rate limiter.
//! 2. Each client IP is held to a GCRA quota (30 requests per 10 seconds by
//!    default).
//! 3. Results are served from the response cache when present, otherwise
//!    assembled from the content source and cached for five minutes.

mod limiter;

use std::net::IpAddr;

use honeywell_core::{
    Category, MediaRef, Product, ProductId, ProductSeries, ProductStatus, SeriesTier,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cache::{ResponseCache, keys, ttl};
use crate::catalog::CatalogService;
use crate::config::RateLimitSettings;
use crate::content::{ContentError, ContentSource, ProductQuery, StatusFilter};

pub use limiter::{RateDecision, SearchRateLimiter};

/// Shortest query, after trimming, that triggers a search.
pub const MIN_QUERY_LENGTH: usize = 2;
/// Product results when the caller gives no limit.
pub const DEFAULT_PRODUCT_LIMIT: usize = 8;
/// Upper bound on a caller-supplied product limit.
pub const MAX_PRODUCT_LIMIT: usize = 50;
const CATEGORY_LIMIT: usize = 4;
const SERIES_LIMIT: usize = 4;

/// Product fields returned by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub featured_image: Option<MediaRef>,
    pub short_description: Option<String>,
    pub base_price: Decimal,
    pub status: ProductStatus,
}

impl From<Product> for ProductHit {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            slug: product.slug.into_inner(),
            featured_image: product.featured_image,
            short_description: product.short_description,
            base_price: product.base_price,
            status: product.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHit {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryHit {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.into_inner(),
            name: category.name,
            slug: category.slug.into_inner(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesHit {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tier: SeriesTier,
}

impl From<ProductSeries> for SeriesHit {
    fn from(series: ProductSeries) -> Self {
        Self {
            id: series.id.into_inner(),
            name: series.name,
            slug: series.slug.into_inner(),
            tier: series.tier,
        }
    }
}

/// Search response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub products: Vec<ProductHit>,
    pub categories: Vec<CategoryHit>,
    pub series: Vec<SeriesHit>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty() && self.series.is_empty()
    }
}

/// Where a served result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value of the `X-Cache` response header.
    #[must_use]
    pub const fn as_header(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Result of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Query too short; nothing was searched.
    Skipped,
    /// The client exhausted its quota.
    Limited(RateDecision),
    Found {
        results: SearchResults,
        cache: CacheStatus,
        rate: RateDecision,
    },
}

/// Rate-limited, cached search.
#[derive(Clone)]
pub struct SearchService {
    catalog: CatalogService,
    cache: ResponseCache,
    limiter: SearchRateLimiter,
}

impl SearchService {
    #[must_use]
    pub fn new(catalog: CatalogService, cache: ResponseCache, rate_limit: RateLimitSettings) -> Self {
        Self {
            catalog,
            cache,
            limiter: SearchRateLimiter::new(rate_limit),
        }
    }

    /// The per-IP limiter, for periodic housekeeping.
    #[must_use]
    pub const fn limiter(&self) -> &SearchRateLimiter {
        &self.limiter
    }

    /// Search for `query` on behalf of `client`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails on a cache miss.
    #[instrument(skip(self), fields(cache = tracing::field::Empty))]
    pub async fn search(
        &self,
        client: IpAddr,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SearchOutcome, ContentError> {
        let Some(term) = query
            .map(str::trim)
            .filter(|q| q.chars().count() >= MIN_QUERY_LENGTH)
        else {
            return Ok(SearchOutcome::Skipped);
        };

        let rate = self.limiter.check(client);
        if !rate.allowed {
            tracing::info!(%client, "Search rate limit exceeded");
            return Ok(SearchOutcome::Limited(rate));
        }

        let limit = limit
            .unwrap_or(DEFAULT_PRODUCT_LIMIT)
            .clamp(1, MAX_PRODUCT_LIMIT);
        let key = keys::search(term, limit);

        if let Some(results) = self.cache.get::<SearchResults>(&key).await {
            tracing::Span::current().record("cache", CacheStatus::Hit.as_header());
            return Ok(SearchOutcome::Found {
                results,
                cache: CacheStatus::Hit,
                rate,
            });
        }

        let results = self.run(term, limit)?;
        self.cache.set(key, &results, ttl::SEARCH).await;
        tracing::Span::current().record("cache", CacheStatus::Miss.as_header());

        Ok(SearchOutcome::Found {
            results,
            cache: CacheStatus::Miss,
            rate,
        })
    }

    fn run(&self, term: &str, limit: usize) -> Result<SearchResults, ContentError> {
        let source = self.catalog.source();

        let products = source.find_products(&ProductQuery {
            limit,
            status: StatusFilter::Any,
            search: Some(term.to_string()),
            ..ProductQuery::default()
        })?;

        Ok(SearchResults {
            products: products.docs.into_iter().map(ProductHit::from).collect(),
            categories: source
                .search_categories(term, CATEGORY_LIMIT)?
                .into_iter()
                .map(CategoryHit::from)
                .collect(),
            series: source
                .search_series(term, SERIES_LIMIT)?
                .into_iter()
                .map(SeriesHit::from)
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::content::tests::fixture;

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

    fn service(max_requests: u32) -> (SearchService, ResponseCache) {
        let cache = ResponseCache::new(100);
        let catalog = CatalogService::new(Arc::new(fixture()), cache.clone());
        let settings = RateLimitSettings {
            max_requests,
            window: Duration::from_secs(10),
        };
        (SearchService::new(catalog, cache.clone(), settings), cache)
    }

    #[tokio::test]
    async fn test_short_query_skips_limiter() {
        let (search, _) = service(1);

        for query in [None, Some(""), Some(" a "), Some("x")] {
            assert_eq!(
                search.search(CLIENT, query, None).await.unwrap(),
                SearchOutcome::Skipped
            );
        }

        // The single token is still available.
        let outcome = search.search(CLIENT, Some("moxie"), None).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Found { .. }));
    }

    #[tokio::test]
    async fn test_results_cover_all_collections() {
        let (search, _) = service(30);
        let SearchOutcome::Found { results, cache, .. } =
            search.search(CLIENT, Some("Moxie"), None).await.unwrap()
        else {
            panic!("expected results");
        };

        assert_eq!(cache, CacheStatus::Miss);
        assert_eq!(results.products.len(), 3);
        assert!(results.categories.is_empty());
        assert_eq!(results.series.len(), 1);
        assert_eq!(results.series[0].tier, SeriesTier::Premium);
    }

    #[tokio::test]
    async fn test_second_identical_query_hits_cache() {
        let (search, cache) = service(30);
        search.search(CLIENT, Some("audio"), Some(8)).await.unwrap();

        assert!(
            cache
                .get::<SearchResults>("cache:search:audio:8")
                .await
                .is_some()
        );

        let outcome = search.search(CLIENT, Some("  AUDIO "), Some(8)).await.unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Found {
                cache: CacheStatus::Hit,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_limit_exceeded() {
        let (search, _) = service(2);
        search.search(CLIENT, Some("moxie"), None).await.unwrap();
        search.search(CLIENT, Some("moxie"), None).await.unwrap();

        let outcome = search.search(CLIENT, Some("moxie"), None).await.unwrap();
        let SearchOutcome::Limited(decision) = outcome else {
            panic!("expected rate limit");
        };
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);

        // Other clients are unaffected.
        let other = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(matches!(
            search.search(other, Some("moxie"), None).await.unwrap(),
            SearchOutcome::Found { .. }
        ));
    }

    #[test]
    fn test_product_hit_shape() {
        let product = fixture()
            .find_products(&ProductQuery::default())
            .unwrap()
            .docs
            .remove(0);
        let json = serde_json::to_value(ProductHit::from(product)).unwrap();

        assert_eq!(json["slug"], "moxie-wireless-earbuds");
        assert_eq!(json["basePrice"], "2499");
        assert_eq!(json["status"], "new");
        assert!(json.get("variants").is_none());
    }
}
