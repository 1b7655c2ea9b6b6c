//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::content::ContentSource;
use crate::invalidation::CacheInvalidator;
use crate::search::SearchService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the response cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cache: ResponseCache,
    catalog: CatalogService,
    search: SearchService,
    invalidator: CacheInvalidator,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `source` - Catalogue content source
    #[must_use]
    pub fn new(config: StorefrontConfig, source: Arc<dyn ContentSource>) -> Self {
        let cache = ResponseCache::new(config.cache.max_capacity);
        let catalog = CatalogService::new(source, cache.clone());
        let search = SearchService::new(catalog.clone(), cache.clone(), config.search_rate_limit);
        let invalidator = CacheInvalidator::new(cache.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                cache,
                catalog,
                search,
                invalidator,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared response cache.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Get a reference to the cached catalogue reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the search service.
    #[must_use]
    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    /// Get a reference to the cache invalidator.
    #[must_use]
    pub fn invalidator(&self) -> &CacheInvalidator {
        &self.inner.invalidator
    }
}
