//! Cached catalogue reads.
//!
//! `CatalogService` fronts a [`ContentSource`] with the [`ResponseCache`].
//! Each read checks its cache key first and stores the assembled response on
//! a miss. Lookups that find nothing are not cached.

use std::sync::Arc;

use honeywell_core::{Category, MediaRef, Product, ProductSeries, ProductStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cache::{ResponseCache, keys, ttl};
use crate::content::{ContentError, ContentSource, Paginated, ProductQuery, StatusFilter};

const ALL_CATEGORIES_LIMIT: usize = 100;
const ALL_SERIES_LIMIT: usize = 100;
const SERIES_PREVIEW_PRODUCTS: usize = 6;
const SERIES_DETAIL_PRODUCTS: usize = 50;
const HEADER_CATEGORIES: usize = 12;
const HEADER_SERIES: usize = 3;
const HEADER_SERIES_PRODUCTS: usize = 4;
const HEADER_FEATURED_PRODUCTS: usize = 6;

/// Category plus the image shown on its card: the featured image of its
/// newest product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithImage {
    #[serde(flatten)]
    pub category: Category,
    pub display_image: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesWithProducts {
    pub series: ProductSeries,
    pub products: Vec<Product>,
}

/// Navigation data for the site header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderData {
    pub categories: Vec<CategoryWithImage>,
    pub series: Vec<SeriesWithProducts>,
    pub featured_products: Vec<Product>,
}

/// Options for a cached product listing. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListOptions {
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub series: Option<String>,
    pub search: Option<String>,
}

impl Default for ProductListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 12,
            category: None,
            series: None,
            search: None,
        }
    }
}

impl ProductListOptions {
    /// Filter segment of the cache key, e.g. `cat:audio:q:buds`.
    fn filter_key(&self) -> String {
        [
            self.category.as_deref().map(|c| format!("cat:{c}")),
            self.series.as_deref().map(|s| format!("ser:{s}")),
            self.search.as_deref().map(|q| format!("q:{q}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(":")
    }
}

/// Catalogue reads backed by the response cache.
#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn ContentSource>,
    cache: ResponseCache,
}

impl CatalogService {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, cache: ResponseCache) -> Self {
        Self { source, cache }
    }

    /// The underlying content source, for uncached reads.
    #[must_use]
    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    /// All categories with their display images.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryWithImage>, ContentError> {
        let key = keys::categories();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let categories = self.source.categories(ALL_CATEGORIES_LIMIT)?;
        let categories = self.with_display_images(categories)?;

        self.cache.set(key, &categories, ttl::CATEGORIES).await;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn category(&self, slug: &str) -> Result<Option<Category>, ContentError> {
        let key = keys::category(slug);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let category = self.source.category_by_slug(slug)?;
        if let Some(category) = &category {
            self.cache.set(key, category, ttl::CATEGORIES).await;
        }
        Ok(category)
    }

    /// Listing with optional category, series and search filters.
    ///
    /// Listings with a search term are cached for the shorter search TTL.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        options: &ProductListOptions,
    ) -> Result<Paginated<Product>, ContentError> {
        let filters = options.filter_key();
        let key = keys::products(options.page, options.limit, Some(&filters));
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self.source.find_products(&ProductQuery {
            page: options.page,
            limit: options.limit,
            category: options.category.clone(),
            series: options.series.clone(),
            search: options.search.clone(),
            ..ProductQuery::default()
        })?;

        let ttl = if options.search.is_some() {
            ttl::SEARCH
        } else {
            ttl::PRODUCTS
        };
        self.cache.set(key, &page, ttl).await;
        Ok(page)
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Option<Product>, ContentError> {
        let key = keys::product(slug);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let product = self.source.product_by_slug(slug)?;
        if let Some(product) = &product {
            self.cache.set(key, product, ttl::PRODUCT).await;
        }
        Ok(product)
    }

    /// Every series with a preview of its products.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn series_with_products(&self) -> Result<Vec<SeriesWithProducts>, ContentError> {
        let key = keys::series();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let series = self.source.series(ALL_SERIES_LIMIT)?;
        let series = self.with_products(series, SERIES_PREVIEW_PRODUCTS)?;

        self.cache.set(key, &series, ttl::SERIES).await;
        Ok(series)
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn series_detail(
        &self,
        slug: &str,
    ) -> Result<Option<SeriesWithProducts>, ContentError> {
        let key = keys::series_detail(slug);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let Some(series) = self.source.series_by_slug(slug)? else {
            return Ok(None);
        };
        let products = self
            .source
            .products_in_series(&series.id, SERIES_DETAIL_PRODUCTS)?;
        let detail = SeriesWithProducts { series, products };

        self.cache.set(key, &detail, ttl::SERIES).await;
        Ok(Some(detail))
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    #[instrument(skip(self))]
    pub async fn header_data(&self) -> Result<HeaderData, ContentError> {
        let key = keys::header_data();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let categories = self.source.categories(HEADER_CATEGORIES)?;
        let series = self.source.series(HEADER_SERIES)?;
        let featured = self.source.find_products(&ProductQuery {
            limit: HEADER_FEATURED_PRODUCTS,
            status: StatusFilter::AnyOf(vec![ProductStatus::New, ProductStatus::Active]),
            ..ProductQuery::default()
        })?;

        let header = HeaderData {
            categories: self.with_display_images(categories)?,
            series: self.with_products(series, HEADER_SERIES_PRODUCTS)?,
            featured_products: featured.docs,
        };

        self.cache.set(key, &header, ttl::HEADER).await;
        Ok(header)
    }

    /// Uncached: the home page calls this rarely and wants fresh stock.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the content source fails.
    pub fn new_arrivals(&self, limit: usize) -> Result<Vec<Product>, ContentError> {
        self.source.new_arrivals(limit)
    }

    fn with_display_images(
        &self,
        categories: Vec<Category>,
    ) -> Result<Vec<CategoryWithImage>, ContentError> {
        categories
            .into_iter()
            .map(|category| {
                let display_image = self
                    .source
                    .products_in_category(&category.id, 1)?
                    .into_iter()
                    .next()
                    .and_then(|p| p.featured_image);
                Ok(CategoryWithImage {
                    category,
                    display_image,
                })
            })
            .collect()
    }

    fn with_products(
        &self,
        series: Vec<ProductSeries>,
        limit: usize,
    ) -> Result<Vec<SeriesWithProducts>, ContentError> {
        series
            .into_iter()
            .map(|series| {
                let products = self.source.products_in_series(&series.id, limit)?;
                Ok(SeriesWithProducts { series, products })
            })
            .collect()
    }
}
