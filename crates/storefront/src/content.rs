//! Catalogue content source.
//!
//! The storefront reads products, categories and series through the
//! [`ContentSource`] trait. [`Catalog`] is the bundled implementation: an
//! in-memory document set loaded from one JSON file at startup.
//!
//! # File format
//!
//! ```json
//! { "products": [...], "categories": [...], "series": [...] }
//! ```
//!
//! Prices are decimal strings (`"1299"`, `"1299.50"`). Slugs must be unique
//! within each collection.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use honeywell_core::{
    Category, CategoryId, Product, ProductSeries, ProductStatus, SeriesId, Slug, SlugError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or reading catalogue content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate {collection} slug: {slug}")]
    DuplicateSlug {
        collection: &'static str,
        slug: String,
    },

    #[error("invalid {collection} slug {slug:?}: {source}")]
    InvalidSlug {
        collection: &'static str,
        slug: String,
        #[source]
        source: SlugError,
    },

    /// The backing store could not answer.
    #[error("content source unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Queries
// =============================================================================

/// Sortable product fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Name,
    BasePrice,
    SortOrder,
}

/// Product ordering, written `field` or `-field` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for ProductSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            descending: true,
        }
    }
}

impl ProductSort {
    /// Parse `createdAt`, `-name`, `basePrice`, `sortOrder` and so on.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (descending, field) = s
            .strip_prefix('-')
            .map_or((false, s), |rest| (true, rest));

        let key = match field {
            "createdAt" => SortKey::CreatedAt,
            "name" => SortKey::Name,
            "basePrice" => SortKey::BasePrice,
            "sortOrder" => SortKey::SortOrder,
            _ => return None,
        };

        Some(Self { key, descending })
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::BasePrice => a.base_price.cmp(&b.base_price),
            SortKey::SortOrder => a.sort_order.cmp(&b.sort_order),
        };

        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Which product statuses a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Everything except discontinued products.
    #[default]
    Listed,
    Any,
    Only(ProductStatus),
    AnyOf(Vec<ProductStatus>),
}

impl StatusFilter {
    #[must_use]
    pub fn allows(&self, status: ProductStatus) -> bool {
        match self {
            Self::Listed => status != ProductStatus::Discontinued,
            Self::Any => true,
            Self::Only(only) => status == *only,
            Self::AnyOf(statuses) => statuses.contains(&status),
        }
    }
}

/// Product listing query. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: usize,
    pub limit: usize,
    /// Category slug. An unknown slug applies no category filter.
    pub category: Option<String>,
    /// Series slug. An unknown slug applies no series filter.
    pub series: Option<String>,
    pub status: StatusFilter,
    /// Matched against name or short description.
    pub search: Option<String>,
    pub sort: ProductSort,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 12,
            category: None,
            series: None,
            status: StatusFilter::default(),
            search: None,
            sort: ProductSort::default(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    pub total_docs: usize,
    pub total_pages: usize,
    pub page: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Paginated<T> {
    /// Slice `items` into the requested page. `page` and `limit` below 1 are
    /// treated as 1.
    #[must_use]
    pub fn from_items(items: Vec<T>, page: usize, limit: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_docs = items.len();
        let total_pages = total_docs.div_ceil(limit).max(1);

        let docs = items
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Self {
            docs,
            total_docs,
            total_pages,
            page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Case-insensitive match requiring every word of `term` to occur in `field`.
#[must_use]
pub fn like(field: &str, term: &str) -> bool {
    let field = field.to_lowercase();
    term.to_lowercase()
        .split_whitespace()
        .all(|word| field.contains(word))
}

fn like_opt(field: Option<&str>, term: &str) -> bool {
    field.is_some_and(|f| like(f, term))
}

// =============================================================================
// ContentSource
// =============================================================================

/// Read-only access to catalogue documents.
pub trait ContentSource: Send + Sync {
    /// Filtered, sorted, paginated products.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn find_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, ContentError>;

    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError>;

    /// Categories by `sortOrder`, then name.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn categories(&self, limit: usize) -> Result<Vec<Category>, ContentError>;

    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ContentError>;

    /// Series by `sortOrder`, then name.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn series(&self, limit: usize) -> Result<Vec<ProductSeries>, ContentError>;

    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn series_by_slug(&self, slug: &str) -> Result<Option<ProductSeries>, ContentError>;

    /// Categories whose name or description is `like` the term.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn search_categories(&self, term: &str, limit: usize) -> Result<Vec<Category>, ContentError>;

    /// Series whose name or description is `like` the term.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn search_series(&self, term: &str, limit: usize)
    -> Result<Vec<ProductSeries>, ContentError>;

    /// Newest products in a category, any status.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn products_in_category(
        &self,
        category: &CategoryId,
        limit: usize,
    ) -> Result<Vec<Product>, ContentError>;

    /// Newest products in a series, any status.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn products_in_series(
        &self,
        series: &SeriesId,
        limit: usize,
    ) -> Result<Vec<Product>, ContentError>;

    /// `new` products that have a featured image; when there are none, the
    /// `active` products instead.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing store cannot be read.
    fn new_arrivals(&self, limit: usize) -> Result<Vec<Product>, ContentError>;
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    series: Vec<ProductSeries>,
}

/// In-memory catalogue. Cloning is cheap and clones share documents.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Arc<Vec<Product>>,
    categories: Arc<Vec<Category>>,
    series: Arc<Vec<ProductSeries>>,
}

impl Catalog {
    /// Load the catalogue from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a slug is
    /// malformed or repeated within a collection.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            products = catalog.products.len(),
            categories = catalog.categories.len(),
            series = catalog.series.len(),
            "Catalogue loaded"
        );

        Ok(catalog)
    }

    /// Parse a catalogue document.
    ///
    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::new(document.products, document.categories, document.series)
    }

    /// Build a catalogue from documents.
    ///
    /// # Errors
    ///
    /// Returns an error if a slug is malformed or repeated within a collection.
    pub fn new(
        products: Vec<Product>,
        categories: Vec<Category>,
        series: Vec<ProductSeries>,
    ) -> Result<Self, ContentError> {
        check_slugs("products", products.iter().map(|p| &p.slug))?;
        check_slugs("categories", categories.iter().map(|c| &c.slug))?;
        check_slugs("product-series", series.iter().map(|s| &s.slug))?;

        Ok(Self {
            products: Arc::new(products),
            categories: Arc::new(categories),
            series: Arc::new(series),
        })
    }

    fn sorted_products<'a>(
        &'a self,
        filter: impl Fn(&Product) -> bool,
        sort: ProductSort,
    ) -> Vec<&'a Product> {
        let mut products: Vec<&Product> = self.products.iter().filter(|p| filter(p)).collect();
        products.sort_by(|a, b| sort.compare(a, b));
        products
    }

    fn newest(&self, filter: impl Fn(&Product) -> bool, limit: usize) -> Vec<Product> {
        self.sorted_products(filter, ProductSort::default())
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }
}

fn check_slugs<'a>(
    collection: &'static str,
    slugs: impl Iterator<Item = &'a Slug>,
) -> Result<(), ContentError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        Slug::parse(slug.as_str()).map_err(|source| ContentError::InvalidSlug {
            collection,
            slug: slug.to_string(),
            source,
        })?;
        if !seen.insert(slug.as_str()) {
            return Err(ContentError::DuplicateSlug {
                collection,
                slug: slug.to_string(),
            });
        }
    }
    Ok(())
}

fn ordered<T: Clone>(items: &[T], key: impl Fn(&T) -> (i32, String), limit: usize) -> Vec<T> {
    let mut items: Vec<&T> = items.iter().collect();
    items.sort_by_cached_key(|item| key(item));
    items.into_iter().take(limit).cloned().collect()
}

impl ContentSource for Catalog {
    fn find_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, ContentError> {
        let category = query
            .category
            .as_deref()
            .and_then(|slug| self.categories.iter().find(|c| c.slug == *slug))
            .map(|c| &c.id);
        let series = query
            .series
            .as_deref()
            .and_then(|slug| self.series.iter().find(|s| s.slug == *slug))
            .map(|s| &s.id);
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let matches = self.sorted_products(
            |p| {
                query.status.allows(p.status)
                    && category.is_none_or(|id| &p.category == id)
                    && series.is_none_or(|id| p.series.as_ref() == Some(id))
                    && search.is_none_or(|term| {
                        like(&p.name, term) || like_opt(p.short_description.as_deref(), term)
                    })
            },
            query.sort,
        );

        let matches = matches.into_iter().cloned().collect();
        Ok(Paginated::from_items(matches, query.page, query.limit))
    }

    fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError> {
        Ok(self.products.iter().find(|p| p.slug == *slug).cloned())
    }

    fn categories(&self, limit: usize) -> Result<Vec<Category>, ContentError> {
        Ok(ordered(
            &self.categories,
            |c| (c.sort_order, c.name.to_lowercase()),
            limit,
        ))
    }

    fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ContentError> {
        Ok(self.categories.iter().find(|c| c.slug == *slug).cloned())
    }

    fn series(&self, limit: usize) -> Result<Vec<ProductSeries>, ContentError> {
        Ok(ordered(
            &self.series,
            |s| (s.sort_order, s.name.to_lowercase()),
            limit,
        ))
    }

    fn series_by_slug(&self, slug: &str) -> Result<Option<ProductSeries>, ContentError> {
        Ok(self.series.iter().find(|s| s.slug == *slug).cloned())
    }

    fn search_categories(&self, term: &str, limit: usize) -> Result<Vec<Category>, ContentError> {
        Ok(self
            .categories
            .iter()
            .filter(|c| like(&c.name, term) || like_opt(c.description.as_deref(), term))
            .take(limit)
            .cloned()
            .collect())
    }

    fn search_series(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ProductSeries>, ContentError> {
        Ok(self
            .series
            .iter()
            .filter(|s| like(&s.name, term) || like_opt(s.description.as_deref(), term))
            .take(limit)
            .cloned()
            .collect())
    }

    fn products_in_category(
        &self,
        category: &CategoryId,
        limit: usize,
    ) -> Result<Vec<Product>, ContentError> {
        Ok(self.newest(|p| &p.category == category, limit))
    }

    fn products_in_series(
        &self,
        series: &SeriesId,
        limit: usize,
    ) -> Result<Vec<Product>, ContentError> {
        Ok(self.newest(|p| p.series.as_ref() == Some(series), limit))
    }

    fn new_arrivals(&self, limit: usize) -> Result<Vec<Product>, ContentError> {
        let fresh = self.newest(
            |p| p.status == ProductStatus::New && p.featured_image.is_some(),
            limit,
        );
        if !fresh.is_empty() {
            return Ok(fresh);
        }

        Ok(self.newest(|p| p.status == ProductStatus::Active, limit))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Small catalogue shared by storefront unit tests.
    pub(crate) const FIXTURE: &str = r#"{
        "categories": [
            {"id": "cat-audio", "name": "Audio", "slug": "audio", "description": "Headphones and speakers", "sortOrder": 1},
            {"id": "cat-power", "name": "Power Banks", "slug": "power-banks", "sortOrder": 2}
        ],
        "series": [
            {"id": "ser-moxie", "name": "Moxie", "slug": "moxie", "tier": "premium", "description": "Flagship audio line"},
            {"id": "ser-volt", "name": "Volt", "slug": "volt", "tier": "value"}
        ],
        "products": [
            {
                "id": "p-buds", "name": "Moxie Wireless Earbuds", "slug": "moxie-wireless-earbuds",
                "status": "new", "shortDescription": "Noise cancelling buds",
                "category": "cat-audio", "series": "ser-moxie", "basePrice": "2499",
                "featuredImage": {"id": "m1", "url": "https://cdn.example/buds.jpg"},
                "createdAt": "2026-03-01T00:00:00Z"
            },
            {
                "id": "p-speaker", "name": "Moxie Party Speaker", "slug": "moxie-party-speaker",
                "status": "active", "shortDescription": "Wireless speaker with bass boost",
                "category": "cat-audio", "series": "ser-moxie", "basePrice": "4999",
                "createdAt": "2026-02-01T00:00:00Z"
            },
            {
                "id": "p-bank", "name": "Volt 10000mAh Power Bank", "slug": "volt-10000mah-power-bank",
                "status": "active", "category": "cat-power", "series": "ser-volt", "basePrice": "1299",
                "variants": [
                    {"id": "v-black", "color": "Black", "eanCode": "8901", "stock": 5},
                    {"id": "v-white", "color": "White", "eanCode": "8902", "price": "1399", "stock": 0, "available": false}
                ],
                "createdAt": "2026-01-01T00:00:00Z"
            },
            {
                "id": "p-old", "name": "Moxie Wired Earphones", "slug": "moxie-wired-earphones",
                "status": "discontinued", "category": "cat-audio", "series": "ser-moxie", "basePrice": "499",
                "createdAt": "2025-01-01T00:00:00Z"
            }
        ]
    }"#;

    pub(crate) fn fixture() -> Catalog {
        Catalog::from_json(FIXTURE).unwrap()
    }

    fn slugs(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_like_requires_every_word() {
        assert!(like("Moxie Wireless Earbuds", "wireless moxie"));
        assert!(like("Moxie Wireless Earbuds", "EARB"));
        assert!(!like("Moxie Wireless Earbuds", "wireless speaker"));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(
            ProductSort::parse("-createdAt"),
            Some(ProductSort::default())
        );
        assert_eq!(
            ProductSort::parse("basePrice"),
            Some(ProductSort {
                key: SortKey::BasePrice,
                descending: false
            })
        );
        assert_eq!(ProductSort::parse("colour"), None);
    }

    #[test]
    fn test_pagination_math() {
        let page = Paginated::from_items((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.docs, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_docs, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);

        let last = Paginated::from_items((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(last.docs.len(), 5);
        assert!(!last.has_next_page);

        let empty = Paginated::<u8>::from_items(Vec::new(), 0, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn test_find_products_excludes_discontinued_by_default() {
        let catalog = fixture();
        let page = catalog.find_products(&ProductQuery::default()).unwrap();

        assert_eq!(page.total_docs, 3);
        assert_eq!(
            slugs(&page.docs),
            vec![
                "moxie-wireless-earbuds",
                "moxie-party-speaker",
                "volt-10000mah-power-bank"
            ]
        );
    }

    #[test]
    fn test_find_products_filters() {
        let catalog = fixture();

        let audio = catalog
            .find_products(&ProductQuery {
                category: Some("audio".to_string()),
                ..ProductQuery::default()
            })
            .unwrap();
        assert_eq!(audio.total_docs, 2);

        let discontinued = catalog
            .find_products(&ProductQuery {
                status: StatusFilter::Only(ProductStatus::Discontinued),
                ..ProductQuery::default()
            })
            .unwrap();
        assert_eq!(slugs(&discontinued.docs), vec!["moxie-wired-earphones"]);

        let searched = catalog
            .find_products(&ProductQuery {
                search: Some("wireless".to_string()),
                ..ProductQuery::default()
            })
            .unwrap();
        assert_eq!(
            slugs(&searched.docs),
            vec!["moxie-wireless-earbuds", "moxie-party-speaker"]
        );
    }

    #[test]
    fn test_unknown_category_applies_no_filter() {
        let catalog = fixture();
        let page = catalog
            .find_products(&ProductQuery {
                category: Some("nope".to_string()),
                ..ProductQuery::default()
            })
            .unwrap();
        assert_eq!(page.total_docs, 3);
    }

    #[test]
    fn test_sort_by_price_ascending() {
        let catalog = fixture();
        let page = catalog
            .find_products(&ProductQuery {
                sort: ProductSort::parse("basePrice").unwrap(),
                ..ProductQuery::default()
            })
            .unwrap();
        assert_eq!(page.docs[0].slug.as_str(), "volt-10000mah-power-bank");
    }

    #[test]
    fn test_new_arrivals_prefers_new_with_image() {
        let catalog = fixture();
        let arrivals = catalog.new_arrivals(4).unwrap();
        assert_eq!(slugs(&arrivals), vec!["moxie-wireless-earbuds"]);
    }

    #[test]
    fn test_new_arrivals_falls_back_to_active() {
        let mut products = fixture().products.as_ref().clone();
        products.retain(|p| p.status != ProductStatus::New);
        let catalog = Catalog::new(products, Vec::new(), Vec::new()).unwrap();

        let arrivals = catalog.new_arrivals(4).unwrap();
        assert_eq!(
            slugs(&arrivals),
            vec!["moxie-party-speaker", "volt-10000mah-power-bank"]
        );
    }

    #[test]
    fn test_search_categories_and_series_use_description() {
        let catalog = fixture();
        let categories = catalog.search_categories("speakers", 4).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug.as_str(), "audio");

        let series = catalog.search_series("flagship", 4).unwrap();
        assert_eq!(series[0].slug.as_str(), "moxie");
    }

    #[test]
    fn test_products_in_series_limit() {
        let catalog = fixture();
        let products = catalog
            .products_in_series(&SeriesId::new("ser-moxie"), 2)
            .unwrap();
        assert_eq!(
            slugs(&products),
            vec!["moxie-wireless-earbuds", "moxie-party-speaker"]
        );
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let mut products = fixture().products.as_ref().clone();
        products.push(products[0].clone());

        let result = Catalog::new(products, Vec::new(), Vec::new());
        assert!(matches!(
            result,
            Err(ContentError::DuplicateSlug {
                collection: "products",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_slug_rejected() {
        let json = r#"{"categories": [{"id": "c", "name": "Bad", "slug": "Bad Slug"}]}"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(ContentError::InvalidSlug { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert!(
            catalog
                .product_by_slug("moxie-party-speaker")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ContentError::Io { .. })));
    }
}
