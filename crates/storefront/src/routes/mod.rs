//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (content source answers)
//!
//! # Search (own per-IP quota, X-Cache / X-RateLimit-* headers)
//! GET  /api/search?q=&limit=         - Products, categories and series
//!
//! # Catalogue (cached)
//! GET  /api/products                 - Product listing (page, limit, category, series, search)
//! GET  /api/products/new-arrivals    - Newest products (uncached)
//! GET  /api/products/{slug}          - Product detail
//! GET  /api/categories               - Categories with display images
//! GET  /api/categories/{slug}        - Category with its products
//! GET  /api/series                   - Series with product previews
//! GET  /api/series/{slug}            - Series with its products
//! GET  /api/header                   - Header navigation data
//!
//! # Cache (Bearer CACHE_INVALIDATION_SECRET)
//! POST /api/cache/invalidate         - Invalidate by type
//! POST /api/cache/hooks/{collection} - Mutation hook from the CMS
//! ```

pub mod cache;
pub mod categories;
pub mod header;
pub mod products;
pub mod search;
pub mod series;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::content::ContentSource;
use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Deserialize empty query values as `None` and parse the rest.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the content source cannot answer.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.catalog().source().categories(1) {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/new-arrivals", get(products::new_arrivals))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the series routes router.
pub fn series_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(series::index))
        .route("/{slug}", get(series::show))
}

/// Create the cache management routes router.
pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/invalidate", post(cache::invalidate))
        .route("/hooks/{collection}", post(cache::hook))
}

/// Routes behind the general API rate limiter.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/series", series_routes())
        .route("/header", get(header::show))
        .nest("/cache", cache_routes())
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        // Search enforces its own quota
        .route("/api/search", get(search::search))
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        page: Option<usize>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let params: Params = serde_json::from_str(r#"{"page": ""}"#).unwrap();
        assert_eq!(params.page, None);

        let params: Params = serde_json::from_str(r#"{"page": "3"}"#).unwrap();
        assert_eq!(params.page, Some(3));

        let params: Params = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, None);

        assert!(serde_json::from_str::<Params>(r#"{"page": "three"}"#).is_err());
    }
}
