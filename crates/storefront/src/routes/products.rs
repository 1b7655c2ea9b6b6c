//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use honeywell_core::Product;
use serde::Deserialize;
use tracing::instrument;

use super::empty_string_as_none;
use crate::catalog::ProductListOptions;
use crate::content::Paginated;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_NEW_ARRIVALS: usize = 4;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
}

impl ListQuery {
    /// Listing options with defaults applied and the page size bounded.
    #[must_use]
    pub fn into_options(self) -> ProductListOptions {
        let defaults = ProductListOptions::default();
        ProductListOptions {
            page: self.page.unwrap_or(defaults.page).max(1),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
            category: self.category,
            series: self.series,
            search: self.search,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<usize>,
}

/// Paginated product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Product>>> {
    let page = state.catalog().products(&query.into_options()).await?;
    Ok(Json(page))
}

/// Newest products for the home page.
#[instrument(skip(state))]
pub async fn new_arrivals(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Product>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NEW_ARRIVALS)
        .clamp(1, MAX_PAGE_SIZE);
    Ok(Json(state.catalog().new_arrivals(limit)?))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .product(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))
}
