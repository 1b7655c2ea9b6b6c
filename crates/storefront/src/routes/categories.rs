//! Category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use honeywell_core::{Category, Product};
use serde::Serialize;
use tracing::instrument;

use super::products::ListQuery;
use crate::catalog::{CategoryWithImage, ProductListOptions};
use crate::content::Paginated;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Category page body.
#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub products: Paginated<Product>,
}

/// All categories with their display images.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CategoryWithImage>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// One category and a page of its products.
///
/// `page` and `limit` work as on the product listing; `category` in the
/// query string is ignored.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CategoryPage>> {
    let catalog = state.catalog();
    let category = catalog
        .category(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let options = ProductListOptions {
        category: Some(slug),
        ..query.into_options()
    };
    let products = catalog.products(&options).await?;

    Ok(Json(CategoryPage { category, products }))
}
