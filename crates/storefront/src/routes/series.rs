//! Product series route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::catalog::SeriesWithProducts;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Every series with a preview of its products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<SeriesWithProducts>>> {
    Ok(Json(state.catalog().series_with_products().await?))
}

/// One series with its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SeriesWithProducts>> {
    state
        .catalog()
        .series_detail(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("series {slug}")))
}
