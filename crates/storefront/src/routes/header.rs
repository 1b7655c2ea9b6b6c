//! Header navigation data.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::catalog::HeaderData;
use crate::error::Result;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<HeaderData>> {
    Ok(Json(state.catalog().header_data().await?))
}
