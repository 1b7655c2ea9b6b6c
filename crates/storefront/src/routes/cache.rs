//! Cache invalidation route handlers.
//!
//! Both endpoints require `Authorization: Bearer <CACHE_INVALIDATION_SECRET>`
//! and reject every request when no secret is configured.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::invalidation::{Collection, Operation, bearer_matches};
use crate::state::AppState;

/// Manual invalidation request body. The body may be empty.
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Mutation hook body.
#[derive(Debug, Deserialize)]
pub struct HookRequest {
    pub operation: Operation,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub message: String,
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    if bearer_matches(headers, state.config().cache_invalidation_secret.as_ref()) {
        Ok(())
    } else {
        tracing::warn!("Rejected cache invalidation request with missing or invalid token");
        Err(AppError::Unauthorized)
    }
}

fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Invalidate cached responses by type (`products`, `categories`, `series`, `all`).
#[instrument(skip(state, headers, body))]
pub async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InvalidateResponse>> {
    authorize(&state, &headers)?;
    let request: InvalidateRequest = parse_body(&body)?;

    let message = state
        .invalidator()
        .invalidate_request(request.kind.as_deref())
        .await;

    Ok(Json(InvalidateResponse {
        success: true,
        message,
    }))
}

/// Apply a create/update/delete hook for a catalogue collection.
#[instrument(skip(state, headers, body))]
pub async fn hook(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InvalidateResponse>> {
    authorize(&state, &headers)?;
    let collection: Collection = collection
        .parse()
        .map_err(|e: crate::invalidation::UnknownCollection| AppError::NotFound(e.to_string()))?;
    let hook: HookRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid hook body: {e}")))?;

    let invalidator = state.invalidator();
    match hook.operation {
        Operation::Delete => invalidator.after_delete(collection).await,
        operation => invalidator.after_change(collection, operation).await,
    }

    Ok(Json(InvalidateResponse {
        success: true,
        message: format!(
            "Invalidated {} cache after {}",
            collection.scope(),
            hook.operation
        ),
    }))
}
