//! Search route handler.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::empty_string_as_none;
use crate::error::{ErrorBody, Result};
use crate::middleware::client_ip;
use crate::search::{RateDecision, SearchOutcome, SearchResults};
use crate::state::AppState;

pub const X_CACHE: &str = "x-cache";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<usize>,
}

fn rate_headers(decision: &RateDecision, with_reset: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    if with_reset {
        headers.insert(
            X_RATELIMIT_RESET,
            HeaderValue::from(decision.reset_at.timestamp_millis()),
        );
    }
    headers
}

/// Search products, categories and series.
#[instrument(skip(state, headers))]
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let client = client_ip(&headers);
    let outcome = state
        .search()
        .search(client, query.q.as_deref(), query.limit)
        .await?;

    let response = match outcome {
        SearchOutcome::Skipped => Json(SearchResults::default()).into_response(),
        SearchOutcome::Limited(decision) => (
            StatusCode::TOO_MANY_REQUESTS,
            rate_headers(&decision, true),
            Json(ErrorBody::new("Too many requests. Please slow down.")),
        )
            .into_response(),
        SearchOutcome::Found {
            results,
            cache,
            rate,
        } => {
            let mut headers = rate_headers(&rate, false);
            headers.insert(X_CACHE, HeaderValue::from_static(cache.as_header()));
            (headers, Json(results)).into_response()
        }
    };

    Ok(response)
}
