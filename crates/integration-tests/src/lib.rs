//! Integration tests for the Honeywell storefront.
//!
//! The storefront router runs in-process: requests go through the full
//! middleware stack via `tower::ServiceExt::oneshot`, so no server, port or
//! network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p honeywell-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - Catalogue, search and cache invalidation endpoints
//! - `shopper_session` - Cart and wishlist persistence through `FileSlot`

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use honeywell_storefront::config::StorefrontConfig;
use honeywell_storefront::content::Catalog;
use honeywell_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

/// Catalogue shipped with the storefront.
pub const CATALOG_JSON: &str = include_str!("../../storefront/content/catalog.json");

/// Invalidation secret configured by [`TestApp::new`].
pub const CACHE_SECRET: &str = "Qm7#vR2!kT9$wZ4&pL8*nX3^bH6@";

/// Storefront router plus the state behind it.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// Status, headers and decoded body of one response.
///
/// Non-JSON bodies are kept as a JSON string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// App over the shipped catalogue with a configured invalidation secret.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vars(&[("CACHE_INVALIDATION_SECRET", CACHE_SECRET)])
    }

    /// App configured from the given environment pairs only.
    #[must_use]
    pub fn with_vars(pairs: &[(&str, &str)]) -> Self {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let config = StorefrontConfig::from_vars(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test configuration is valid");

        let catalog = Catalog::from_json(CATALOG_JSON).expect("shipped catalogue parses");
        let state = AppState::new(config, Arc::new(catalog));

        Self {
            router: honeywell_storefront::app(state.clone()),
            state,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body can be read");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_from(uri, "203.0.113.10").await
    }

    /// GET as the client at `ip`, as seen through a proxy.
    pub async fn get_from(&self, uri: &str, ip: &str) -> TestResponse {
        self.request(
            Request::builder()
                .uri(uri)
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    /// POST a JSON body with an optional bearer token.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.request(builder.body(Body::from(body.to_owned())).expect("valid request"))
            .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Slugs of the product documents in a JSON array.
#[must_use]
pub fn slugs(docs: &Value) -> Vec<String> {
    docs.as_array()
        .map(|docs| {
            docs.iter()
                .filter_map(|d| d["slug"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
