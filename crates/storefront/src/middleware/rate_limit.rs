//! Rate limiting middleware using governor and `tower_governor`.
//!
//! `api_rate_limiter` guards the catalogue and cache endpoints (~100/min per
//! IP). Search has its own stricter per-IP quota with response headers; see
//! [`crate::search::SearchRateLimiter`].

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Address used when no proxy header names the client.
pub const FALLBACK_CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// =============================================================================
// Client IP resolution
// =============================================================================

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Resolve the client IP from proxy headers.
///
/// Checks the first `X-Forwarded-For` entry, then `X-Real-IP`,
/// `CF-Connecting-IP` and `Fly-Client-IP`, and falls back to
/// [`FALLBACK_CLIENT_IP`].
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> IpAddr {
    // Try X-Forwarded-For (first IP in the chain)
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    header_ip(headers, "x-real-ip")
        .or_else(|| header_ip(headers, "cf-connecting-ip"))
        .or_else(|| header_ip(headers, "fly-client-ip"))
        .unwrap_or(FALLBACK_CLIENT_IP)
}

/// Key extractor keyed on [`client_ip`].
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(client_ip(req.headers()))
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for general API: ~100 requests per minute per IP.
///
/// Configuration: 1 request every 600 ms (replenish), burst of 100.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_millisecond(600)` and `burst_size(100)`), which are always
/// accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(600) // ~100 per minute
        .burst_size(100)
        .finish()
        .expect("rate limiter config with per_millisecond(600) and burst_size(100) is valid");
    GovernorLayer::new(Arc::new(config))
}
