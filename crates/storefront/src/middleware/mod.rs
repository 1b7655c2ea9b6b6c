//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting (governor, `/api` routes except search)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{api_rate_limiter, client_ip};
pub use request_id::request_id_middleware;
