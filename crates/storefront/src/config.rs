//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HONEYWELL_HOST` - Bind address (default: 127.0.0.1)
//! - `HONEYWELL_PORT` - Listen port (default: 3000)
//! - `HONEYWELL_CATALOG_PATH` - Catalogue JSON file (default: crates/storefront/content/catalog.json)
//! - `HONEYWELL_CACHE_CAPACITY` - Maximum cached responses (default: 10000)
//! - `SEARCH_RATE_LIMIT_REQUESTS` - Search requests allowed per window per IP (default: 30)
//! - `SEARCH_RATE_LIMIT_WINDOW_SECS` - Search rate limit window (default: 10)
//! - `CACHE_INVALIDATION_SECRET` - Bearer token for the cache invalidation API.
//!   When unset, the invalidation endpoints reject every request.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_INVALIDATION_SECRET_LENGTH: usize = 24;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
///
/// `Debug` output never contains the invalidation secret.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Catalogue document file
    pub catalog_path: PathBuf,
    /// Response cache settings
    pub cache: CacheSettings,
    /// Search endpoint rate limit
    pub search_rate_limit: RateLimitSettings,
    /// Bearer token guarding cache invalidation
    pub cache_invalidation_secret: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Response cache settings.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Maximum number of cached entries
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

/// Sliding window limit: `max_requests` per `window` per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(10),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the invalidation
    /// secret fails validation (placeholder detection, length, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = EnvVars { lookup: &lookup };

        let host = vars.parsed("HONEYWELL_HOST", "127.0.0.1")?;
        let port = vars.parsed("HONEYWELL_PORT", "3000")?;
        let catalog_path = PathBuf::from(
            vars.or_default("HONEYWELL_CATALOG_PATH", "crates/storefront/content/catalog.json"),
        );
        let cache = CacheSettings {
            max_capacity: vars.parsed("HONEYWELL_CACHE_CAPACITY", "10000")?,
        };

        let max_requests: u32 = vars.parsed("SEARCH_RATE_LIMIT_REQUESTS", "30")?;
        if max_requests == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SEARCH_RATE_LIMIT_REQUESTS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let window_secs: u64 = vars.parsed("SEARCH_RATE_LIMIT_WINDOW_SECS", "10")?;
        if window_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SEARCH_RATE_LIMIT_WINDOW_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let search_rate_limit = RateLimitSettings {
            max_requests,
            window: Duration::from_secs(window_secs),
        };

        let cache_invalidation_secret = match vars.optional("CACHE_INVALIDATION_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "CACHE_INVALIDATION_SECRET")?;
                Some(SecretString::from(value))
            }
            None => {
                tracing::warn!("CACHE_INVALIDATION_SECRET not set, cache invalidation API disabled");
                None
            }
        };

        Ok(Self {
            host,
            port,
            catalog_path,
            cache,
            search_rate_limit,
            cache_invalidation_secret,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: vars.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct EnvVars<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvVars<'_, F> {
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default) into `T`.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is long enough, not a placeholder, and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_INVALIDATION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_INVALIDATION_SECRET_LENGTH,
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
