//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `EASYTRADE_HOST` - Bind address (default: 127.0.0.1)
//! - `EASYTRADE_PORT` - Listen port (default: 3000)
//! - `EASYTRADE_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>).
//!   An `https` URL turns on secure session cookies.
//! - `EASYTRADE_API_BASE_URL` - Marketplace API root (default: <http://localhost:8080>)
//! - `EASYTRADE_API_TIMEOUT_SECS` - Per-request timeout for API calls (default: 10)
//! - `EASYTRADE_PAGE_SIZE` - Products per page in paginated views (default: 6)
//! - `EASYTRADE_LATEST_LIMIT` - Products in "latest" sections (default: 5)
//! - `EASYTRADE_CACHE_TTL_SECS` - Lifetime of cached API reads (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Marketplace API client configuration
    pub api: ApiConfig,
    /// Listing sizes for catalog views
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Marketplace API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, e.g. `http://localhost:8080`
    pub base_url: Url,
    /// Timeout applied to every API request
    pub timeout: Duration,
    /// How long cached reads are served before refetching
    pub cache_ttl: Duration,
}

/// Page sizes used by catalog and dashboard views.
#[derive(Debug, Clone, Copy)]
pub struct CatalogConfig {
    pub page_size: u32,
    pub latest_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 6,
            latest_limit: 5,
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with default timeouts.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
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
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or("EASYTRADE_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("EASYTRADE_PORT", 3000)?;
        let base_url = env.or_default("EASYTRADE_BASE_URL", "http://localhost:3000");

        let api_base_url = env.or_default("EASYTRADE_API_BASE_URL", "http://localhost:8080");
        let api_base_url = Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("EASYTRADE_API_BASE_URL".to_string(), e.to_string())
        })?;
        let api = ApiConfig {
            base_url: api_base_url,
            timeout: Duration::from_secs(env.parse_or("EASYTRADE_API_TIMEOUT_SECS", 10)?),
            cache_ttl: Duration::from_secs(env.parse_or("EASYTRADE_CACHE_TTL_SECS", 60)?),
        };

        let defaults = CatalogConfig::default();
        let catalog = CatalogConfig {
            page_size: env.positive_or("EASYTRADE_PAGE_SIZE", defaults.page_size)?,
            latest_limit: env.positive_or("EASYTRADE_LATEST_LIMIT", defaults.latest_limit)?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            api,
            catalog,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn positive_or(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        match self.parse_or(key, default)? {
            0 => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            )),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.catalog.page_size, 6);
        assert_eq!(config.catalog.latest_limit, 5);
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("EASYTRADE_PORT", "8000"),
            ("EASYTRADE_BASE_URL", "https://shop.easytrade.co.za"),
            ("EASYTRADE_API_BASE_URL", "http://api.internal:9090"),
            ("EASYTRADE_PAGE_SIZE", "12"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .unwrap();
        assert_eq!(config.port, 8000);
        assert!(config.is_secure());
        assert_eq!(config.api.base_url.port(), Some(9090));
        assert_eq!(config.catalog.page_size, 12);
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("EASYTRADE_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "EASYTRADE_PORT"));
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(load(&[("EASYTRADE_API_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(load(&[("EASYTRADE_PAGE_SIZE", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = load(&[("EASYTRADE_HOST", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert!(config.sentry_dsn.is_none());
    }
}
