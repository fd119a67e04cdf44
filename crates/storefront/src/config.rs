//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Without one, documents and sessions are kept in memory.
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:3000`);
//!   an `https://` URL enables secure cookies
//! - `STOREFRONT_CATALOG_PATH` - Catalog collection listed by `/products`
//!   (default: `kids/closes/Boys Pullovers`)
//! - `STOREFRONT_CATALOG_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `STOREFRONT_IDENTITY_SECRET` - Secret shared with the identity provider
//!   for signing shopper ids (at least 32 characters). Without one,
//!   `POST /session/identity` is disabled.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use souq_core::CollectionPath;

/// Catalog collection listed when none is configured.
pub const DEFAULT_CATALOG_PATH: &str = "kids/closes/Boys Pullovers";

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const MIN_IDENTITY_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog collection served by the product listing
    pub catalog_collection: CollectionPath,
    /// How long a catalog listing stays cached
    pub catalog_ttl: Duration,
    /// Key for shopper identity signatures
    pub identity_secret: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_collection: default_catalog_collection(),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            identity_secret: None,
            sentry_dsn: None,
            sentry_environment: None,
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
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(&vars, "STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default(&vars, "STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default(&vars, "STOREFRONT_BASE_URL", DEFAULT_BASE_URL);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_BASE_URL".to_string(),
                "must start with http:// or https://".to_string(),
            ));
        }

        let catalog_collection =
            CollectionPath::parse(&get_env_or_default(&vars, "STOREFRONT_CATALOG_PATH", DEFAULT_CATALOG_PATH))
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("STOREFRONT_CATALOG_PATH".to_string(), e.to_string())
                })?;
        let catalog_ttl = get_env_or_default(&vars, "STOREFRONT_CATALOG_TTL_SECS", "300")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "STOREFRONT_CATALOG_TTL_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        let identity_secret = get_optional_env(&vars, "STOREFRONT_IDENTITY_SECRET");
        if identity_secret
            .as_ref()
            .is_some_and(|secret| secret.len() < MIN_IDENTITY_SECRET_LENGTH)
        {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_IDENTITY_SECRET".to_string(),
                format!("must be at least {MIN_IDENTITY_SECRET_LENGTH} characters"),
            ));
        }

        Ok(Self {
            database_url: get_database_url(&vars, "STOREFRONT_DATABASE_URL"),
            host,
            port,
            base_url,
            catalog_collection,
            catalog_ttl,
            identity_secret: identity_secret.map(SecretString::from),
            sentry_dsn: get_optional_env(&vars, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&vars, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Database URL for tools that cannot run without one.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `STOREFRONT_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn require_database_url(config: &StorefrontConfig) -> Result<SecretString, ConfigError> {
    config
        .database_url
        .clone()
        .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))
}

fn default_catalog_collection() -> CollectionPath {
    CollectionPath::parse(DEFAULT_CATALOG_PATH).expect("Invalid default catalog path")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    vars(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(vars: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(vars, key).unwrap_or_else(|| default.to_string())
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(vars: &impl Fn(&str) -> Option<String>, primary_key: &str) -> Option<SecretString> {
    get_optional_env(vars, primary_key)
        .or_else(|| get_optional_env(vars, "DATABASE_URL"))
        .map(SecretString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.catalog_collection.to_string(), DEFAULT_CATALOG_PATH);
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_default_impl_matches_empty_environment() {
        let loaded = load(&[]).unwrap();
        let default = StorefrontConfig::default();
        assert_eq!(loaded.socket_addr(), default.socket_addr());
        assert_eq!(loaded.catalog_collection, default.catalog_collection);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fallback/db"
        );

        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("STOREFRONT_DATABASE_URL", "postgres://primary/db"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://primary/db"
        );
    }

    #[test]
    fn test_require_database_url() {
        let config = load(&[]).unwrap();
        assert!(matches!(
            require_database_url(&config),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[("STOREFRONT_PORT", "not-a-port")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_invalid_catalog_path() {
        // A document path (even segment count) is not a collection.
        let result = load(&[("STOREFRONT_CATALOG_PATH", "kids/closes")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_https_enables_secure_cookies() {
        let config = load(&[("STOREFRONT_BASE_URL", "https://souq.example")]).unwrap();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_identity_secret() {
        assert!(load(&[]).unwrap().identity_secret.is_none());

        let secret = "k".repeat(32);
        let config = load(&[("STOREFRONT_IDENTITY_SECRET", secret.as_str())]).unwrap();
        assert_eq!(config.identity_secret.unwrap().expose_secret(), secret);

        let result = load(&[("STOREFRONT_IDENTITY_SECRET", "short")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_IDENTITY_SECRET"));
    }

    #[test]
    fn test_base_url_requires_scheme() {
        assert!(load(&[("STOREFRONT_BASE_URL", "souq.example")]).is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("STOREFRONT_DATABASE_URL", "postgres://user:hunter2@db/souq")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
