//! Location access configuration.
//!
//! All options live under four sections: `cache`, `directory`, `grants` and
//! `logging`. Every section has defaults, so an empty file is a valid
//! configuration as long as the selected directory backend is filled in.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LocationError;

/// Suffix appended to the configured prefix to form the directory cache key.
pub const DIRECTORY_CACHE_KEY: &str = "locations_by_id";

/// Root configuration for the location access subsystem.
///
/// # Example (TOML)
///
/// ```toml
/// [cache]
/// enabled = true
/// key_prefix = "acme:"
/// expiration = "5m"
///
/// [directory.backend]
/// kind = "identity_admin"
/// admin_base_url = "https://idp.example.com/admin/realms/acme"
/// internal_client_id = "0b7c2a8e"
///
/// [grants]
/// claim_name = "location_grants"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationAccessConfig {
    /// Directory cache configuration.
    pub cache: CacheConfig,

    /// Directory backend configuration.
    pub directory: DirectoryConfig,

    /// Grant claim configuration.
    pub grants: GrantsConfig,

    /// Logging configuration (consumed by binaries).
    pub logging: LoggingConfig,
}

impl LocationAccessConfig {
    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the TOML is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, LocationError> {
        toml::from_str(content)
            .map_err(|e| LocationError::configuration(format!("invalid configuration: {e}")))
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the file cannot be read, parsed or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LocationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LocationError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Backend settings are only checked when the directory is enabled.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error describing the first invalid option.
    pub fn validate(&self) -> Result<(), LocationError> {
        if self.cache.enabled && self.cache.expiration.is_zero() {
            return Err(LocationError::configuration(
                "cache.expiration must be > 0 when the cache is enabled",
            ));
        }
        if self.cache.enabled && self.cache.store == CacheStoreKind::Redis {
            self.cache.redis.validate()?;
        }

        if self.directory.enabled {
            self.directory.backend.validate()?;
        }

        if self.grants.claim_name.trim().is_empty() {
            return Err(LocationError::configuration(
                "grants.claim_name must not be empty",
            ));
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(LocationError::configuration(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Which key-value store backs the directory cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStoreKind {
    /// In-process store, one copy per instance.
    #[default]
    Memory,
    /// Shared Redis store.
    Redis,
}

/// Directory cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the cache. When disabled every lookup goes to the backend.
    pub enabled: bool,

    /// Store implementation.
    pub store: CacheStoreKind,

    /// Prefix prepended to the cache key (tenant or deployment namespace).
    pub key_prefix: String,

    /// Time-to-live of the cached directory.
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,

    /// Redis connection settings, used when `store = "redis"`.
    pub redis: RedisConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: CacheStoreKind::Memory,
            key_prefix: "locus:".to_string(),
            expiration: Duration::from_secs(300), // 5 minutes
            redis: RedisConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Returns the deterministic key the directory is stored under.
    #[must_use]
    pub fn directory_key(&self) -> String {
        format!("{}{}", self.key_prefix, DIRECTORY_CACHE_KEY)
    }
}

/// Redis connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379").
    pub url: String,

    /// Connection pool size.
    pub pool_size: usize,

    /// Pool wait/create/recycle timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            timeout_ms: 5000,
        }
    }
}

impl RedisConfig {
    fn validate(&self) -> Result<(), LocationError> {
        if self.url.trim().is_empty() {
            return Err(LocationError::configuration("cache.redis.url is required"));
        }
        if self.pool_size == 0 {
            return Err(LocationError::configuration(
                "cache.redis.pool_size must be > 0",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Directory
// =============================================================================

/// Directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Enable the directory. When disabled the directory is always empty.
    pub enabled: bool,

    /// HTTP request timeout for backend calls.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Allow-list of custom attribute keys copied onto each location,
    /// in the order they should appear.
    pub custom_attribute_keys: Vec<String>,

    /// The backend the directory is loaded from.
    pub backend: DirectoryBackend,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout: Duration::from_secs(10),
            custom_attribute_keys: Vec::new(),
            backend: DirectoryBackend::default(),
        }
    }
}

/// Directory backend selection, resolved once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryBackend {
    /// A REST service returning location objects.
    Rest(RestSourceConfig),
    /// An identity provider admin API modelling locations as client roles.
    IdentityAdmin(IdentityAdminConfig),
}

impl Default for DirectoryBackend {
    fn default() -> Self {
        Self::Rest(RestSourceConfig::default())
    }
}

impl DirectoryBackend {
    /// Returns the backend name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rest(_) => "rest",
            Self::IdentityAdmin(_) => "identity_admin",
        }
    }

    fn validate(&self) -> Result<(), LocationError> {
        match self {
            Self::Rest(rest) => {
                require_url("directory.backend.base_url", &rest.base_url)?;
                if !rest.path.is_empty() && !rest.path.starts_with('/') {
                    return Err(LocationError::configuration(
                        "directory.backend.path must start with '/'",
                    ));
                }
            }
            Self::IdentityAdmin(admin) => {
                require_url("directory.backend.admin_base_url", &admin.admin_base_url)?;
                if admin.internal_client_id.trim().is_empty() {
                    return Err(LocationError::configuration(
                        "directory.backend.internal_client_id is required",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// REST backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestSourceConfig {
    /// Base URL of the location service (e.g., "https://inventory.example.com").
    pub base_url: String,

    /// Path of the list endpoint, appended to `base_url`.
    pub path: String,

    /// Optional static bearer token sent with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for RestSourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: "/locations".to_string(),
            bearer_token: None,
        }
    }
}

/// Identity provider admin API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityAdminConfig {
    /// Admin API base URL, including the realm
    /// (e.g., "https://idp.example.com/admin/realms/acme").
    pub admin_base_url: String,

    /// Internal id of the client whose roles model the locations.
    pub internal_client_id: String,

    /// Optional static bearer token sent with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

fn require_url(option: &str, value: &str) -> Result<(), LocationError> {
    if value.trim().is_empty() {
        return Err(LocationError::configuration(format!("{option} is required")));
    }
    Url::parse(value)
        .map_err(|e| LocationError::configuration(format!("{option} is not a valid URL: {e}")))?;
    Ok(())
}

// =============================================================================
// Grants and logging
// =============================================================================

/// Grant claim configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GrantsConfig {
    /// Name of the token claim carrying the base64 grant bit-vector.
    pub claim_name: String,
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            claim_name: "location_grants".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
