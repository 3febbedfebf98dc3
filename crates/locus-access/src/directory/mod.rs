//! Location directory.
//!
//! The [`LocationDirectoryProvider`] returns the full set of locations. It
//! reads through the [`DirectoryCache`] and only calls the configured
//! [`LocationSource`] on a miss.
//!
//! # Backend failures
//!
//! When the backend cannot be reached (transport error, non-success status,
//! unreadable body) `find_all` returns an **empty** directory and logs a
//! warning. Callers must read an empty directory as "temporarily
//! unavailable", not as "there are no locations". Nothing is cached in that
//! case, so the next call retries the backend.
//!
//! A record that cannot be parsed is a hard error and is returned to the
//! caller.

mod http;
pub mod identity_admin;
pub mod rest;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

pub use identity_admin::{IdentityAdminSource, RoleRepresentation};
pub use rest::RestSource;

use crate::LocationResult;
use crate::cache::DirectoryCache;
use crate::config::{DirectoryBackend, DirectoryConfig};
use crate::record::{Directory, LocationRecord, directory_from};

/// A backend holding the authoritative list of locations.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// Fetches every location.
    ///
    /// # Errors
    ///
    /// `BackendUnavailable` if the backend cannot answer; `MalformedRecord` if
    /// any record fails to convert.
    async fn fetch_all(&self) -> LocationResult<Vec<LocationRecord>>;
}

/// Builds the source selected by configuration.
///
/// # Errors
///
/// Returns a `Configuration` error if the backend settings are incomplete.
pub fn build_source(config: &DirectoryConfig) -> LocationResult<Arc<dyn LocationSource>> {
    let keys = config.custom_attribute_keys.clone();
    let source: Arc<dyn LocationSource> = match &config.backend {
        DirectoryBackend::Rest(rest) => {
            Arc::new(RestSource::new(rest, config.request_timeout, keys)?)
        }
        DirectoryBackend::IdentityAdmin(admin) => Arc::new(IdentityAdminSource::new(
            admin,
            config.request_timeout,
            keys,
        )?),
    };
    tracing::info!(backend = source.name(), "Configured location directory backend");
    Ok(source)
}

/// Produces the full location directory, cached.
#[derive(Clone)]
pub struct LocationDirectoryProvider {
    /// `None` when the directory is disabled.
    source: Option<Arc<dyn LocationSource>>,
    cache: DirectoryCache,
}

impl LocationDirectoryProvider {
    /// Creates a provider reading from `source` through `cache`.
    #[must_use]
    pub fn new(source: Arc<dyn LocationSource>, cache: DirectoryCache) -> Self {
        Self {
            source: Some(source),
            cache,
        }
    }

    /// Creates a provider with no backend; the directory is always empty.
    #[must_use]
    pub fn disabled(cache: DirectoryCache) -> Self {
        Self {
            source: None,
            cache,
        }
    }

    /// Creates a provider from directory configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the enabled backend is misconfigured.
    pub fn from_config(config: &DirectoryConfig, cache: DirectoryCache) -> LocationResult<Self> {
        if !config.enabled {
            tracing::info!("Location directory disabled");
            return Ok(Self::disabled(cache));
        }
        Ok(Self::new(build_source(config)?, cache))
    }

    /// Returns the directory cache.
    #[must_use]
    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Returns every known location keyed by id.
    ///
    /// # Errors
    ///
    /// Returns a `Cache` error if the cache store fails and a
    /// `MalformedRecord` error if the backend returned a corrupt record.
    /// Backend unavailability is not an error: see the module docs.
    pub async fn find_all(&self) -> LocationResult<Directory> {
        if let Some(directory) = self.cache.get().await? {
            return Ok(directory);
        }

        let Some(source) = &self.source else {
            tracing::debug!("Location directory disabled, returning empty directory");
            return Ok(Directory::new());
        };

        match source.fetch_all().await {
            Ok(records) => {
                let directory = directory_from(records);
                tracing::debug!(
                    backend = source.name(),
                    locations = directory.len(),
                    "Loaded location directory"
                );
                self.cache.set(directory).await
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    backend = source.name(),
                    error = %e,
                    "Location directory unavailable, returning empty directory"
                );
                Ok(Directory::new())
            }
            Err(e) => {
                tracing::error!(backend = source.name(), error = %e, "Failed to load location directory");
                Err(e)
            }
        }
    }

    /// Returns the ids of every known location.
    ///
    /// # Errors
    ///
    /// Same as [`find_all`](Self::find_all).
    pub async fn find_all_ids(&self) -> LocationResult<BTreeSet<u64>> {
        Ok(self.find_all().await?.into_keys().collect())
    }

    /// Looks up one location. A missing id is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same as [`find_all`](Self::find_all).
    pub async fn find_by_id(&self, id: u64) -> LocationResult<Option<LocationRecord>> {
        Ok(self.find_all().await?.remove(&id))
    }

    /// Drops the cached directory so the next lookup reloads it.
    ///
    /// # Errors
    ///
    /// Returns a `Cache` error if the store delete fails.
    pub async fn invalidate(&self) -> LocationResult<()> {
        self.cache.invalidate().await
    }

    /// Invalidates the cache and reloads the directory from the backend.
    ///
    /// # Errors
    ///
    /// Same as [`find_all`](Self::find_all).
    pub async fn refresh(&self) -> LocationResult<Directory> {
        self.invalidate().await?;
        self.find_all().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::CacheConfig;
    use crate::error::LocationError;

    /// Source returning a fixed result and counting calls.
    pub(crate) struct CountingSource {
        result: fn() -> LocationResult<Vec<LocationRecord>>,
        pub(crate) calls: AtomicUsize,
    }

    impl CountingSource {
        pub(crate) fn new(result: fn() -> LocationResult<Vec<LocationRecord>>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LocationSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_all(&self) -> LocationResult<Vec<LocationRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    pub(crate) fn three_locations() -> LocationResult<Vec<LocationRecord>> {
        Ok(vec![
            LocationRecord::new(1, "North"),
            LocationRecord::new(2, "South"),
            LocationRecord::new(5, "East"),
        ])
    }

    fn unavailable() -> LocationResult<Vec<LocationRecord>> {
        Err(LocationError::backend_unavailable("counting", "HTTP 500"))
    }

    fn corrupt() -> LocationResult<Vec<LocationRecord>> {
        Err(LocationError::malformed_record("abc", "not a location id"))
    }

    pub(crate) fn provider(
        source: Arc<CountingSource>,
        cache_enabled: bool,
    ) -> (LocationDirectoryProvider, MemoryStore) {
        let store = MemoryStore::new();
        let config = CacheConfig {
            enabled: cache_enabled,
            ..Default::default()
        };
        let cache = DirectoryCache::new(Arc::new(store.clone()), &config);
        (LocationDirectoryProvider::new(source, cache), store)
    }

    #[tokio::test]
    async fn test_warm_cache_skips_backend() {
        let source = CountingSource::new(three_locations);
        let (provider, store) = provider(source.clone(), true);

        let first = provider.find_all().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(store.len(), 1);

        let second = provider.find_all().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_disabled_cache_calls_backend_every_time() {
        let source = CountingSource::new(three_locations);
        let (provider, store) = provider(source.clone(), false);

        provider.find_all().await.unwrap();
        provider.find_all().await.unwrap();
        provider.find_all().await.unwrap();

        assert_eq!(source.calls(), 3);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ids_and_lookup() {
        let source = CountingSource::new(three_locations);
        let (provider, _) = provider(source.clone(), true);

        let ids = provider.find_all_ids().await.unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 5]);

        let south = provider.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(south.name, "South");
        assert!(provider.find_by_id(42).await.unwrap().is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_backend_returns_empty_and_is_not_cached() {
        let source = CountingSource::new(unavailable);
        let (provider, store) = provider(source.clone(), true);

        assert!(provider.find_all().await.unwrap().is_empty());
        assert!(provider.find_by_id(42).await.unwrap().is_none());
        assert!(store.is_empty());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_propagates() {
        let source = CountingSource::new(corrupt);
        let (provider, store) = provider(source, true);

        let err = provider.find_all().await.unwrap_err();
        assert!(matches!(err, LocationError::MalformedRecord { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_reloads() {
        let source = CountingSource::new(three_locations);
        let (provider, _) = provider(source.clone(), true);

        provider.find_all().await.unwrap();
        let refreshed = provider.refresh().await.unwrap();
        assert_eq!(refreshed.len(), 3);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_reload() {
        let source = CountingSource::new(three_locations);
        let store = MemoryStore::new();
        let config = CacheConfig {
            expiration: Duration::from_millis(50),
            ..Default::default()
        };
        let provider = LocationDirectoryProvider::new(
            source.clone(),
            DirectoryCache::new(Arc::new(store), &config),
        );

        provider.find_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.find_all().await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_directory_is_empty() {
        let config = DirectoryConfig {
            enabled: false,
            ..Default::default()
        };
        let cache = DirectoryCache::new(Arc::new(MemoryStore::new()), &CacheConfig::default());
        let provider = LocationDirectoryProvider::from_config(&config, cache).unwrap();
        assert!(provider.find_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_from_config_rejects_incomplete_backend() {
        let cache = DirectoryCache::new(Arc::new(MemoryStore::new()), &CacheConfig::default());
        let result = LocationDirectoryProvider::from_config(&DirectoryConfig::default(), cache);
        assert!(matches!(result, Err(LocationError::Configuration { .. })));
    }
}
