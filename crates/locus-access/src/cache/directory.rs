//! Read-through cache for the location directory.
//!
//! The whole `{id -> LocationRecord}` map is stored as one JSON value under
//! `<key_prefix>locations_by_id`. Writes are a single store call, so a
//! cancelled or failed fetch never leaves a partial directory behind.

use std::sync::Arc;
use std::time::Duration;

use crate::LocationResult;
use crate::cache::store::CacheStore;
use crate::config::CacheConfig;
use crate::record::Directory;

/// Cache wrapper storing the full directory under one key.
#[derive(Clone)]
pub struct DirectoryCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
    key: String,
    ttl: Duration,
}

impl DirectoryCache {
    /// Creates a directory cache over `store` using the given configuration.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            enabled: config.enabled,
            key: config.directory_key(),
            ttl: config.expiration,
        }
    }

    /// Returns `true` if caching is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The key the directory is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the cached directory.
    ///
    /// `None` when caching is disabled, the entry is missing, or it expired.
    /// An entry that no longer deserializes is removed and reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns a `Cache` error if the store fails.
    pub async fn get(&self) -> LocationResult<Option<Directory>> {
        if !self.enabled {
            return Ok(None);
        }

        let Some(bytes) = self.store.get(&self.key).await? else {
            tracing::debug!(key = %self.key, store = self.store.name(), "Directory cache miss");
            return Ok(None);
        };

        match serde_json::from_slice::<Directory>(&bytes) {
            Ok(directory) => {
                tracing::trace!(
                    key = %self.key,
                    locations = directory.len(),
                    "Directory cache hit"
                );
                Ok(Some(directory))
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "Discarding undecodable directory cache entry"
                );
                self.store.delete(&self.key).await?;
                Ok(None)
            }
        }
    }

    /// Writes the directory and returns it unchanged.
    ///
    /// Pass-through without a write when caching is disabled.
    ///
    /// # Errors
    ///
    /// Returns a `Cache` error if serialization or the store write fails.
    pub async fn set(&self, directory: Directory) -> LocationResult<Directory> {
        if !self.enabled {
            return Ok(directory);
        }

        let bytes = serde_json::to_vec(&directory).map_err(|e| {
            crate::error::LocationError::cache(format!("failed to serialize directory: {e}"))
        })?;
        self.store.set(&self.key, bytes, self.ttl).await?;

        tracing::debug!(
            key = %self.key,
            locations = directory.len(),
            ttl = ?self.ttl,
            "Cached location directory"
        );
        Ok(directory)
    }

    /// Removes the cached directory.
    ///
    /// # Errors
    ///
    /// Returns a `Cache` error if the store delete fails.
    pub async fn invalidate(&self) -> LocationResult<()> {
        self.store.delete(&self.key).await?;
        tracing::debug!(key = %self.key, "Invalidated directory cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::record::{LocationRecord, directory_from};

    fn sample() -> Directory {
        directory_from([
            LocationRecord::new(1, "North"),
            LocationRecord::new(2, "South"),
        ])
    }

    fn cache_with(store: &MemoryStore, enabled: bool) -> DirectoryCache {
        let config = CacheConfig {
            enabled,
            key_prefix: "t1:".to_string(),
            ..Default::default()
        };
        DirectoryCache::new(Arc::new(store.clone()), &config)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = MemoryStore::new();
        let cache = cache_with(&store, true);

        assert!(cache.get().await.unwrap().is_none());

        let written = cache.set(sample()).await.unwrap();
        assert_eq!(written, sample());
        assert_eq!(cache.get().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_deterministic_key() {
        let store = MemoryStore::new();
        let cache = cache_with(&store, true);
        assert_eq!(cache.key(), "t1:locations_by_id");

        cache.set(sample()).await.unwrap();
        assert!(store.get("t1:locations_by_id").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_disabled_is_pass_through() {
        let store = MemoryStore::new();
        let cache = cache_with(&store, false);

        let returned = cache.set(sample()).await.unwrap();
        assert_eq!(returned, sample());
        assert!(store.is_empty());
        assert!(cache.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let store = MemoryStore::new();
        let cache = cache_with(&store, true);
        cache.set(sample()).await.unwrap();

        cache.invalidate().await.unwrap();
        assert!(cache.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        let cache = cache_with(&store, true);
        store
            .set(cache.key(), b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.get().await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = MemoryStore::new();
        let config = CacheConfig {
            expiration: Duration::from_millis(50),
            ..Default::default()
        };
        let cache = DirectoryCache::new(Arc::new(store), &config);
        cache.set(sample()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get().await.unwrap().is_none());
    }
}
