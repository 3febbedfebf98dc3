//! Directory caching.
//!
//! ```text
//! find_all → DirectoryCache → CacheStore (memory | redis) → backend on miss
//! ```
//!
//! The store is chosen by `cache.store`. Unlike a best-effort response cache,
//! store failures are reported to the caller: a directory read that cannot
//! reach the cache is an infrastructure error, not an empty result.

pub mod directory;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

pub use directory::DirectoryCache;
pub use store::{CacheStore, MemoryStore, RedisStore};

use crate::LocationResult;
use crate::config::{CacheConfig, CacheStoreKind, RedisConfig};
use crate::error::LocationError;

/// Creates the cache store selected by configuration.
///
/// Redis connectivity is checked once so a bad URL fails at startup rather
/// than on the first request.
///
/// # Errors
///
/// Returns a `Configuration` error if the Redis pool cannot be created, or a
/// `Cache` error if the initial connection fails.
pub async fn create_store(config: &CacheConfig) -> LocationResult<Arc<dyn CacheStore>> {
    match config.store {
        CacheStoreKind::Memory => {
            tracing::info!("Using in-memory directory cache store");
            Ok(Arc::new(MemoryStore::new()))
        }
        CacheStoreKind::Redis => {
            let pool = create_redis_pool(&config.redis)?;
            pool.get().await?;
            tracing::info!(url = %config.redis.url, "Connected to Redis directory cache store");
            Ok(Arc::new(RedisStore::new(pool)))
        }
    }
}

fn create_redis_pool(config: &RedisConfig) -> LocationResult<deadpool_redis::Pool> {
    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let timeout = Duration::from_millis(config.timeout_ms);
    let pool_config = redis_config
        .pool
        .get_or_insert_with(|| deadpool_redis::PoolConfig::new(config.pool_size));
    pool_config.max_size = config.pool_size;
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);

    redis_config
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| LocationError::configuration(format!("failed to create Redis pool: {e}")))
}
