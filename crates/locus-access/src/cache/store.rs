//! Key-value stores backing the directory cache.
//!
//! - [`MemoryStore`]: in-process `DashMap` with per-entry expiry
//! - [`RedisStore`]: shared Redis instance, expiry delegated to `SET EX`

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::LocationResult;

/// Generic byte-oriented key-value store with TTL.
///
/// A missing or expired key is `Ok(None)`; errors are reserved for store
/// failures.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, key: &str) -> LocationResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> LocationResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> LocationResult<()>;

    /// Store name for logs.
    fn name(&self) -> &'static str;
}

/// A stored value with its expiry.
#[derive(Clone, Debug)]
struct StoredEntry {
    data: Arc<Vec<u8>>,
    stored_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Single-instance store using a local `DashMap`.
///
/// Expired entries are dropped lazily on read.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> LocationResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.as_ref().clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> LocationResult<()> {
        self.entries
            .insert(key.to_string(), StoredEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> LocationResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Multi-instance store backed by a Redis connection pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> LocationResult<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> LocationResult<()> {
        let mut conn = self.pool.get().await?;
        // SET EX rejects 0; round sub-second TTLs up.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        tracing::debug!(key = %key, ttl_secs, "Redis SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> LocationResult<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
