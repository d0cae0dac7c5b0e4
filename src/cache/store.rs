//! Cache storage boundary.
//!
//! [`CacheStore`] is the key-value contract the response cache relies on.
//! Redis backs it in production (see `infra::redis`); [`MemoryCacheStore`]
//! is an LRU with per-entry expiry used by tests and single-node setups.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache connection unavailable: {0}")]
    Pool(String),
    #[error("cache command failed: {0}")]
    Command(String),
    #[error("invalid expiry {0:?}")]
    InvalidExpiry(Duration),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` is a miss; callers treat errors the same way.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheStoreError>;

    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheStoreError>;

    /// Stores `value` so that it stops being served after `ttl`.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheStoreError>;
}

struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(&self, key: &str, value: Bytes, expires_at: Option<Instant>) {
        mutex_lock(&self.entries, SOURCE, "put").put(key.to_string(), Entry { value, expires_at });
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheStoreError> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheStoreError> {
        self.put(key, value, None);
        Ok(())
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        if ttl.is_zero() {
            return Err(CacheStoreError::InvalidExpiry(ttl));
        }
        self.put(key, value, Some(Instant::now() + ttl));
        Ok(())
    }
}
