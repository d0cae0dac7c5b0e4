//! Redis-backed [`CacheStore`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{Config, Pool, PoolError, Runtime};
use redis::{AsyncCommands, RedisError};
use tracing::debug;

use crate::cache::{CacheStore, CacheStoreError};

use super::error::InfraError;

impl From<RedisError> for CacheStoreError {
    fn from(err: RedisError) -> Self {
        Self::Command(err.to_string())
    }
}

impl From<PoolError> for CacheStoreError {
    fn from(err: PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool for `url`. No connection is opened yet.
    pub fn connect(url: &str) -> Result<Self, InfraError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| InfraError::cache(format!("failed to create redis pool: {err}")))?;
        Ok(Self::new(pool))
    }

    pub async fn ping(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheStoreError> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheStoreError> {
        let mut conn = self.pool.get().await?;
        conn.set::<_, _, ()>(key, value.as_ref()).await?;
        Ok(())
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Err(CacheStoreError::InvalidExpiry(ttl));
        }

        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value.as_ref(), seconds).await?;
        debug!(key, ttl_seconds = seconds, "stored cache entry");
        Ok(())
    }
}
