//! Chronicle response cache
//!
//! Cache-aside layer in front of the read endpoints. Stored values are the
//! exact JSON bodies the handlers produced, keyed by a normalized form of the
//! request and expired by TTL only.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! ttl_seconds = 60
//! ```

mod capture;
mod config;
mod keys;
mod lock;
mod metrics;
mod middleware;
mod store;

pub use capture::WriteThrough;
pub use config::{CacheBackend, CacheConfig};
pub use keys::{CacheKeyBuilder, KEY_PARAMS, raw_key};
pub use metrics::{
    METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MISS_TOTAL,
    METRIC_CACHE_WRITE_TOTAL,
};
pub use middleware::{CacheState, response_cache_layer};
pub use store::{CacheStore, CacheStoreError, MemoryCacheStore};
