//! Response cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 60;
const DEFAULT_NAMESPACE: &str = "chronicle:http-cache";
const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// Where cached response bodies live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disabling the cache turns every wrapped route into a passthrough.
    pub enabled: bool,
    pub backend: CacheBackend,
    pub ttl_seconds: u64,
    /// Prefix of every key written to the store.
    pub namespace: String,
    /// Maximum entries held by the in-memory backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Redis,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            namespace: DEFAULT_NAMESPACE.to_string(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            backend: settings.backend,
            ttl_seconds: settings.ttl_seconds.get(),
            namespace: settings.namespace.clone(),
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Redis);
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.namespace, "chronicle:http-cache");
        assert_eq!(config.memory_capacity, 1024);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.memory_capacity_non_zero().get(), 1);
    }
}
