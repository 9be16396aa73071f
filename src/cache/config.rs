//! Cache configuration.
//!
//! Chooses the cache backend and tunes the distributed-cache probe.

use std::time::Duration;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Which tier the process should try to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Probe Redis at startup and fall back to the local cache if unreachable.
    Redis,
    /// Skip the probe and always use the local in-process cache.
    Memory,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackend::Redis => "redis",
            CacheBackend::Memory => "memory",
        }
    }
}

/// A sentinel address as given in `cache.sentinel_nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelNode {
    pub host: String,
    pub port: u16,
}

impl SentinelNode {
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// Master discovery through Redis Sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelConfig {
    pub master: String,
    pub nodes: Vec<SentinelNode>,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Standalone address, used when `sentinel` is `None`.
    pub redis_url: String,
    pub sentinel: Option<SentinelConfig>,
    /// Upper bound on connect + PING during a probe.
    pub probe_timeout: Duration,
    /// Expiration applied by the distributed tier. `None` keeps entries until evicted.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            sentinel: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            ttl: None,
        }
    }
}

impl CacheConfig {
    pub fn memory() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ..Self::default()
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            sentinel: settings.sentinel.clone(),
            probe_timeout: settings.probe_timeout,
            ttl: settings.ttl,
        }
    }
}
