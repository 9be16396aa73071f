//! Two-tier caching.
//!
//! A [`CacheTierSelector`] decides once per process (or on explicit re-probe)
//! whether traffic goes to Redis or to a local in-process map. The
//! [`CacheAsideFetcher`] serves every cached read through whatever tier was
//! chosen.
//!
//! ```toml
//! [cache]
//! backend = "redis"          # or "memory"
//! sentinel_master = "mymaster"   # "" connects to `redis_url` directly
//! sentinel_nodes = "localhost:26379,localhost:26380"
//! redis_url = "redis://127.0.0.1:6379"
//! probe_timeout_ms = 2000
//! ```

mod config;
mod distributed;
mod error;
mod fetcher;
mod keys;
mod lock;
mod store;
mod tier;

pub use config::{CacheBackend, CacheConfig, SentinelConfig, SentinelNode};
pub use distributed::{DistributedConnector, RedisCache, RedisConnector};
pub use error::CacheError;
pub use fetcher::CacheAsideFetcher;
pub use keys::{CacheKey, Region};
pub use store::{CacheStore, LocalCache};
pub use tier::{CacheTierSelector, TierState};
