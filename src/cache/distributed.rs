//! Distributed tier backed by Redis.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionLike, ConnectionManager},
    sentinel::{SentinelClient, SentinelServerType},
};

use super::config::{CacheConfig, SentinelConfig};
use super::error::CacheError;
use super::keys::{CacheKey, Region};
use super::store::CacheStore;

/// Opens the distributed tier. Returning `Ok` means the backend answered a
/// liveness check; any failure is a fallback signal.
#[async_trait]
pub trait DistributedConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheError>;
}

/// Redis-backed store over any cloneable async connection.
pub struct RedisCache<C = ConnectionManager> {
    conn: C,
}

impl RedisCache<ConnectionManager> {
    pub async fn open(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Self::ping(conn).await
    }
}

impl<C> RedisCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    /// Wraps `conn` once it answers `PING`.
    pub async fn ping(mut conn: C) -> Result<Self, CacheError> {
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(CacheError::unavailable(format!(
                "unexpected PING reply `{pong}`"
            )));
        }
        Ok(Self { conn })
    }
}

#[async_trait]
impl<C> CacheStore for RedisCache<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    fn tier(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, region: Region, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key.qualified(region)).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(
        &self,
        region: Region,
        key: &CacheKey,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let qualified = key.qualified(region);
        match ttl {
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(qualified, value.as_ref(), seconds).await?;
            }
            None => {
                let _: () = conn.set(qualified, value.as_ref()).await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RedisTarget {
    Standalone(String),
    Sentinel(SentinelConfig),
}

/// Connects to Redis either at a fixed URL or through the master that a set
/// of sentinels currently reports.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    target: RedisTarget,
}

impl RedisConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            target: RedisTarget::Standalone(url.into()),
        }
    }

    pub fn sentinel(config: SentinelConfig) -> Self {
        Self {
            target: RedisTarget::Sentinel(config),
        }
    }

    /// Sentinel discovery when a master is configured, else the standalone URL.
    pub fn from_config(config: &CacheConfig) -> Self {
        match &config.sentinel {
            Some(sentinel) => Self::sentinel(sentinel.clone()),
            None => Self::new(config.redis_url.clone()),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self.target {
            RedisTarget::Standalone(_) => "standalone",
            RedisTarget::Sentinel(_) => "sentinel",
        }
    }
}

#[async_trait]
impl DistributedConnector for RedisConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheError> {
        match &self.target {
            RedisTarget::Standalone(url) => {
                let cache = RedisCache::open(url).await?;
                Ok(Arc::new(cache))
            }
            RedisTarget::Sentinel(config) => {
                if config.nodes.is_empty() {
                    return Err(CacheError::unavailable("no sentinel nodes configured"));
                }
                let nodes: Vec<String> = config.nodes.iter().map(|node| node.url()).collect();
                let mut client = SentinelClient::build(
                    nodes,
                    config.master.clone(),
                    None,
                    SentinelServerType::Master,
                )?;
                let conn = client.get_async_connection().await?;
                let cache = RedisCache::ping(conn).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}
