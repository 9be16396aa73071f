//! Cache storage backends.
//!
//! `LocalCache` is the in-process tier; `RedisCache` lives in `distributed.rs`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::error::CacheError;
use super::keys::{CacheKey, Region};

/// Key/value storage addressed by region and key. Values are opaque bytes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short label used in logs and the tier report.
    fn tier(&self) -> &'static str;

    async fn get(&self, region: Region, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    async fn set(
        &self,
        region: Region,
        key: &CacheKey,
        value: Bytes,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;
}

/// Process-local, non-shared cache. Concurrent writes are last-write-wins and
/// entries never expire.
#[derive(Debug, Default)]
pub struct LocalCache {
    entries: DashMap<(Region, CacheKey), Bytes>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for LocalCache {
    fn tier(&self) -> &'static str {
        "local"
    }

    async fn get(&self, region: Region, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Ok(self
            .entries
            .get(&(region, key.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn set(
        &self,
        region: Region,
        key: &CacheKey,
        value: Bytes,
        _ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.entries.insert((region, key.clone()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn regions_are_disjoint() {
        let cache = LocalCache::new();
        let key = CacheKey::new("op").param(1);

        cache
            .set(Region::RecordsById, &key, Bytes::from_static(b"a"), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get(Region::RecordsById, &key).await.unwrap(),
            Some(Bytes::from_static(b"a"))
        );
        assert_eq!(cache.get(Region::Generic, &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = LocalCache::new();
        let key = CacheKey::new("op");

        cache
            .set(Region::Records, &key, Bytes::from_static(b"first"), None)
            .await
            .unwrap();
        cache
            .set(Region::Records, &key, Bytes::from_static(b"second"), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get(Region::Records, &key).await.unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        assert_eq!(cache.len(), 1);
    }
}
