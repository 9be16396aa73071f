use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::keys::{CacheKey, Region};
use super::tier::CacheTierSelector;

const METRIC_CACHE_HIT: &str = "relaydoc_cache_hit_total";
const METRIC_CACHE_MISS: &str = "relaydoc_cache_miss_total";

/// Generic cache-aside wrapper over whichever tier the selector resolved.
///
/// Concurrent misses for one key are not coalesced: each runs its loader and
/// the last write wins. Loader errors are never cached. Backend failures on
/// read or write degrade to a miss or a skipped write.
#[derive(Clone)]
pub struct CacheAsideFetcher {
    selector: Arc<CacheTierSelector>,
    ttl: Option<Duration>,
}

impl CacheAsideFetcher {
    pub fn new(selector: Arc<CacheTierSelector>, ttl: Option<Duration>) -> Self {
        Self { selector, ttl }
    }

    pub fn selector(&self) -> &Arc<CacheTierSelector> {
        &self.selector
    }

    pub async fn fetch<T, E, F, Fut>(&self, region: Region, key: &CacheKey, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let store = self.selector.store().await;

        match store.get(region, key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT, "region" => region.as_str()).increment(1);
                    debug!(
                        target = "relaydoc::cache",
                        region = region.as_str(),
                        key = %key,
                        tier = store.tier(),
                        result = "hit",
                        "Cache hit"
                    );
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        target = "relaydoc::cache",
                        region = region.as_str(),
                        key = %key,
                        tier = store.tier(),
                        result = "corrupt",
                        error = %err,
                        "Discarding undecodable cache entry"
                    );
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(
                    target = "relaydoc::cache",
                    region = region.as_str(),
                    key = %key,
                    tier = store.tier(),
                    result = "read_failed",
                    error = %err,
                    "Cache read failed; treating as miss"
                );
            }
        }

        counter!(METRIC_CACHE_MISS, "region" => region.as_str()).increment(1);
        debug!(
            target = "relaydoc::cache",
            region = region.as_str(),
            key = %key,
            tier = store.tier(),
            result = "miss",
            "Cache miss"
        );

        let value = loader().await?;

        match serde_json::to_vec(&value) {
            Ok(encoded) => {
                if let Err(err) = store.set(region, key, Bytes::from(encoded), self.ttl).await {
                    warn!(
                        target = "relaydoc::cache",
                        region = region.as_str(),
                        key = %key,
                        tier = store.tier(),
                        result = "write_failed",
                        error = %err,
                        "Cache write failed; value served uncached"
                    );
                }
            }
            Err(err) => {
                warn!(
                    target = "relaydoc::cache",
                    region = region.as_str(),
                    key = %key,
                    result = "encode_failed",
                    error = %err,
                    "Value could not be encoded for caching"
                );
            }
        }

        Ok(value)
    }
}
