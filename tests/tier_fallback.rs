use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use relaydoc::cache::{
    CacheAsideFetcher, CacheConfig, CacheError, CacheKey, CacheStore, CacheTierSelector,
    DistributedConnector, LocalCache, RedisConnector, Region, SentinelConfig, SentinelNode,
    TierState,
};
use relaydoc::resilience::CallError;

/// Stands in for a distributed cache; the shared `LocalCache` plays the server.
struct SwitchableConnector {
    reachable: AtomicBool,
    connects: AtomicUsize,
    remote: Arc<LocalCache>,
}

impl SwitchableConnector {
    fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(reachable),
            connects: AtomicUsize::new(0),
            remote: Arc::new(LocalCache::new()),
        })
    }
}

#[async_trait]
impl DistributedConnector for SwitchableConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(self.remote.clone() as Arc<dyn CacheStore>)
        } else {
            Err(CacheError::unavailable("connection refused"))
        }
    }
}

fn config() -> CacheConfig {
    CacheConfig {
        probe_timeout: Duration::from_millis(200),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn unreachable_backend_serves_from_local_tier() {
    let connector = SwitchableConnector::new(false);
    let selector = Arc::new(CacheTierSelector::new(config(), connector.clone()));
    let fetcher = CacheAsideFetcher::new(selector.clone(), None);
    let key = CacheKey::new("records").param("all");
    let loads = AtomicUsize::new(0);

    for _ in 0..3 {
        let value: Vec<String> = fetcher
            .fetch(Region::Records, &key, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CallError>(vec!["a".to_string(), "b".to_string()])
            })
            .await
            .expect("loader succeeds");
        assert_eq!(value, vec!["a", "b"]);
    }

    assert_eq!(selector.state(), TierState::LocalFallback);
    assert_eq!(selector.active_tier(), Some("local"));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert!(connector.remote.is_empty());
    assert_eq!(selector.local().len(), 1);
}

#[tokio::test]
async fn reprobe_moves_traffic_to_recovered_backend() {
    let connector = SwitchableConnector::new(false);
    let selector = Arc::new(CacheTierSelector::new(config(), connector.clone()));
    let fetcher = CacheAsideFetcher::new(selector.clone(), None);
    let key = CacheKey::new("completion").param("hello");

    assert_eq!(selector.initialize().await, TierState::LocalFallback);

    connector.reachable.store(true, Ordering::SeqCst);
    assert_eq!(selector.reprobe().await, TierState::DistributedActive);

    let value: String = fetcher
        .fetch(Region::Completions, &key, || async {
            Ok::<_, CallError>("hi".to_string())
        })
        .await
        .expect("loader succeeds");

    assert_eq!(value, "hi");
    assert_eq!(connector.remote.len(), 1);
    assert!(selector.local().is_empty());
}

#[tokio::test]
async fn failed_loads_are_not_cached_on_fallback() {
    let selector = Arc::new(CacheTierSelector::new(config(), SwitchableConnector::new(false)));
    let fetcher = CacheAsideFetcher::new(selector.clone(), None);
    let key = CacheKey::new("record_by_id").param(404);

    let err = fetcher
        .fetch::<String, _, _, _>(Region::RecordsById, &key, || async {
            Err(CallError::upstream(404, "{}"))
        })
        .await
        .expect_err("loader fails");

    assert!(err.is_not_found());
    assert!(selector.local().is_empty());
}

#[tokio::test]
async fn unreachable_sentinels_resolve_to_local_tier() {
    let cache_config = CacheConfig {
        sentinel: Some(SentinelConfig {
            master: "mymaster".to_string(),
            nodes: vec![SentinelNode {
                host: "127.0.0.1".to_string(),
                port: 1,
            }],
        }),
        ..config()
    };
    let connector = RedisConnector::from_config(&cache_config);
    assert_eq!(connector.mode(), "sentinel");

    let selector = CacheTierSelector::new(cache_config, Arc::new(connector));
    assert_eq!(selector.initialize().await, TierState::LocalFallback);
    assert_eq!(selector.active_tier(), Some("local"));
}
