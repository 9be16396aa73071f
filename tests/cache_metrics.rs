use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::prelude::*;
use metrics_util::debugging::DebuggingRecorder;
use relaydoc::cache::{
    CacheAsideFetcher, CacheConfig, CacheError, CacheKey, CacheStore, CacheTierSelector,
    DistributedConnector, Region,
};
use relaydoc::resilience::{CallError, RequestDescriptor, ResilientClient, RetryPolicy};
use url::Url;

struct Unreachable;

#[async_trait]
impl DistributedConnector for Unreachable {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

#[tokio::test]
async fn gateway_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Fallback, miss, then hit.
    let selector = Arc::new(CacheTierSelector::new(
        CacheConfig::default(),
        Arc::new(Unreachable),
    ));
    let fetcher = CacheAsideFetcher::new(selector, None);
    let key = CacheKey::new("metrics").param(1);
    for _ in 0..2 {
        let value: u32 = fetcher
            .fetch(Region::Generic, &key, || async { Ok::<_, CallError>(7) })
            .await
            .expect("loader succeeds");
        assert_eq!(value, 7);
    }

    // One upstream attempt.
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ping");
            then.status(200).body("{}");
        })
        .await;
    let client = ResilientClient::new(
        reqwest::Client::new(),
        "content",
        Url::parse(&server.base_url()).expect("mock server url"),
        Duration::from_secs(5),
        RetryPolicy::none(),
    );
    client
        .execute(&RequestDescriptor::get("ping", "ping"))
        .await
        .expect("mock upstream answers");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "relaydoc_cache_fallback_total",
        "relaydoc_cache_miss_total",
        "relaydoc_cache_hit_total",
        "relaydoc_upstream_attempt_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
