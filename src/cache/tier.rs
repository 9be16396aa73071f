//! Cache tier selection.
//!
//! The process makes one global choice between the distributed tier and the
//! local in-process tier. The choice is made by an explicit probe whose
//! failure branch builds the fallback; it is only revisited by `reprobe`.

use std::sync::{Arc, RwLock};

use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use super::config::{CacheBackend, CacheConfig};
use super::error::CacheError;
use super::lock::{rw_read, rw_write};
use super::distributed::DistributedConnector;
use super::store::{CacheStore, LocalCache};

const SOURCE: &str = "cache::tier";
const METRIC_CACHE_FALLBACK: &str = "relaydoc_cache_fallback_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierState {
    Uninitialized,
    ProbingDistributed,
    DistributedActive,
    LocalFallback,
}

impl TierState {
    pub fn is_resolved(self) -> bool {
        matches!(self, TierState::DistributedActive | TierState::LocalFallback)
    }
}

struct Resolution {
    state: TierState,
    store: Option<Arc<dyn CacheStore>>,
}

/// Holds the resolved tier and hands it to every fetcher.
pub struct CacheTierSelector {
    config: CacheConfig,
    connector: Arc<dyn DistributedConnector>,
    local: Arc<LocalCache>,
    resolution: RwLock<Resolution>,
    probe_gate: Mutex<()>,
}

impl CacheTierSelector {
    pub fn new(config: CacheConfig, connector: Arc<dyn DistributedConnector>) -> Self {
        Self {
            config,
            connector,
            local: Arc::new(LocalCache::new()),
            resolution: RwLock::new(Resolution {
                state: TierState::Uninitialized,
                store: None,
            }),
            probe_gate: Mutex::new(()),
        }
    }

    pub fn state(&self) -> TierState {
        rw_read(&self.resolution, SOURCE, "state").state
    }

    /// Name of the active store, if resolved.
    pub fn active_tier(&self) -> Option<&'static str> {
        rw_read(&self.resolution, SOURCE, "active_tier")
            .store
            .as_ref()
            .map(|store| store.tier())
    }

    /// The local tier, regardless of the current resolution.
    pub fn local(&self) -> &Arc<LocalCache> {
        &self.local
    }

    /// Resolve the tier if nobody has yet. Concurrent callers wait for the
    /// single in-flight probe.
    pub async fn initialize(&self) -> TierState {
        if let Some(state) = self.resolved_state() {
            return state;
        }
        let _gate = self.probe_gate.lock().await;
        if let Some(state) = self.resolved_state() {
            return state;
        }
        self.resolve().await
    }

    /// The store all cache traffic should use.
    pub async fn store(&self) -> Arc<dyn CacheStore> {
        if let Some(store) = self.resolved_store() {
            return store;
        }
        self.initialize().await;
        self.resolved_store()
            .unwrap_or_else(|| self.local.clone() as Arc<dyn CacheStore>)
    }

    /// Discard the current choice and probe again.
    pub async fn reprobe(&self) -> TierState {
        let _gate = self.probe_gate.lock().await;
        self.resolve().await
    }

    fn resolved_state(&self) -> Option<TierState> {
        let state = self.state();
        state.is_resolved().then_some(state)
    }

    fn resolved_store(&self) -> Option<Arc<dyn CacheStore>> {
        let guard = rw_read(&self.resolution, SOURCE, "resolved_store");
        if guard.state.is_resolved() {
            guard.store.clone()
        } else {
            None
        }
    }

    async fn resolve(&self) -> TierState {
        {
            let mut guard = rw_write(&self.resolution, SOURCE, "resolve.begin");
            guard.state = TierState::ProbingDistributed;
        }

        let started_at = Instant::now();
        let outcome = match self.config.backend {
            CacheBackend::Memory => Err(CacheError::unavailable("local cache configured")),
            CacheBackend::Redis => self.probe().await,
        };
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        let (state, store) = match outcome {
            Ok(store) => {
                info!(
                    target = "relaydoc::cache::tier",
                    backend = self.config.backend.as_str(),
                    result = "distributed_active",
                    elapsed_ms,
                    "Distributed cache reachable"
                );
                (TierState::DistributedActive, store)
            }
            Err(err) => {
                if self.config.backend == CacheBackend::Memory {
                    info!(
                        target = "relaydoc::cache::tier",
                        backend = self.config.backend.as_str(),
                        result = "local",
                        "Using local in-process cache"
                    );
                } else {
                    counter!(METRIC_CACHE_FALLBACK).increment(1);
                    warn!(
                        target = "relaydoc::cache::tier",
                        backend = self.config.backend.as_str(),
                        result = "local_fallback",
                        elapsed_ms,
                        error = %err,
                        "Distributed cache unreachable; falling back to local cache"
                    );
                }
                (
                    TierState::LocalFallback,
                    self.local.clone() as Arc<dyn CacheStore>,
                )
            }
        };

        let mut guard = rw_write(&self.resolution, SOURCE, "resolve.commit");
        guard.state = state;
        guard.store = Some(store);
        state
    }

    async fn probe(&self) -> Result<Arc<dyn CacheStore>, CacheError> {
        match timeout(self.config.probe_timeout, self.connector.connect()).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::unavailable(format!(
                "probe timed out after {}ms",
                self.config.probe_timeout.as_millis()
            ))),
        }
    }
}
