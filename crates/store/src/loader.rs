use std::sync::Arc;
use std::time::Instant;

use canteen_backend::IndexBackend;
use canteen_core::IndexSource;
use canteen_persist::SearchCache;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::IndexHandle;

/// How an index load ended. Only `Failed` should surface as "failed to load".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Cache { records: usize },
    Network { records: usize },
    /// Network failed; serving the cached or previously loaded index.
    StaleFallback { records: usize, error: String },
    /// Network failed and nothing was available to fall back on.
    Failed { error: String },
}

impl LoadOutcome {
    pub fn is_failed(&self) -> bool { matches!(self, LoadOutcome::Failed { .. }) }
}

/// Fills an [`IndexHandle`] from the cache or the backend.
pub struct IndexLoader {
    backend: Arc<dyn IndexBackend>,
    cache: SearchCache,
    handle: Arc<IndexHandle>,
}

impl IndexLoader {
    pub fn new(backend: Arc<dyn IndexBackend>, cache: SearchCache, handle: Arc<IndexHandle>) -> Self {
        Self { backend, cache, handle }
    }

    pub fn handle(&self) -> &Arc<IndexHandle> { &self.handle }

    pub fn cache(&self) -> &SearchCache { &self.cache }

    /// Load the index. A valid cache short-circuits the network unless
    /// `force_refresh` is set. Never returns an error.
    pub async fn load(&self, force_refresh: bool) -> LoadOutcome {
        let t0 = Instant::now();
        if !force_refresh {
            if let Some(records) = self.cache.read_cache() {
                let n = records.len();
                self.handle.replace(records, IndexSource::Cache);
                info!(records = n, took_ms = %t0.elapsed().as_millis(), "index: loaded from cache");
                return LoadOutcome::Cache { records: n };
            }
        }

        match self.backend.fetch_search_data().await {
            Ok(records) => {
                let n = records.len();
                self.cache.write_cache(&records);
                self.handle.replace(records, IndexSource::Network);
                info!(records = n, took_ms = %t0.elapsed().as_millis(), "index: loaded from network");
                LoadOutcome::Network { records: n }
            }
            Err(e) => {
                let error = e.to_string();
                metrics::counter!("index_load_failures_total", 1u64);
                if force_refresh {
                    if let Some(records) = self.cache.read_cache() {
                        let n = records.len();
                        self.handle.replace(records, IndexSource::Cache);
                        warn!(error = %error, records = n, "index: network failed; using cached index");
                        return LoadOutcome::StaleFallback { records: n, error };
                    }
                }
                let current = self.handle.current();
                if current.is_loaded() {
                    warn!(error = %error, records = current.records.len(), "index: network failed; keeping current index");
                    return LoadOutcome::StaleFallback { records: current.records.len(), error };
                }
                error!(error = %error, "index: load failed; search stays empty");
                LoadOutcome::Failed { error }
            }
        }
    }
}
