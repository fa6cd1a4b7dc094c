//! Canteen public API façade (in-process).
//!
//! Frontends (the CLI today, a list view later) depend on the types and the
//! [`CanteenApi`] trait here rather than on the individual engine crates.

#![forbid(unsafe_code)]

use std::sync::Arc;

use canteen_backend::{BackendConfig, HttpBackend, IndexBackend};
use canteen_persist::{CacheEnvelope, KvStorage, SearchCache, SqliteStorage, DEFAULT_CACHE_PREFIX};
use canteen_search::{MatchExplain, Matcher, SearchConfig};
use canteen_store::{IndexHandle, IndexLoader, LoadOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub mod debounce;
pub mod guard;
pub mod hydrate;
pub mod session;

pub use debounce::{window_from_env, Debouncer, DEFAULT_DEBOUNCE_MS};
pub use guard::{RequestGuard, RequestTracker};
pub use hydrate::{narrow_by_kind, page_window, reorder, HydratedPage, Hydrator};
pub use session::{PageOutcome, PageQuery, SearchSession, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// API errors suitable for transport later.
#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
pub enum CanteenError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("storage: {0}")]
    Storage(String),
}

pub type CanteenResult<T> = Result<T, CanteenError>;

/// Where the durable index cache lives. Resolved to a file only when opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheLocation {
    /// No durable cache; every load hits the network.
    Off,
    /// `~/.canteen/canteen.db`.
    #[default]
    Default,
    At(String),
}

impl CacheLocation {
    /// `CANTEEN_CACHE=off` wins over `CANTEEN_DB_PATH`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup("CANTEEN_CACHE").is_some_and(|v| v.eq_ignore_ascii_case("off")) {
            return CacheLocation::Off;
        }
        match lookup("CANTEEN_DB_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => CacheLocation::At(path),
            None => CacheLocation::Default,
        }
    }
}

/// Wiring for an in-process session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub cache: CacheLocation,
    pub cache_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            search: SearchConfig::default(),
            cache: CacheLocation::Default,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    /// `CANTEEN_*` environment over the defaults.
    pub fn from_env() -> Self {
        Self {
            backend: BackendConfig::from_env(),
            search: SearchConfig::from_env(),
            cache: CacheLocation::from_lookup(|k| std::env::var(k).ok()),
            cache_prefix: std::env::var("CANTEEN_CACHE_PREFIX").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_CACHE_PREFIX.to_string()),
        }
    }
}

/// Snapshot + cache status for display.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub epoch: u64,
    pub records: usize,
    pub source: canteen_core::IndexSource,
    pub loaded_at: i64,
    pub cache_version: String,
    pub cached: Option<CachedSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedSummary {
    pub version: String,
    pub records: usize,
    pub current: bool,
}

/// Search surface consumed by frontends.
#[async_trait::async_trait]
pub trait CanteenApi: Send + Sync {
    /// Populate the index; `force_refresh` bypasses the cache.
    async fn load_index(&self, force_refresh: bool) -> LoadOutcome;

    /// One page of results, or `Loading` / `Superseded`.
    async fn query(&self, q: PageQuery) -> CanteenResult<PageOutcome>;

    /// Per-record tier and score for `keyword` against the current index.
    fn explain(&self, keyword: &str) -> Vec<MatchExplain>;

    fn status(&self) -> IndexStatus;

    fn clear_cache(&self);
}

#[async_trait::async_trait]
impl CanteenApi for SearchSession {
    async fn load_index(&self, force_refresh: bool) -> LoadOutcome { self.load(force_refresh).await }

    async fn query(&self, q: PageQuery) -> CanteenResult<PageOutcome> {
        q.validate()?;
        Ok(SearchSession::query(self, &q).await)
    }

    fn explain(&self, keyword: &str) -> Vec<MatchExplain> { SearchSession::explain(self, keyword) }

    fn status(&self) -> IndexStatus {
        let snap = self.handle().current();
        let cache = self.loader().cache();
        let cached = cached_summary(cache);
        IndexStatus {
            epoch: snap.epoch,
            records: snap.records.len(),
            source: snap.source,
            loaded_at: snap.loaded_at,
            cache_version: cache.version().to_string(),
            cached,
        }
    }

    fn clear_cache(&self) { self.loader().cache().clear(); }
}

fn map_err(e: anyhow::Error) -> CanteenError { CanteenError::Storage(format!("{:#}", e)) }

/// Open the cache storage named by `cfg`. An unopenable file is an error.
pub fn open_cache(cfg: &SessionConfig) -> CanteenResult<SearchCache> {
    let storage: Option<Arc<dyn KvStorage>> = match &cfg.cache {
        CacheLocation::Off => {
            warn!("cache: disabled; every load hits the network");
            None
        }
        CacheLocation::Default => Some(Arc::new(SqliteStorage::open(&canteen_persist::default_db_path()).map_err(map_err)?)),
        CacheLocation::At(path) => Some(Arc::new(SqliteStorage::open(path).map_err(map_err)?)),
    };
    Ok(SearchCache::with_prefix(storage, &cfg.cache_prefix))
}

/// HTTP backend plus SQLite cache, per `cfg`.
pub fn open_session(cfg: &SessionConfig) -> CanteenResult<SearchSession> {
    let backend: Arc<dyn IndexBackend> = Arc::new(HttpBackend::new(cfg.backend.clone()));
    let cache = open_cache(cfg)?;
    info!(base = %cfg.backend.base_url, cache = cache.is_attached(), "session: opened");
    Ok(session_with(backend, cache, cfg.search.clone()))
}

/// Assemble a session from parts (tests, alternative backends).
pub fn session_with(backend: Arc<dyn IndexBackend>, cache: SearchCache, search: SearchConfig) -> SearchSession {
    let loader = IndexLoader::new(backend.clone(), cache, Arc::new(IndexHandle::new()));
    SearchSession::new(backend, loader, Matcher::new(search))
}

/// Status of the cache without loading anything.
pub fn cached_summary(cache: &SearchCache) -> Option<CachedSummary> {
    cache.envelope().map(|e: CacheEnvelope| CachedSummary {
        current: e.version == cache.version(),
        version: e.version,
        records: e.payload.len(),
    })
}
