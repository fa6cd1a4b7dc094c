//! Versioned cache of the lightweight search index.
//!
//! Two keys under an application prefix: a version marker and the serialized
//! record list. A version mismatch means the record shape changed; the stale
//! entries are dropped and the caller refetches. The cache is advisory: every
//! failure is logged and reads as "absent".

use std::sync::Arc;

use canteen_core::SearchRecord;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::KvStorage;

/// Bump whenever `SearchRecord` changes shape.
pub const SEARCH_CACHE_VERSION: &str = "search-data-v2";
pub const DEFAULT_CACHE_PREFIX: &str = "canteen";

/// Versioned wrapper persisted around the record list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEnvelope {
    pub version: String,
    pub payload: Vec<SearchRecord>,
}

#[derive(Clone)]
pub struct SearchCache {
    storage: Option<Arc<dyn KvStorage>>,
    version_key: String,
    data_key: String,
    version: String,
}

impl SearchCache {
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        Self::with_prefix(Some(storage), DEFAULT_CACHE_PREFIX)
    }

    /// No durable storage available: reads miss, writes are dropped.
    pub fn detached() -> Self {
        Self::with_prefix(None, DEFAULT_CACHE_PREFIX)
    }

    pub fn with_prefix(storage: Option<Arc<dyn KvStorage>>, prefix: &str) -> Self {
        Self {
            storage,
            version_key: format!("{prefix}:search-data-version"),
            data_key: format!("{prefix}:search-data"),
            version: SEARCH_CACHE_VERSION.to_string(),
        }
    }

    /// Override the expected version (tests, staged rollouts).
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn is_attached(&self) -> bool { self.storage.is_some() }

    pub fn version(&self) -> &str { &self.version }

    /// Cached records, or `None` when absent, stale, or unreadable.
    pub fn read_cache(&self) -> Option<Vec<SearchRecord>> {
        let storage = self.storage.as_ref()?;
        let stored_version = match storage.get(&self.version_key) {
            Ok(Some(v)) => v,
            Ok(None) => {
                counter!("cache_read_total", 1u64, "outcome" => "miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "cache: reading version marker failed");
                counter!("cache_read_total", 1u64, "outcome" => "error");
                return None;
            }
        };
        if stored_version != self.version {
            info!(stored = %stored_version, current = %self.version, "cache: version mismatch; clearing stale entries");
            counter!("cache_read_total", 1u64, "outcome" => "stale");
            self.clear();
            return None;
        }
        let raw = match storage.get(&self.data_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!("cache_read_total", 1u64, "outcome" => "miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "cache: reading payload failed");
                counter!("cache_read_total", 1u64, "outcome" => "error");
                return None;
            }
        };
        match serde_json::from_str::<Vec<SearchRecord>>(&raw) {
            Ok(records) => {
                debug!(records = records.len(), "cache: hit");
                counter!("cache_read_total", 1u64, "outcome" => "hit");
                Some(records)
            }
            Err(e) => {
                warn!(error = %e, "cache: payload failed to parse");
                counter!("cache_read_total", 1u64, "outcome" => "corrupt");
                None
            }
        }
    }

    /// Store `records` under the current version. Never fails; errors are logged.
    pub fn write_cache(&self, records: &[SearchRecord]) {
        let Some(storage) = self.storage.as_ref() else { return; };
        let payload = match serde_json::to_string(records) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "cache: serializing payload failed");
                counter!("cache_write_total", 1u64, "outcome" => "error");
                return;
            }
        };
        // payload first: a crash between the two writes leaves an old or missing
        // version marker, never a current marker over a foreign payload
        let res = storage
            .set(&self.data_key, &payload)
            .and_then(|_| storage.set(&self.version_key, &self.version));
        match res {
            Ok(()) => {
                debug!(records = records.len(), bytes = payload.len(), "cache: written");
                counter!("cache_write_total", 1u64, "outcome" => "ok");
            }
            Err(e) => {
                warn!(error = %e, "cache: write failed; continuing without cache");
                counter!("cache_write_total", 1u64, "outcome" => "error");
            }
        }
    }

    /// Drop both keys. Errors are logged.
    pub fn clear(&self) {
        let Some(storage) = self.storage.as_ref() else { return; };
        for key in [&self.version_key, &self.data_key] {
            if let Err(e) = storage.remove(key) {
                warn!(error = %e, key = %key, "cache: remove failed");
            }
        }
    }

    /// Raw stored envelope regardless of version; `None` when nothing parseable is stored.
    pub fn envelope(&self) -> Option<CacheEnvelope> {
        let storage = self.storage.as_ref()?;
        let version = storage.get(&self.version_key).ok()??;
        let raw = storage.get(&self.data_key).ok()??;
        let payload = serde_json::from_str(&raw).ok()?;
        Some(CacheEnvelope { version, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn records() -> Vec<SearchRecord> {
        vec![
            SearchRecord::new("1", "兰州拉面", "mainfood").with_location("南门").with_tags(["面食"]).with_menu("牛肉面"),
            SearchRecord::new("2", "Lanzhou Noodles", "mainfood"),
        ]
    }

    #[test]
    fn round_trip() {
        let cache = SearchCache::new(Arc::new(MemoryStorage::new()));
        assert_eq!(cache.read_cache(), None);
        cache.write_cache(&records());
        assert_eq!(cache.read_cache(), Some(records()));
    }

    #[test]
    fn detached_is_inert() {
        let cache = SearchCache::detached();
        cache.write_cache(&records());
        assert_eq!(cache.read_cache(), None);
        assert!(!cache.is_attached());
    }

    #[test]
    fn version_bump_invalidates_and_clears() {
        let storage = Arc::new(MemoryStorage::new());
        let old = SearchCache::new(storage.clone()).with_version("search-data-v1");
        old.write_cache(&records());
        assert_eq!(storage.len(), 2);

        let current = SearchCache::new(storage.clone());
        assert_eq!(current.read_cache(), None);
        assert!(storage.is_empty(), "stale entries must be removed");
    }

    #[test]
    fn missing_payload_or_garbage_reads_none() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = SearchCache::new(storage.clone());
        storage.set("canteen:search-data-version", SEARCH_CACHE_VERSION).unwrap();
        assert_eq!(cache.read_cache(), None);
        storage.set("canteen:search-data", "{not json").unwrap();
        assert_eq!(cache.read_cache(), None);
    }

    #[test]
    fn quota_errors_are_swallowed() {
        let storage = Arc::new(MemoryStorage::with_quota(16));
        let cache = SearchCache::new(storage.clone());
        cache.write_cache(&records());
        assert_eq!(cache.read_cache(), None);
    }

    #[test]
    fn prefixes_do_not_collide() {
        let storage: Arc<dyn KvStorage> = Arc::new(MemoryStorage::new());
        let a = SearchCache::with_prefix(Some(storage.clone()), "a");
        let b = SearchCache::with_prefix(Some(storage), "b");
        a.write_cache(&records());
        assert_eq!(b.read_cache(), None);
        assert!(a.read_cache().is_some());
    }

    #[test]
    fn envelope_exposes_stored_version() {
        let storage = Arc::new(MemoryStorage::new());
        SearchCache::new(storage.clone()).with_version("old").write_cache(&records());
        let env = SearchCache::new(storage).envelope().unwrap();
        assert_eq!(env.version, "old");
        assert_eq!(env.payload.len(), 2);
    }
}
