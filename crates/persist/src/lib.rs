//! Canteen persistence: durable key/value storage and the versioned search-index cache.
//! Keep code tiny and predictable.

#![forbid(unsafe_code)]

pub mod cache;
pub mod storage;

pub use cache::{CacheEnvelope, SearchCache, DEFAULT_CACHE_PREFIX, SEARCH_CACHE_VERSION};
pub use storage::{default_db_path, KvStorage, MemoryStorage, SqliteStorage};

pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
