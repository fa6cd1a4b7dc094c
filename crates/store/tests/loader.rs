#![forbid(unsafe_code)]

use std::sync::Arc;

use canteen_backend::MockBackend;
use canteen_core::{IndexSource, SearchRecord};
use canteen_persist::{MemoryStorage, SearchCache};
use canteen_store::{IndexHandle, IndexLoader, LoadOutcome};

fn records() -> Vec<SearchRecord> {
    vec![
        SearchRecord::new("1", "兰州拉面", "mainfood").with_location("南门"),
        SearchRecord::new("2", "Lanzhou Noodles", "mainfood"),
    ]
}

fn setup(backend: Arc<MockBackend>, cache: SearchCache) -> IndexLoader {
    IndexLoader::new(backend, cache, Arc::new(IndexHandle::new()))
}

#[tokio::test]
async fn network_load_fills_cache_then_cache_short_circuits() {
    let backend = Arc::new(MockBackend::new(records()));
    let cache = SearchCache::new(Arc::new(MemoryStorage::new()));

    let first = setup(backend.clone(), cache.clone());
    assert_eq!(first.load(false).await, LoadOutcome::Network { records: 2 });
    assert_eq!(first.handle().current().source, IndexSource::Network);

    let second = setup(backend.clone(), cache.clone());
    assert_eq!(second.load(false).await, LoadOutcome::Cache { records: 2 });
    assert_eq!(backend.index_calls(), 1, "valid cache must not hit the network");
}

#[tokio::test]
async fn forced_refresh_falls_back_to_cache_on_failure() {
    let backend = Arc::new(MockBackend::new(records()));
    let cache = SearchCache::new(Arc::new(MemoryStorage::new()));
    cache.write_cache(&records());
    backend.set_failing(true);

    let loader = setup(backend, cache);
    match loader.load(true).await {
        LoadOutcome::StaleFallback { records, .. } => assert_eq!(records, 2),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(loader.handle().is_loaded());
}

#[tokio::test]
async fn failure_without_any_fallback_leaves_index_empty() {
    let backend = Arc::new(MockBackend::new(records()));
    backend.set_failing(true);
    let loader = setup(backend, SearchCache::detached());
    let outcome = loader.load(false).await;
    assert!(outcome.is_failed());
    assert!(!loader.handle().is_loaded());
    assert!(loader.handle().current().records.is_empty());
}

#[tokio::test]
async fn refresh_failure_keeps_in_memory_index() {
    let backend = Arc::new(MockBackend::new(records()));
    let loader = setup(backend.clone(), SearchCache::detached());
    assert!(matches!(loader.load(false).await, LoadOutcome::Network { .. }));
    backend.set_failing(true);
    assert!(matches!(loader.load(true).await, LoadOutcome::StaleFallback { records: 2, .. }));
    assert_eq!(loader.handle().current().records.len(), 2);
}
