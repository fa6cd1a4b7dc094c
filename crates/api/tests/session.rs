#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use canteen_api::{session_with, CanteenApi, PageOutcome, PageQuery, SearchSession};
use canteen_backend::MockBackend;
use canteen_core::SearchRecord;
use canteen_persist::{MemoryStorage, SearchCache};
use canteen_search::SearchConfig;

fn records() -> Vec<SearchRecord> {
    vec![
        SearchRecord::new("1", "兰州拉面", "mainfood").with_location("南门").with_tags(["面食"]),
        SearchRecord::new("2", "Lanzhou Noodles", "mainfood"),
        SearchRecord::new("3", "瑞幸咖啡", "drinks").with_location("图书馆"),
        SearchRecord::new("4", "Tea House", "drinks"),
    ]
}

fn session(backend: Arc<MockBackend>) -> SearchSession {
    session_with(backend, SearchCache::new(Arc::new(MemoryStorage::new())), SearchConfig::default())
}

fn ids(outcome: &PageOutcome) -> Vec<String> {
    match outcome {
        PageOutcome::Page(p) => p.items.iter().map(|f| f.id.clone()).collect(),
        other => panic!("expected a page, got {:?}", other),
    }
}

#[tokio::test]
async fn keyword_before_load_reports_loading() {
    let s = session(Arc::new(MockBackend::new(records())));
    assert_eq!(s.query(&PageQuery::new("拉面")).await, PageOutcome::Loading);
}

#[tokio::test]
async fn keyword_search_hydrates_in_rank_order() {
    let backend = Arc::new(MockBackend::new(records()));
    let s = session(backend.clone());
    s.load(false).await;
    let out = s.query(&PageQuery::new("lanzhou")).await;
    // pinyin hit on "兰州拉面" and a literal hit on "Lanzhou Noodles"; literal ranks first.
    assert_eq!(ids(&out), vec!["2", "1"]);
    assert_eq!(backend.id_calls(), 1);
}

#[tokio::test]
async fn category_filter_applies_to_keyword_results() {
    let s = session(Arc::new(MockBackend::new(records())));
    s.load(false).await;
    // "house" hits "Tea House" (drinks) only; the filter must keep it
    let out = s.query(&PageQuery::new("house").kind("drinks")).await;
    assert_eq!(ids(&out), vec!["4"]);
    match &out {
        PageOutcome::Page(p) => assert_eq!(p.total, 1),
        other => panic!("expected a page, got {:?}", other),
    }
    // "lanzhou" only hits mainfood venues; narrowing to drinks leaves nothing
    match s.query(&PageQuery::new("lanzhou").kind("drinks")).await {
        PageOutcome::Page(p) => {
            assert_eq!(p.total, 0);
            assert!(p.items.is_empty());
        }
        other => panic!("expected a page, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_keyword_uses_server_listing() {
    let backend = Arc::new(MockBackend::new(records()));
    let s = session(backend.clone());
    let out = s.query(&PageQuery::new("  ").kind("drinks").page(1, 1)).await;
    match out {
        PageOutcome::Page(p) => {
            assert_eq!(p.total, 2);
            assert_eq!(p.items.len(), 1);
        }
        other => panic!("expected a page, got {:?}", other),
    }
    assert_eq!(backend.id_calls(), 0);
}

#[tokio::test]
async fn newer_request_supersedes_slow_one() {
    let backend = Arc::new(MockBackend::new(records()).with_delay(Duration::from_millis(50)));
    let s = Arc::new(session(backend));
    s.load(false).await;

    let slow = {
        let s = s.clone();
        tokio::spawn(async move { s.query(&PageQuery::new("lanzhou")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let fast = s.query(&PageQuery::new("咖啡")).await;

    assert_eq!(slow.await.unwrap(), PageOutcome::Superseded);
    assert_eq!(ids(&fast), vec!["3"]);
}

#[tokio::test]
async fn cancel_all_drops_in_flight_results() {
    let backend = Arc::new(MockBackend::new(records()).with_delay(Duration::from_millis(30)));
    let s = Arc::new(session(backend));
    s.load(false).await;
    let pending = {
        let s = s.clone();
        tokio::spawn(async move { s.query(&PageQuery::new("lanzhou")).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    s.cancel_all();
    assert_eq!(pending.await.unwrap(), PageOutcome::Superseded);
}

#[tokio::test]
async fn facade_rejects_bad_page_size_and_reports_status() {
    let s = session(Arc::new(MockBackend::new(records())));
    let api: &dyn CanteenApi = &s;
    assert!(api.query(PageQuery::new("x").page(1, 0)).await.is_err());

    assert!(!api.load_index(false).await.is_failed());
    let st = api.status();
    assert_eq!(st.records, 4);
    let cached = st.cached.expect("network load writes the cache");
    assert!(cached.current);
    assert_eq!(cached.records, 4);

    api.clear_cache();
    assert!(api.status().cached.is_none());
}

#[tokio::test]
async fn page_outcome_serializes_with_state_tag() {
    let s = session(Arc::new(MockBackend::new(records())));
    let v = serde_json::to_value(s.query(&PageQuery::new("x")).await).unwrap();
    assert_eq!(v["state"], "loading");
}

#[tokio::test(start_paused = true)]
async fn debounced_input_runs_only_the_last_query() {
    let backend = Arc::new(MockBackend::new(records()));
    let s = Arc::new(session(backend.clone()));
    s.load(false).await;
    let (input, mut pages) = s.debounced(Duration::from_millis(300));
    for kw in ["l", "la", "lanzhou"] {
        input.push(PageQuery::new(kw));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let out = pages.recv().await.expect("a page after the quiet window");
    assert_eq!(ids(&out), vec!["2", "1"]);
    assert_eq!(backend.id_calls(), 1, "earlier keystrokes must not reach the backend");
}
