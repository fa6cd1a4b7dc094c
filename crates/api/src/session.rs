use std::sync::Arc;
use std::time::{Duration, Instant};

use canteen_backend::IndexBackend;
use canteen_search::{MatchExplain, Matcher};
use canteen_store::{IndexHandle, IndexLoader, LoadOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::debounce::Debouncer;
use crate::guard::{RequestGuard, RequestTracker};
use crate::hydrate::{HydratedPage, Hydrator};
use crate::{CanteenError, CanteenResult};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// One page request from the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub keyword: String,
    /// Category filter; `None` or empty means all.
    pub kind: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl PageQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), kind: None, page: 1, page_size: DEFAULT_PAGE_SIZE }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> CanteenResult<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(CanteenError::Validation(format!("page size must be within 1..={MAX_PAGE_SIZE}, got {}", self.page_size)));
        }
        Ok(())
    }

    fn kind_filter(&self) -> Option<&str> { self.kind.as_deref().filter(|k| !k.is_empty()) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageOutcome {
    Page(HydratedPage),
    /// The index has not been loaded yet; distinct from "no results".
    Loading,
    /// A newer request started before this one finished.
    Superseded,
}

/// Search pipeline for one view: snapshot, matcher, hydrator and the
/// request tracker that drops late responses.
pub struct SearchSession {
    backend: Arc<dyn IndexBackend>,
    loader: IndexLoader,
    matcher: Matcher,
    requests: RequestTracker,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn IndexBackend>, loader: IndexLoader, matcher: Matcher) -> Self {
        Self { backend, loader, matcher, requests: RequestTracker::new() }
    }

    pub fn handle(&self) -> &Arc<IndexHandle> { self.loader.handle() }

    pub fn loader(&self) -> &IndexLoader { &self.loader }

    pub fn matcher(&self) -> &Matcher { &self.matcher }

    pub async fn load(&self, force_refresh: bool) -> LoadOutcome { self.loader.load(force_refresh).await }

    /// Start a request, cancelling the previous one.
    pub fn begin_request(&self) -> RequestGuard { self.requests.begin() }

    /// Cancel everything in flight; late results are dropped.
    pub fn cancel_all(&self) { self.requests.cancel_all(); }

    pub async fn query(&self, q: &PageQuery) -> PageOutcome {
        let guard = self.begin_request();
        self.query_guarded(q, &guard).await
    }

    /// Run `q` under an existing guard.
    pub async fn query_guarded(&self, q: &PageQuery, guard: &RequestGuard) -> PageOutcome {
        let t0 = Instant::now();
        let keyword = q.keyword.trim();
        let page = if keyword.is_empty() {
            self.list(q).await
        } else {
            let snap = self.loader.handle().current();
            if !snap.is_loaded() {
                debug!(request = guard.id(), "session: index not loaded yet");
                return PageOutcome::Loading;
            }
            let ranked = self.matcher.search(keyword, &snap.records);
            Hydrator::new(self.backend.as_ref()).hydrate(&ranked, &snap.records, q.kind_filter(), q.page, q.page_size).await
        };
        if guard.is_cancelled() {
            debug!(request = guard.id(), "session: response superseded; dropped");
            metrics::counter!("search_superseded_total", 1u64);
            return PageOutcome::Superseded;
        }
        info!(request = guard.id(), total = page.total, items = page.items.len(), took_ms = %t0.elapsed().as_millis(), "session: page ready");
        PageOutcome::Page(page)
    }

    /// Keystroke front end: push queries into the returned debouncer; once the
    /// input has been quiet for `window` the latest query runs and its page
    /// arrives on the receiver. Superseded pages are not delivered.
    pub fn debounced(self: &Arc<Self>, window: Duration) -> (Debouncer<PageQuery>, mpsc::UnboundedReceiver<PageOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::clone(self);
        let input = Debouncer::new(window, move |q: PageQuery| {
            let session = Arc::clone(&session);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = session.query(&q).await;
                if outcome != PageOutcome::Superseded {
                    let _ = tx.send(outcome);
                }
            });
        });
        (input, rx)
    }

    pub fn explain(&self, keyword: &str) -> Vec<MatchExplain> {
        let snap = self.loader.handle().current();
        self.matcher.explain(keyword, &snap.records)
    }

    async fn list(&self, q: &PageQuery) -> HydratedPage {
        let page = q.page.max(1);
        match self.backend.list_page(q.kind_filter(), page, q.page_size).await {
            Ok(lp) => {
                let total = if lp.pagination.total == 0 { lp.items.len() } else { lp.pagination.total };
                HydratedPage { items: lp.items, total, page, page_size: q.page_size }
            }
            Err(e) => {
                error!(error = %e, "session: list page failed; showing empty page");
                HydratedPage::empty(page, q.page_size)
            }
        }
    }
}
