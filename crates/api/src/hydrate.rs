//! Ranked ids -> one page of full records, in rank order.

use std::time::Instant;

use canteen_backend::IndexBackend;
use canteen_core::{FullRecord, RecordId, SearchRecord};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, error};

/// One displayable page. `total` counts every ranked (and narrowed) id, not just this page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HydratedPage {
    pub items: Vec<FullRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl HydratedPage {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self { items: Vec::new(), total: 0, page, page_size }
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 { 0 } else { self.total.div_ceil(self.page_size) }
    }
}

/// Keep only ids whose record has category `kind`, in `ranked` order.
pub fn narrow_by_kind(ranked: &[RecordId], records: &[SearchRecord], kind: &str) -> Vec<RecordId> {
    let allowed: FxHashSet<&str> = records.iter().filter(|r| r.kind == kind).map(|r| r.id.as_str()).collect();
    ranked.iter().filter(|id| allowed.contains(id.as_str())).cloned().collect()
}

/// `ids[(page-1)*size .. page*size]`, clamped. Page 0 reads as page 1.
pub fn page_window(ids: &[RecordId], page: usize, page_size: usize) -> &[RecordId] {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(ids.len());
    let end = start.saturating_add(page_size).min(ids.len());
    &ids[start..end]
}

/// Re-emit `fetched` in `window` order. Ids the server did not return are dropped.
pub fn reorder(window: &[RecordId], fetched: Vec<FullRecord>) -> Vec<FullRecord> {
    let mut by_id: FxHashMap<RecordId, FullRecord> = fetched.into_iter().map(|f| (f.id.clone(), f)).collect();
    window.iter().filter_map(|id| by_id.remove(id)).collect()
}

pub struct Hydrator<'a> {
    backend: &'a dyn IndexBackend,
}

impl<'a> Hydrator<'a> {
    pub fn new(backend: &'a dyn IndexBackend) -> Self { Self { backend } }

    /// Narrow, slice, fetch and reorder. Fetch failures become an empty page.
    pub async fn hydrate(
        &self,
        ranked: &[RecordId],
        records: &[SearchRecord],
        kind: Option<&str>,
        page: usize,
        page_size: usize,
    ) -> HydratedPage {
        let t0 = Instant::now();
        let page = page.max(1);
        let narrowed;
        let ids: &[RecordId] = match kind.filter(|k| !k.is_empty()) {
            Some(k) => {
                narrowed = narrow_by_kind(ranked, records, k);
                &narrowed
            }
            None => ranked,
        };
        let total = ids.len();
        let window = page_window(ids, page, page_size);
        if window.is_empty() {
            debug!(total, page, "hydrate: empty window; skipping fetch");
            return HydratedPage { items: Vec::new(), total, page, page_size };
        }
        match self.backend.fetch_by_ids(window).await {
            Ok(fetched) => {
                let returned = fetched.len();
                let items = reorder(window, fetched);
                if items.len() < window.len() {
                    debug!(requested = window.len(), returned, kept = items.len(), "hydrate: server omitted ids");
                }
                metrics::histogram!("hydrate_ms", t0.elapsed().as_secs_f64() * 1_000.0);
                HydratedPage { items, total, page, page_size }
            }
            Err(e) => {
                error!(error = %e, ids = window.len(), "hydrate: id lookup failed; showing empty page");
                metrics::counter!("hydrate_failures_total", 1u64);
                HydratedPage::empty(page, page_size)
            }
        }
    }
}
