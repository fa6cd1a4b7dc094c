use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use canteen_core::{FullRecord, Pagination, SearchRecord};

use crate::{BackendError, BackendResult, IndexBackend, ListPage};

/// Simple in-memory backend for tests. Id lookups come back in reverse order
/// to mimic a server that does not honour the requested order.
#[derive(Default)]
pub struct MockBackend {
    pub records: Vec<SearchRecord>,
    pub full: Vec<FullRecord>,
    pub delay: Option<Duration>,
    failing: AtomicBool,
    id_calls: AtomicUsize,
    index_calls: AtomicUsize,
    last_ids: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(records: Vec<SearchRecord>) -> Self {
        let full = records
            .iter()
            .map(|r| {
                let mut f = FullRecord::new(r.id.clone());
                f.fields.insert("name".into(), serde_json::Value::String(r.name.clone()));
                f.fields.insert("type".into(), serde_json::Value::String(r.kind.clone()));
                f
            })
            .collect();
        Self { records, full, ..Default::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Drop full records so id lookups miss them.
    pub fn without_full(mut self, ids: &[&str]) -> Self {
        self.full.retain(|f| !ids.contains(&f.id.as_str()));
        self
    }

    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    pub fn id_calls(&self) -> usize { self.id_calls.load(Ordering::SeqCst) }

    pub fn index_calls(&self) -> usize { self.index_calls.load(Ordering::SeqCst) }

    pub fn last_ids(&self) -> Vec<String> { self.last_ids.lock().map(|v| v.clone()).unwrap_or_default() }

    async fn gate(&self) -> BackendResult<()> {
        if let Some(d) = self.delay { tokio::time::sleep(d).await; }
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("mock backend offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IndexBackend for MockBackend {
    async fn fetch_search_data(&self) -> BackendResult<Vec<SearchRecord>> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.records.clone())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> BackendResult<Vec<FullRecord>> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_ids.lock() { *last = ids.to_vec(); }
        self.gate().await?;
        let mut out: Vec<FullRecord> = self.full.iter().filter(|f| ids.contains(&f.id)).cloned().collect();
        out.reverse();
        Ok(out)
    }

    async fn list_page(&self, kind: Option<&str>, page: usize, limit: usize) -> BackendResult<ListPage> {
        self.gate().await?;
        let matching: Vec<&FullRecord> = self
            .full
            .iter()
            .filter(|f| kind.map(|k| f.field_str("type") == Some(k)).unwrap_or(true))
            .collect();
        let page = page.max(1);
        let limit = limit.max(1);
        let items = matching.iter().skip((page - 1) * limit).take(limit).map(|f| (*f).clone()).collect();
        let total = matching.len();
        Ok(ListPage { items, pagination: Pagination { page, limit, total, total_pages: total.div_ceil(limit) } })
    }
}
