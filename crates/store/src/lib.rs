//! Canteen store: the in-memory index snapshot and the loader that fills it.

#![forbid(unsafe_code)]

use std::sync::Arc;

use arc_swap::ArcSwap;
use canteen_core::{IndexSnapshot, IndexSource, SearchRecord};
use tokio::sync::watch;
use tracing::debug;

pub mod loader;

pub use loader::{IndexLoader, LoadOutcome};

/// Shared handle to the current index snapshot. Readers never block; writers
/// swap a whole new snapshot in (last writer wins).
pub struct IndexHandle {
    snap: ArcSwap<IndexSnapshot>,
    epoch_tx: watch::Sender<u64>,
}

impl Default for IndexHandle {
    fn default() -> Self { Self::new() }
}

impl IndexHandle {
    pub fn new() -> Self {
        let (epoch_tx, _rx) = watch::channel(0u64);
        Self { snap: ArcSwap::from_pointee(IndexSnapshot::default()), epoch_tx }
    }

    pub fn current(&self) -> Arc<IndexSnapshot> { self.snap.load_full() }

    pub fn is_loaded(&self) -> bool { self.snap.load().is_loaded() }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> { self.epoch_tx.subscribe() }

    /// Install `records` as the new snapshot and return its epoch.
    pub fn replace(&self, records: Vec<SearchRecord>, source: IndexSource) -> u64 {
        let prev = self.snap.load();
        let epoch = prev.epoch.saturating_add(1);
        let count = records.len();
        self.snap.store(Arc::new(IndexSnapshot {
            epoch,
            records,
            source,
            loaded_at: chrono::Utc::now().timestamp(),
        }));
        metrics::gauge!("index_records", count as f64);
        debug!(epoch, records = count, source = ?source, "index snapshot swapped");
        self.epoch_tx.send_replace(epoch);
        epoch
    }
}
