use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Cancellation flag for one in-flight request.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl RequestGuard {
    pub fn new(id: u64) -> Self { Self { id, cancelled: Arc::new(AtomicBool::new(false)) } }

    pub fn id(&self) -> u64 { self.id }

    pub fn cancel(&self) { self.cancelled.store(true, Ordering::SeqCst); }

    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::SeqCst) }
}

/// Hands out guards; starting a request cancels the one before it.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next: AtomicU64,
    current: Mutex<Option<RequestGuard>>,
}

impl RequestTracker {
    pub fn new() -> Self { Self::default() }

    pub fn begin(&self) -> RequestGuard {
        let guard = RequestGuard::new(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        if let Ok(mut cur) = self.current.lock() {
            if let Some(prev) = cur.replace(guard.clone()) {
                prev.cancel();
            }
        }
        guard
    }

    /// Cancel whatever is in flight (view teardown).
    pub fn cancel_all(&self) {
        if let Ok(mut cur) = self.current.lock() {
            if let Some(prev) = cur.take() {
                prev.cancel();
            }
        }
    }
}
