//! Trailing-edge debouncer for keystroke input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Window from `CANTEEN_DEBOUNCE_MS`, else 300 ms.
pub fn window_from_env() -> Duration {
    let ms = std::env::var("CANTEEN_DEBOUNCE_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(DEFAULT_DEBOUNCE_MS);
    Duration::from_millis(ms)
}

/// Calls `callback` with the latest pushed value once no new value arrived
/// for `window`. Dropping the debouncer discards any pending value.
pub struct Debouncer<T: Send + 'static> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be called from within a tokio runtime.
    pub fn new<F>(window: Duration, mut callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                if pending.is_none() {
                    match rx.recv().await {
                        Some(v) => pending = Some(v),
                        None => break,
                    }
                    continue;
                }
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(v) => {
                            trace!("debounce: restarted");
                            pending = Some(v);
                        }
                        None => break,
                    },
                    _ = tokio::time::sleep(window) => {
                        if let Some(v) = pending.take() {
                            callback(v);
                        }
                    }
                }
            }
        });
        Self { tx, task }
    }

    pub fn push(&self, value: T) {
        // Closed only after drop; nothing to deliver to then.
        let _ = self.tx.send(value);
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) { self.task.abort(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_with_latest_value() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let d = Debouncer::new(Duration::from_millis(300), move |v: String| {
            let _ = tx.send(v);
        });
        d.push("l".into());
        tokio::time::sleep(Duration::from_millis(100)).await;
        d.push("la".into());
        tokio::time::sleep(Duration::from_millis(100)).await;
        d.push("lam".into());
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(rx.try_recv().is_err(), "fired before the quiet window elapsed");
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.recv().await.as_deref(), Some("lam"));
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_discards_pending() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        let d = Debouncer::new(Duration::from_millis(300), move |v: u32| {
            let _ = tx.send(v);
        });
        d.push(1);
        tokio::task::yield_now().await;
        drop(d);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(rx.recv().await, None);
    }
}
