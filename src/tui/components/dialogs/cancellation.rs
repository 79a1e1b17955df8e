//! One-shot cancellation signal carried in dialog settings

use crate::tui::events::{EventSource, Subscription};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

struct Inner {
    cancelled: AtomicBool,
    listeners: EventSource<()>,
}

/// Forward-only cancellation flag
///
/// Clones share the same signal. Once cancelled it stays cancelled; a token
/// nobody cancels never fires.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                listeners: EventSource::new(),
            }),
        }
    }

    /// Fire the signal. Only the first call notifies listeners.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.listeners.emit(&());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Callbacks still registered on the signal
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.listener_count()
    }

    /// Run `callback` when the token fires. If it already fired the callback
    /// runs immediately.
    pub fn register<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let fired = AtomicBool::new(false);
        let run_once = Arc::new(move || {
            if !fired.swap(true, Ordering::SeqCst) {
                callback();
            }
        });

        let listener = run_once.clone();
        let subscription = self.inner.listeners.subscribe(move |_| listener());
        if self.is_cancelled() {
            // The emit in `cancel` may have snapshotted the list before we joined it.
            run_once();
        }
        subscription
    }

    /// Wait until the token fires
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let (sender, receiver) = oneshot::channel();
        let sender = std::sync::Mutex::new(Some(sender));
        let _subscription = self.register(move || {
            if let Some(sender) = crate::tui::events::lock(&sender).take() {
                let _ = sender.send(());
            }
        });
        let _ = receiver.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancel_notifies_once() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _sub = token.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disposed_listener_is_not_called() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = token.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        sub.dispose();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_for_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        let waiter = tokio::spawn(async move { clone.cancelled().await });
        tokio::task::yield_now().await;
        token.cancel();
        waiter.await.unwrap();
    }
}
