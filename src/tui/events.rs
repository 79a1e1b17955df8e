//! Event plumbing shared by hosts, dialogs and controls
//!
//! [`EventSource`] is a small multicast listener list: handlers subscribe and
//! get back a [`Subscription`] that unregisters them when disposed or dropped.
//! Emission snapshots the handler list first, so a handler may dispose its own
//! (or any other) subscription while the event is being delivered.
//!
//! [`EventHandler`] turns terminal input into application [`Event`]s for the
//! interactive demo loop.

use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Listeners<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Multicast event source with disposable subscriptions
pub struct EventSource<T> {
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T: 'static> EventSource<T> {
    /// Create an event source with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler. It stays registered until the returned
    /// subscription is disposed or dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.handlers.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                lock(&listeners).handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Deliver `value` to every handler registered at the time of the call
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Handler<T>> = lock(&self.listeners)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(value);
        }
    }

    /// Number of currently registered handlers
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).handlers.len()
    }
}

impl<T: 'static> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = lock(&self.listeners).handlers.len();
        f.debug_struct("EventSource").field("listeners", &count).finish()
    }
}

/// Handle to a registered listener
///
/// Disposing is idempotent; dropping the handle disposes it.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap an arbitrary unregister action
    pub fn new<F>(dispose: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription that owns nothing
    pub fn empty() -> Self {
        Self { dispose: None }
    }

    /// Unregister the listener now
    pub fn dispose(mut self) {
        self.run_dispose();
    }

    /// Whether the listener is still registered through this handle
    pub fn is_active(&self) -> bool {
        self.dispose.is_some()
    }

    fn run_dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Application events produced by the terminal
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,
}

/// Event handler for terminal input
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Poll interval before a tick is produced
    tick_interval: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            tick_interval: Duration::from_millis(50),
        }
    }

    /// Get the next event, or a tick when the terminal stayed quiet
    pub async fn next(&mut self) -> Event {
        if let Ok(event) = self.receiver.try_recv() {
            return event;
        }

        let interval = self.tick_interval;
        let polled = timeout(
            interval * 2,
            tokio::task::spawn_blocking(move || {
                if crossterm::event::poll(interval)? {
                    crossterm::event::read().map(Some)
                } else {
                    Ok(None)
                }
            }),
        )
        .await;

        match polled {
            Ok(Ok(Ok(Some(event)))) => Self::convert_crossterm_event(event),
            _ => Event::Tick,
        }
    }

    /// Convert crossterm events to application events
    fn convert_crossterm_event(event: CrosstermEvent) -> Event {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        }
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_all_listeners() {
        let source = EventSource::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = total.clone();
        let _a = source.subscribe(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let t2 = total.clone();
        let _b = source.subscribe(move |v| {
            t2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        source.emit(&3);
        assert_eq!(total.load(Ordering::SeqCst), 6);
        assert_eq!(source.listener_count(), 2);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let source = EventSource::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let sub = source.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        source.emit(&());
        drop(sub);
        source.emit(&());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_handler_can_dispose_itself_during_emit() {
        let source = EventSource::<()>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let s = slot.clone();
        let h = hits.clone();
        let sub = source.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = lock(&s).take() {
                sub.dispose();
            }
        });
        *lock(&slot) = Some(sub);

        source.emit(&());
        source.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_source_is_harmless() {
        let source = EventSource::<()>::new();
        let sub = source.subscribe(|_| {});
        drop(source);
        sub.dispose();
    }
}
