//! Response race
//!
//! A dialog's outcome is decided by whichever of its listeners fires first:
//! a button click, Enter on a focused control, Escape, or the settings'
//! cancellation token. [`ResponseRace`] is the explicit state machine behind
//! that: it starts in `Waiting` holding every listener subscription, and the
//! first [`ResponseRace::resolve`] moves it to `Resolved`, disposes all
//! subscriptions, then completes the shared [`ResponseFuture`]. Every later
//! resolve is a silent no-op.

use super::host::HostSurface;
use super::types::{DialogError, DialogId, DialogResult};
use crate::tui::events::{lock, Subscription};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

enum RaceState<R> {
    Waiting {
        sender: oneshot::Sender<R>,
        listeners: Vec<Subscription>,
    },
    Resolved,
}

/// First-wins resolution of a dialog response
pub struct ResponseRace<R> {
    dialog: DialogId,
    state: Mutex<RaceState<R>>,
}

impl<R: Send + 'static> ResponseRace<R> {
    /// Create a race and the future its winner resolves
    pub fn new(dialog: DialogId) -> (Arc<Self>, ResponseFuture<R>) {
        let (sender, receiver) = oneshot::channel();
        let race = Arc::new(Self {
            dialog,
            state: Mutex::new(RaceState::Waiting {
                sender,
                listeners: Vec::new(),
            }),
        });
        (race, ResponseFuture { dialog, receiver })
    }

    /// Keep a listener registered until the race resolves. Listeners added
    /// after resolution are disposed straight away.
    pub fn hold(&self, subscription: Subscription) {
        let mut state = lock(&self.state);
        if let RaceState::Waiting { listeners, .. } = &mut *state {
            listeners.push(subscription);
            return;
        }
        drop(state);
        subscription.dispose();
    }

    /// Offer a result. Returns true only for the winning call.
    pub fn resolve(&self, value: R) -> bool {
        let previous = std::mem::replace(&mut *lock(&self.state), RaceState::Resolved);
        match previous {
            RaceState::Waiting { sender, listeners } => {
                debug!("Response race for dialog {} resolved", self.dialog);
                for listener in listeners {
                    listener.dispose();
                }
                let _ = sender.send(value);
                true
            }
            RaceState::Resolved => false,
        }
    }

    /// End the race without a winner. Listeners are disposed and the
    /// response future fails with `ResponseAbandoned`. Returns false when
    /// the race was already over.
    pub fn withdraw(&self) -> bool {
        let previous = std::mem::replace(&mut *lock(&self.state), RaceState::Resolved);
        match previous {
            RaceState::Waiting { listeners, .. } => {
                debug!("Response race for dialog {} withdrawn", self.dialog);
                for listener in listeners {
                    listener.dispose();
                }
                true
            }
            RaceState::Resolved => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*lock(&self.state), RaceState::Resolved)
    }

    /// Number of listeners still registered
    pub fn pending_listeners(&self) -> usize {
        match &*lock(&self.state) {
            RaceState::Waiting { listeners, .. } => listeners.len(),
            RaceState::Resolved => 0,
        }
    }
}

/// Future side of a [`ResponseRace`]
#[derive(Debug)]
pub struct ResponseFuture<R> {
    dialog: DialogId,
    receiver: oneshot::Receiver<R>,
}

impl<R> ResponseFuture<R> {
    /// Wait for the winning result
    pub async fn wait(self) -> DialogResult<R> {
        self.receiver
            .await
            .map_err(|_| DialogError::ResponseAbandoned(self.dialog))
    }
}

/// Register a race on `host`'s thread (or inline when the dialog has no
/// host) and wait for its winner
pub(crate) async fn await_response<R, F>(host: Option<Arc<HostSurface>>, register: F) -> DialogResult<R>
where
    R: Send + 'static,
    F: FnOnce() -> ResponseFuture<R> + Send + 'static,
{
    let response = match host {
        Some(host) => host.invoke(register).await?,
        None => register(),
    };
    response.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::events::EventSource;

    #[tokio::test]
    async fn test_withdraw_disposes_listeners_without_winner() {
        let source: EventSource<()> = EventSource::new();
        let (race, response) = ResponseRace::<u8>::new(DialogId::new());
        let r = race.clone();
        race.hold(source.subscribe(move |_| {
            r.resolve(1);
        }));
        assert_eq!(source.listener_count(), 1);

        assert!(race.withdraw());
        assert_eq!(source.listener_count(), 0);
        assert!(!race.resolve(2));
        assert!(!race.withdraw());
        assert!(matches!(response.wait().await, Err(DialogError::ResponseAbandoned(_))));
    }

    #[tokio::test]
    async fn test_first_resolution_wins() {
        let (race, response) = ResponseRace::new(DialogId::new());
        assert!(race.resolve(1));
        assert!(!race.resolve(2));
        assert_eq!(response.wait().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolution_disposes_every_listener() {
        let clicks = EventSource::<()>::new();
        let keys = EventSource::<char>::new();
        let (race, response) = ResponseRace::<&'static str>::new(DialogId::new());

        let r = race.clone();
        race.hold(clicks.subscribe(move |_| {
            r.resolve("click");
        }));
        let r = race.clone();
        race.hold(keys.subscribe(move |_| {
            r.resolve("key");
        }));
        assert_eq!(race.pending_listeners(), 2);

        clicks.emit(&());
        keys.emit(&'x');

        assert_eq!(clicks.listener_count(), 0);
        assert_eq!(keys.listener_count(), 0);
        assert!(race.is_resolved());
        assert_eq!(response.wait().await.unwrap(), "click");
    }

    #[test]
    fn test_hold_after_resolution_disposes_immediately() {
        let source = EventSource::<()>::new();
        let (race, _response) = ResponseRace::new(DialogId::new());
        race.resolve(());
        race.hold(source.subscribe(|_| {}));
        assert_eq!(source.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_race_abandons_response() {
        let id = DialogId::new();
        let (race, response) = ResponseRace::<u8>::new(id);
        drop(race);
        assert_eq!(response.wait().await.unwrap_err(), DialogError::ResponseAbandoned(id));
    }
}
