//! Process-wide dialog opened/closed notifications
//!
//! Fired on the host thread exactly once when a dialog finishes opening and
//! once when it closes. Handlers see every host, so filter on
//! [`DialogLifecycleEvent::host`] when only one matters.

use super::types::{DialogId, HostId};
use crate::tui::events::{EventSource, Subscription};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogLifecycle {
    Opened,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogLifecycleEvent {
    pub kind: DialogLifecycle,
    pub host: HostId,
    pub dialog: DialogId,
    pub title: String,
}

fn events() -> &'static EventSource<DialogLifecycleEvent> {
    static EVENTS: OnceLock<EventSource<DialogLifecycleEvent>> = OnceLock::new();
    EVENTS.get_or_init(EventSource::new)
}

/// Listen to both notifications
pub fn on_dialog_lifecycle<F>(handler: F) -> Subscription
where
    F: Fn(&DialogLifecycleEvent) + Send + Sync + 'static,
{
    events().subscribe(handler)
}

/// Listen to `DialogOpened`
pub fn on_dialog_opened<F>(handler: F) -> Subscription
where
    F: Fn(&DialogLifecycleEvent) + Send + Sync + 'static,
{
    events().subscribe(move |event| {
        if event.kind == DialogLifecycle::Opened {
            handler(event);
        }
    })
}

/// Listen to `DialogClosed`
pub fn on_dialog_closed<F>(handler: F) -> Subscription
where
    F: Fn(&DialogLifecycleEvent) + Send + Sync + 'static,
{
    events().subscribe(move |event| {
        if event.kind == DialogLifecycle::Closed {
            handler(event);
        }
    })
}

pub(crate) fn notify(kind: DialogLifecycle, host: HostId, dialog: DialogId, title: String) {
    events().emit(&DialogLifecycleEvent {
        kind,
        host,
        dialog,
        title,
    });
}
