//! Progress dialog and its live controller
//!
//! A progress dialog has no answer to wait for. Once shown, the caller
//! drives it through a [`ProgressController`]: updating the message, title
//! and bar, and finally closing it. The cancel button and the settings'
//! cancellation token race once; the winner marks the dialog canceled and
//! raises `Canceled` without closing anything.

use super::base::{Dialog, DialogBase};
use super::controls::{Button, Focusable};
use super::race::ResponseRace;
use super::render::{ButtonView, DialogView, ViewRow};
use super::settings::DialogSettings;
use super::types::{DialogError, DialogResult, DialogState};
use crate::tui::events::{lock, EventSource, Subscription};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Runs the full hide sequence for a controller's dialog
pub type CloseCallback = Arc<dyn Fn() -> BoxFuture<'static, DialogResult<()>> + Send + Sync>;

/// Bar and message state of a progress dialog
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub message: String,
    pub minimum: f64,
    pub maximum: f64,
    pub value: f64,
    pub indeterminate: bool,
    pub cancelable: bool,
}

impl ProgressState {
    /// Fill ratio of the bar, `None` while indeterminate
    pub fn ratio(&self) -> Option<f64> {
        if self.indeterminate {
            return None;
        }
        let span = self.maximum - self.minimum;
        if span <= 0.0 {
            return Some(1.0);
        }
        Some(((self.value - self.minimum) / span).clamp(0.0, 1.0))
    }
}

pub struct ProgressDialog {
    base: DialogBase,
    progress: Mutex<ProgressState>,
    cancel: Button,
    canceled: AtomicBool,
    canceled_event: EventSource<()>,
    closed_event: EventSource<()>,
    race: Mutex<Option<Arc<ResponseRace<()>>>>,
}

impl ProgressDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, cancelable: bool, settings: DialogSettings) -> Self {
        let cancel = Button::new(settings.negative_button_text.clone());
        cancel.set_visible(cancelable);
        cancel.set_focus(cancelable);
        Self {
            base: DialogBase::new(title, settings),
            progress: Mutex::new(ProgressState {
                message: message.into(),
                minimum: 0.0,
                maximum: 1.0,
                value: 0.0,
                indeterminate: true,
                cancelable,
            }),
            cancel,
            canceled: AtomicBool::new(false),
            canceled_event: EventSource::new(),
            closed_event: EventSource::new(),
            race: Mutex::new(None),
        }
    }

    pub fn progress(&self) -> ProgressState {
        lock(&self.progress).clone()
    }

    pub fn cancel_button(&self) -> &Button {
        &self.cancel
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn apply_progress(&self, value: f64) -> DialogResult<()> {
        let mut progress = lock(&self.progress);
        if !(progress.minimum..=progress.maximum).contains(&value) {
            warn!(
                "Rejected progress {} outside [{}, {}]",
                value, progress.minimum, progress.maximum
            );
            return Err(DialogError::ValueOutOfRange {
                value,
                minimum: progress.minimum,
                maximum: progress.maximum,
            });
        }
        progress.value = value;
        progress.indeterminate = false;
        Ok(())
    }

    fn apply_minimum(&self, minimum: f64) {
        let mut progress = lock(&self.progress);
        progress.minimum = minimum;
        progress.maximum = progress.maximum.max(minimum);
        progress.value = progress.value.clamp(progress.minimum, progress.maximum);
    }

    fn apply_maximum(&self, maximum: f64) {
        let mut progress = lock(&self.progress);
        progress.maximum = maximum;
        progress.minimum = progress.minimum.min(maximum);
        progress.value = progress.value.clamp(progress.minimum, progress.maximum);
    }

    fn apply_cancelable(&self, cancelable: bool) {
        lock(&self.progress).cancelable = cancelable;
        self.cancel.set_visible(cancelable);
    }

    fn mark_canceled(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.cancel.set_enabled(false);
        debug!("Progress dialog {} canceled", self.base.id());
        self.canceled_event.emit(&());
    }

    fn register_race(self: &Arc<Self>) {
        let (race, _response) = ResponseRace::<()>::new(self.base.id());
        let keys = self.base.keys();
        let weak = Arc::downgrade(self);

        let (r, w) = (race.clone(), weak.clone());
        race.hold(self.cancel.on_click(move || {
            if r.resolve(()) {
                if let Some(dialog) = w.upgrade() {
                    dialog.mark_canceled();
                }
            }
        }));

        let (r, w, k) = (race.clone(), weak.clone(), keys.clone());
        race.hold(self.cancel.on_key_down(move |key| {
            if k.is_accept(key) && r.resolve(()) {
                if let Some(dialog) = w.upgrade() {
                    dialog.mark_canceled();
                }
            }
        }));

        let (r, w, k) = (race.clone(), weak.clone(), keys.clone());
        race.hold(self.base.on_key_down(move |key| {
            let Some(dialog) = w.upgrade() else { return };
            if k.is_dismiss(key) && dialog.cancel.is_focusable() && r.resolve(()) {
                dialog.mark_canceled();
            }
        }));

        let (r, w) = (race.clone(), weak);
        race.hold(self.base.settings().cancellation_token.register(move || {
            if r.resolve(()) {
                if let Some(dialog) = w.upgrade() {
                    dialog.mark_canceled();
                }
            }
        }));

        *lock(&self.race) = Some(race);
        self.base.begin_awaiting();
    }

    /// Stop listening for cancellation without marking the dialog canceled
    fn withdraw_race(&self) {
        let race = lock(&self.race).take();
        if let Some(race) = race {
            if race.withdraw() {
                debug!("Progress dialog {} stopped listening for cancellation", self.base.id());
            }
        }
    }
}

impl Dialog for ProgressDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn on_closing(&self) {
        self.withdraw_race();
    }

    fn focusables(&self) -> Vec<&dyn Focusable> {
        vec![&self.cancel]
    }

    fn view(&self) -> DialogView {
        let progress = self.progress();
        DialogView {
            message: progress.message.clone(),
            rows: vec![ViewRow::Progress {
                ratio: progress.ratio(),
            }],
            buttons: ButtonView::visible(&[&self.cancel]),
            ..self.base.view()
        }
    }
}

/// Live handle to a shown progress dialog
pub struct ProgressController {
    dialog: Arc<ProgressDialog>,
    close: CloseCallback,
}

impl ProgressController {
    pub(crate) fn new(dialog: Arc<ProgressDialog>, close: CloseCallback) -> Self {
        Self { dialog, close }
    }

    pub fn dialog(&self) -> &Arc<ProgressDialog> {
        &self.dialog
    }

    /// Start listening for cancel clicks and the cancellation token
    pub(crate) async fn watch_cancellation(&self) -> DialogResult<()> {
        let dialog = Arc::clone(&self.dialog);
        self.on_host(move |_| dialog.register_race()).await
    }

    async fn on_host<T, F>(&self, f: F) -> DialogResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ProgressDialog) -> T + Send + 'static,
    {
        let dialog = Arc::clone(&self.dialog);
        match self.dialog.base().host() {
            Some(host) => host.invoke(move || f(&dialog)).await,
            None => Ok(f(&dialog)),
        }
    }

    /// Set the bar value; rejected without change outside [minimum, maximum]
    pub async fn set_progress(&self, value: f64) -> DialogResult<()> {
        self.on_host(move |d| d.apply_progress(value)).await?
    }

    pub async fn set_indeterminate(&self) -> DialogResult<()> {
        self.on_host(|d| lock(&d.progress).indeterminate = true).await
    }

    pub async fn set_cancelable(&self, cancelable: bool) -> DialogResult<()> {
        self.on_host(move |d| d.apply_cancelable(cancelable)).await
    }

    pub async fn set_message(&self, message: impl Into<String>) -> DialogResult<()> {
        let message = message.into();
        self.on_host(move |d| lock(&d.progress).message = message).await
    }

    pub async fn set_title(&self, title: impl Into<String>) -> DialogResult<()> {
        let title = title.into();
        self.on_host(move |d| d.base.set_title(title)).await
    }

    pub async fn set_minimum(&self, minimum: f64) -> DialogResult<()> {
        self.on_host(move |d| d.apply_minimum(minimum)).await
    }

    pub async fn set_maximum(&self, maximum: f64) -> DialogResult<()> {
        self.on_host(move |d| d.apply_maximum(maximum)).await
    }

    pub fn minimum(&self) -> f64 {
        self.dialog.progress().minimum
    }

    pub fn maximum(&self) -> f64 {
        self.dialog.progress().maximum
    }

    pub fn is_canceled(&self) -> bool {
        self.dialog.is_canceled()
    }

    /// Whether the dialog is still shown
    pub fn is_open(&self) -> bool {
        !matches!(
            self.dialog.base().state(),
            DialogState::Closing | DialogState::Removed
        )
    }

    pub fn on_canceled<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dialog.canceled_event.subscribe(move |_| handler())
    }

    pub fn on_closed<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dialog.closed_event.subscribe(move |_| handler())
    }

    /// Hide the dialog and raise `Closed` once it is gone
    pub async fn close(&self) -> DialogResult<()> {
        (self.close)().await?;
        self.dialog.closed_event.emit(&());
        Ok(())
    }
}

impl fmt::Debug for ProgressController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressController")
            .field("dialog", self.dialog.base())
            .field("progress", &self.dialog.progress())
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::host::{HostSurface, OverlayState};
    use crate::tui::components::dialogs::CancellationToken;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    fn controller(cancelable: bool, settings: DialogSettings) -> ProgressController {
        let dialog = Arc::new(ProgressDialog::new("Working", "Please wait", cancelable, settings));
        let close: CloseCallback = Arc::new(|| async { Ok(()) }.boxed());
        ProgressController::new(dialog, close)
    }

    #[tokio::test]
    async fn test_out_of_range_progress_is_rejected() {
        let c = controller(false, DialogSettings::default());
        c.set_maximum(10.0).await.unwrap();
        c.set_progress(4.0).await.unwrap();
        assert_eq!(c.dialog().progress().ratio(), Some(0.4));

        let err = c.set_progress(11.0).await.unwrap_err();
        assert_eq!(err, DialogError::ValueOutOfRange { value: 11.0, minimum: 0.0, maximum: 10.0 });
        assert_eq!(c.dialog().progress().value, 4.0);
        assert!(!c.dialog().progress().indeterminate);
    }

    #[tokio::test]
    async fn test_indeterminate_until_first_progress() {
        let c = controller(false, DialogSettings::default());
        assert_eq!(c.dialog().progress().ratio(), None);
        c.set_progress(1.0).await.unwrap();
        c.set_indeterminate().await.unwrap();
        assert_eq!(c.dialog().progress().ratio(), None);
    }

    #[tokio::test]
    async fn test_cancel_click_marks_canceled_once() {
        let token = CancellationToken::new();
        let c = controller(true, DialogSettings::default().with_cancellation_token(token.clone()));
        c.watch_cancellation().await.unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let _subscription = c.on_canceled(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(c.dialog().cancel_button().click());
        token.cancel();

        assert!(c.is_canceled());
        assert!(!c.dialog().cancel_button().is_enabled());
        assert!(!c.dialog().cancel_button().click());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_lifecycle_on_host() {
        let host = HostSurface::new("progress", Default::default()).unwrap();
        let manager = host.dialogs();
        let settings = DialogSettings::default().animated(false);
        let c = manager.show_progress("Copy", "Copying files", true, Some(settings)).await.unwrap();
        assert!(c.is_open());

        c.set_message("Almost there").await.unwrap();
        c.set_progress(0.5).await.unwrap();
        let view = host.view().await.unwrap();
        let dialog = view.dialog.unwrap();
        assert_eq!(dialog.message, "Almost there");
        assert_eq!(dialog.rows, vec![ViewRow::Progress { ratio: Some(0.5) }]);

        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();
        let _subscription = c.on_closed(move || flag.store(true, Ordering::SeqCst));
        c.close().await.unwrap();

        assert!(closed.load(Ordering::SeqCst));
        assert!(!c.is_open());
        assert!(!c.is_canceled());
        assert_eq!(host.snapshot().await.unwrap().overlay, OverlayState::Hidden);
        assert!(c.close().await.is_err());
    }

    #[tokio::test]
    async fn test_token_fired_after_close_is_ignored() {
        let token = CancellationToken::new();
        let settings = DialogSettings::default()
            .animated(false)
            .with_cancellation_token(token.clone());
        let host = HostSurface::builder("progress-token")
            .default_settings(settings)
            .build()
            .unwrap();
        let manager = host.dialogs();

        for _ in 0..3 {
            let c = manager.show_progress("Sync", "Syncing", true, None).await.unwrap();
            assert_eq!(token.listener_count(), 1);
            c.close().await.unwrap();
            assert_eq!(token.listener_count(), 0);
        }

        let c = manager.show_progress("Sync", "Syncing", true, None).await.unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let _subscription = c.on_canceled(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        c.close().await.unwrap();

        token.cancel();
        assert!(!c.is_open());
        assert!(!c.is_canceled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
