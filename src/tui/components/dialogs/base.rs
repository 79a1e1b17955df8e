//! Dialog instance state and the [`Dialog`] trait
//!
//! Every flavor embeds a [`DialogBase`] holding what the host coordinator
//! needs: identity, settings, lifecycle state, the loaded signal, opacity,
//! height bounds and the dialog-level key event. Flavors add their controls
//! and their own response race on top.

use super::controls::Focusable;
use super::host::HostSurface;
use super::render::DialogView;
use super::settings::DialogSettings;
use super::types::{DialogId, DialogState};
use crate::tui::components::animations::DIALOG_CLOSE;
use crate::tui::events::{lock, EventSource, Subscription};
use crate::tui::keys::DialogKeyMap;
use crossterm::event::KeyEvent;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;

/// Height limits derived from the host geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeBounds {
    pub min_height: u16,
    pub max_height: u16,
}

impl SizeBounds {
    /// A dialog may use between a quarter of the host and all of it
    pub fn from_host_height(height: u16) -> Self {
        Self {
            min_height: height / 4,
            max_height: height,
        }
    }
}

/// State common to every dialog
pub struct DialogBase {
    id: DialogId,
    title: Mutex<String>,
    settings: DialogSettings,
    state: Mutex<DialogState>,
    host: Mutex<Weak<HostSurface>>,
    standalone: Mutex<Option<Arc<HostSurface>>>,
    loaded: watch::Sender<bool>,
    opacity: Mutex<f32>,
    bounds: Mutex<SizeBounds>,
    closing_animation: Option<String>,
    key_down: EventSource<KeyEvent>,
    keys: DialogKeyMap,
}

impl DialogBase {
    pub fn new(title: impl Into<String>, settings: DialogSettings) -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            id: DialogId::new(),
            title: Mutex::new(title.into()),
            settings,
            state: Mutex::new(DialogState::Created),
            host: Mutex::new(Weak::new()),
            standalone: Mutex::new(None),
            loaded,
            opacity: Mutex::new(1.0),
            bounds: Mutex::new(SizeBounds::default()),
            closing_animation: Some(DIALOG_CLOSE.to_string()),
            key_down: EventSource::new(),
            keys: DialogKeyMap::default(),
        }
    }

    /// Replace the closing storyboard; `None` means the dialog defines none
    pub fn with_closing_animation(mut self, resource: Option<String>) -> Self {
        self.closing_animation = resource;
        self
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn title(&self) -> String {
        lock(&self.title).clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *lock(&self.title) = title.into();
    }

    pub fn settings(&self) -> &DialogSettings {
        &self.settings
    }

    pub fn state(&self) -> DialogState {
        *lock(&self.state)
    }

    pub(crate) fn set_state(&self, state: DialogState) {
        *lock(&self.state) = state;
    }

    /// A mounted dialog starts racing for its response in the same slot
    pub(crate) fn begin_awaiting(&self) {
        let mut state = lock(&self.state);
        if let DialogState::Mounted(slot) = *state {
            *state = DialogState::AwaitingResponse(slot);
        }
    }

    /// Host the dialog is currently shown on
    pub fn host(&self) -> Option<Arc<HostSurface>> {
        lock(&self.host).upgrade()
    }

    pub(crate) fn attach(&self, host: &Arc<HostSurface>) {
        *lock(&self.host) = Arc::downgrade(host);
    }

    pub(crate) fn detach(&self) {
        *lock(&self.host) = Weak::new();
    }

    /// Standalone surface owned by an externally shown dialog
    pub(crate) fn set_standalone(&self, surface: Arc<HostSurface>) {
        *lock(&self.standalone) = Some(surface);
    }

    pub(crate) fn take_standalone(&self) -> Option<Arc<HostSurface>> {
        lock(&self.standalone).take()
    }

    pub fn is_externally_shown(&self) -> bool {
        lock(&self.standalone).is_some()
    }

    /// Mount notification from the host
    pub(crate) fn mark_loaded(&self) {
        self.loaded.send_replace(true);
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    /// Resolves once the dialog has been mounted, immediately if it already is
    pub async fn wait_loaded(&self) {
        let mut receiver = self.loaded.subscribe();
        let _ = receiver.wait_for(|loaded| *loaded).await;
    }

    pub fn opacity(&self) -> f32 {
        *lock(&self.opacity)
    }

    pub(crate) fn set_opacity(&self, opacity: f32) {
        *lock(&self.opacity) = opacity.clamp(0.0, 1.0);
    }

    pub fn size_bounds(&self) -> SizeBounds {
        *lock(&self.bounds)
    }

    pub(crate) fn set_size_bounds(&self, bounds: SizeBounds) {
        *lock(&self.bounds) = bounds;
    }

    pub fn closing_animation(&self) -> Option<&str> {
        self.closing_animation.as_deref()
    }

    pub fn keys(&self) -> &DialogKeyMap {
        &self.keys
    }

    /// Listen to keys that reach the dialog itself
    pub fn on_key_down<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        self.key_down.subscribe(handler)
    }

    pub(crate) fn emit_key(&self, key: &KeyEvent) {
        self.key_down.emit(key);
    }

    /// View with only the chrome filled in
    pub fn view(&self) -> DialogView {
        DialogView {
            title: self.title(),
            color_scheme: self.settings.color_scheme,
            maximum_body_height: self.settings.maximum_body_height,
            bounds: self.size_bounds(),
            opacity: self.opacity(),
            ..DialogView::default()
        }
    }
}

impl fmt::Debug for DialogBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogBase")
            .field("id", &self.id)
            .field("title", &self.title())
            .field("state", &self.state())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Upcasting support so hosts can hand back concrete dialog types
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Dialog> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A dialog that can be shown on a [`HostSurface`]
pub trait Dialog: AsAnyArc + Send + Sync + 'static {
    fn base(&self) -> &DialogBase;

    fn id(&self) -> DialogId {
        self.base().id()
    }

    /// Called on the host thread once the dialog is mounted
    fn on_shown(&self) {}

    /// Called on the host thread when the close sequence starts
    fn on_closing(&self) {}

    /// Controls in focus order
    fn focusables(&self) -> Vec<&dyn Focusable> {
        Vec::new()
    }

    /// Snapshot for drawing
    fn view(&self) -> DialogView {
        self.base().view()
    }

    /// Route a key press: the focused control first, then the dialog
    fn handle_key(&self, key: &KeyEvent) {
        route_key(&self.focusables(), self.base(), key);
    }
}

/// Give `target` focus and take it from every other control
pub fn move_focus(controls: &[&dyn Focusable], target: &dyn Focusable) {
    for control in controls {
        control.set_focus(false);
    }
    target.set_focus(true);
}

pub(crate) fn route_key(controls: &[&dyn Focusable], base: &DialogBase, key: &KeyEvent) {
    if base.keys().is_focus_next(key) {
        focus_next(controls);
        return;
    }
    if let Some(focused) = controls.iter().find(|c| c.has_focus()) {
        focused.press_key(key);
    }
    base.emit_key(key);
}

fn focus_next(controls: &[&dyn Focusable]) {
    let candidates: Vec<&&dyn Focusable> = controls.iter().filter(|c| c.is_focusable()).collect();
    if candidates.is_empty() {
        return;
    }
    let current = candidates.iter().position(|c| c.has_focus());
    let next = current.map_or(0, |i| (i + 1) % candidates.len());
    for control in controls {
        control.set_focus(false);
    }
    candidates[next].set_focus(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::controls::Button;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_size_bounds_from_host() {
        assert_eq!(
            SizeBounds::from_host_height(40),
            SizeBounds { min_height: 10, max_height: 40 }
        );
    }

    #[tokio::test]
    async fn test_wait_loaded_after_mount_returns_immediately() {
        let base = DialogBase::new("t", DialogSettings::default());
        assert!(!base.is_loaded());
        base.mark_loaded();
        base.wait_loaded().await;
        assert!(base.is_loaded());
    }

    #[tokio::test]
    async fn test_wait_loaded_before_mount_waits() {
        let base = Arc::new(DialogBase::new("t", DialogSettings::default()));
        let waiter = {
            let base = base.clone();
            tokio::spawn(async move { base.wait_loaded().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        base.mark_loaded();
        waiter.await.unwrap();
    }

    #[test]
    fn test_tab_cycles_focus_over_visible_controls() {
        let base = DialogBase::new("t", DialogSettings::default());
        let a = Button::new("a");
        let b = Button::new("b");
        let c = Button::new("c");
        b.set_visible(false);
        let controls: Vec<&dyn Focusable> = vec![&a, &b, &c];
        move_focus(&controls, &a);

        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        route_key(&controls, &base, &tab);
        assert!(c.has_focus() && !a.has_focus());
        route_key(&controls, &base, &tab);
        assert!(a.has_focus());
    }
}
