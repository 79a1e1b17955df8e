//! Host surface
//!
//! A [`HostSurface`] is the window-like thing dialogs are shown on. It owns
//! the two dialog containers, the dimming overlay, its geometry and the
//! dispatcher thread all of that state belongs to. State is only touched
//! from jobs running on that thread; the mutex around it exists to satisfy
//! the type system and is never held across a callback or an await.

use super::base::Dialog;
use super::dispatcher::HostDispatcher;
use super::manager::{DialogManager, DialogStack};
use super::render::SurfaceView;
use super::settings::DialogSettings;
use super::types::{DialogId, DialogResult, DialogState, HostId};
use crate::tui::components::animations::{
    AnimationCompletion, Animator, FrameSink, StoryboardAnimator, OVERLAY_FADE_IN, OVERLAY_FADE_OUT,
};
use crate::tui::events::{lock, EventSource, Subscription};
use crossterm::event::KeyEvent;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Opacity the overlay settles at when fully shown
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.7;

/// Host size in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Visibility of the dimming overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fade {
    In,
    Out,
}

impl Fade {
    fn resource(self) -> &'static str {
        match self {
            Fade::In => OVERLAY_FADE_IN,
            Fade::Out => OVERLAY_FADE_OUT,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Overlay {
    pub state: OverlayState,
    pub opacity: f32,
    pub generation: u64,
    pub fade_ins: u32,
    pub fade_outs: u32,
}

/// A started overlay fade the caller still has to await
pub(crate) struct OverlayTransition {
    generation: u64,
    fade: Fade,
    completion: AnimationCompletion,
}

impl OverlayTransition {
    /// Wait for the fade, then settle the overlay on the host thread
    pub(crate) async fn finish(self, host: &Arc<HostSurface>) -> DialogResult<()> {
        self.completion.wait().await;
        let (generation, fade) = (self.generation, self.fade);
        let h = Arc::clone(host);
        host.invoke(move || h.settle_overlay(generation, fade)).await
    }
}

pub(crate) struct HostState {
    pub stack: DialogStack,
    pub overlay: Overlay,
    pub geometry: Geometry,
    pub resize_listeners: HashMap<DialogId, Subscription>,
}

/// Read-only picture of a host's containers and overlay
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub active: Option<DialogId>,
    /// Bottom of the stack first
    pub inactive: Vec<DialogId>,
    pub overlay: OverlayState,
    pub overlay_opacity: f32,
    pub overlay_fade_ins: u32,
    pub overlay_fade_outs: u32,
    pub resize_listeners: usize,
    pub geometry: Geometry,
}

/// The surface dialogs are shown on
pub struct HostSurface {
    id: HostId,
    name: String,
    dispatcher: HostDispatcher,
    animator: Arc<dyn Animator>,
    overlay_opacity: f32,
    defaults: DialogSettings,
    state: Mutex<HostState>,
    size_changed: EventSource<Geometry>,
}

impl HostSurface {
    /// Host with the default storyboards
    pub fn new(name: impl Into<String>, geometry: Geometry) -> std::io::Result<Arc<Self>> {
        Self::builder(name).geometry(geometry).build()
    }

    pub fn builder(name: impl Into<String>) -> HostSurfaceBuilder {
        HostSurfaceBuilder::new(name)
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn animator(&self) -> &Arc<dyn Animator> {
        &self.animator
    }

    /// The show/hide coordinator for this host
    pub fn dialogs(self: &Arc<Self>) -> DialogManager {
        DialogManager::new(Arc::clone(self)).with_default_settings(self.defaults.clone())
    }

    pub fn is_host_thread(&self) -> bool {
        self.dispatcher.is_host_thread()
    }

    /// Run `f` on this host's affinity thread
    pub async fn invoke<T, F>(&self, f: F) -> DialogResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.dispatcher.invoke(f).await
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, HostState> {
        debug_assert!(self.is_host_thread(), "host state touched off the host thread");
        lock(&self.state)
    }

    /// Listen to geometry changes
    pub fn on_size_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Geometry) + Send + Sync + 'static,
    {
        self.size_changed.subscribe(handler)
    }

    /// Resize the host and notify shown dialogs
    pub async fn set_size(self: &Arc<Self>, width: u16, height: u16) -> DialogResult<()> {
        let host = Arc::clone(self);
        self.invoke(move || {
            let geometry = Geometry::new(width, height);
            host.state().geometry = geometry;
            debug!("Host '{}' resized to {}x{}", host.name, width, height);
            host.size_changed.emit(&geometry);
        })
        .await
    }

    pub async fn geometry(self: &Arc<Self>) -> DialogResult<Geometry> {
        let host = Arc::clone(self);
        self.invoke(move || host.state().geometry).await
    }

    pub async fn snapshot(self: &Arc<Self>) -> DialogResult<HostSnapshot> {
        let host = Arc::clone(self);
        self.invoke(move || {
            let state = host.state();
            HostSnapshot {
                active: state.stack.active().map(|d| d.id()),
                inactive: state.stack.inactive_ids(),
                overlay: state.overlay.state,
                overlay_opacity: state.overlay.opacity,
                overlay_fade_ins: state.overlay.fade_ins,
                overlay_fade_outs: state.overlay.fade_outs,
                resize_listeners: state.resize_listeners.len(),
                geometry: state.geometry,
            }
        })
        .await
    }

    /// Id and lifecycle state of the active dialog
    pub async fn active_dialog(self: &Arc<Self>) -> DialogResult<Option<(DialogId, DialogState)>> {
        let host = Arc::clone(self);
        self.invoke(move || host.state().stack.active().map(|d| (d.id(), d.base().state())))
            .await
    }

    /// Everything the renderer needs for one frame
    pub async fn view(self: &Arc<Self>) -> DialogResult<SurfaceView> {
        let host = Arc::clone(self);
        self.invoke(move || {
            let (active, overlay, opacity, geometry) = {
                let state = host.state();
                (
                    state.stack.active().cloned(),
                    state.overlay.state,
                    state.overlay.opacity,
                    state.geometry,
                )
            };
            SurfaceView {
                overlay,
                overlay_opacity: opacity,
                geometry,
                dialog: active.map(|d| d.view()),
            }
        })
        .await
    }

    /// Deliver a key press to the active dialog. Returns false when no
    /// dialog is active.
    pub async fn dispatch_key(self: &Arc<Self>, key: KeyEvent) -> DialogResult<bool> {
        let host = Arc::clone(self);
        self.invoke(move || {
            let active: Option<Arc<dyn Dialog>> = host.state().stack.active().cloned();
            match active {
                Some(dialog) => {
                    trace!("Routing {:?} to dialog {}", key.code, dialog.id());
                    dialog.handle_key(&key);
                    true
                }
                None => false,
            }
        })
        .await
    }

    /// Start an overlay fade. Must run on the host thread with the state
    /// unlocked; the animator may push a first frame synchronously. A fade
    /// towards the state the overlay already rests in is skipped.
    pub(crate) fn begin_overlay(self: &Arc<Self>, fade: Fade, animate: bool) -> DialogResult<Option<OverlayTransition>> {
        let (generation, from) = {
            let mut state = self.state();
            let overlay = &mut state.overlay;
            let settled = match fade {
                Fade::In => overlay.state == OverlayState::Visible,
                Fade::Out => overlay.state == OverlayState::Hidden,
            };
            if settled {
                return Ok(None);
            }
            overlay.generation += 1;
            match fade {
                Fade::In => {
                    overlay.state = OverlayState::FadingIn;
                    overlay.fade_ins += 1;
                }
                Fade::Out => {
                    overlay.state = OverlayState::FadingOut;
                    overlay.fade_outs += 1;
                }
            }
            (overlay.generation, overlay.opacity)
        };
        debug!("Host '{}' overlay {:?} (animated: {})", self.name, fade, animate);

        if !animate {
            self.settle_overlay(generation, fade);
            return Ok(None);
        }

        let to = self.fade_target(fade);
        let weak = Arc::downgrade(self);
        let sink: FrameSink = Arc::new(move |opacity| {
            if let Some(host) = weak.upgrade() {
                let mut state = host.state();
                if state.overlay.generation == generation {
                    state.overlay.opacity = opacity;
                }
            }
        });
        let completion = self.animator.begin(fade.resource(), from, to, sink)?;
        Ok(Some(OverlayTransition {
            generation,
            fade,
            completion,
        }))
    }

    /// Put the overlay in its final state unless a newer fade superseded it
    pub(crate) fn settle_overlay(&self, generation: u64, fade: Fade) {
        let to = self.fade_target(fade);
        let mut state = self.state();
        if state.overlay.generation != generation {
            return;
        }
        state.overlay.opacity = to;
        state.overlay.state = match fade {
            Fade::In => OverlayState::Visible,
            Fade::Out => OverlayState::Hidden,
        };
    }

    pub(crate) fn overlay_resource_missing(&self, fade: Fade) -> Option<&'static str> {
        let resource = fade.resource();
        (!self.animator.has_resource(resource)).then_some(resource)
    }

    fn fade_target(&self, fade: Fade) -> f32 {
        match fade {
            Fade::In => self.overlay_opacity,
            Fade::Out => 0.0,
        }
    }
}

impl fmt::Debug for HostSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSurface")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Builder for [`HostSurface`]
pub struct HostSurfaceBuilder {
    name: String,
    geometry: Geometry,
    animator: Arc<dyn Animator>,
    overlay_opacity: f32,
    defaults: DialogSettings,
}

impl HostSurfaceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::new(80, 24),
            animator: Arc::new(StoryboardAnimator::default()),
            overlay_opacity: DEFAULT_OVERLAY_OPACITY,
            defaults: DialogSettings::default(),
        }
    }

    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn animator(mut self, animator: Arc<dyn Animator>) -> Self {
        self.animator = animator;
        self
    }

    pub fn overlay_opacity(mut self, opacity: f32) -> Self {
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Settings dialogs shown through [`HostSurface::dialogs`] fall back to
    pub fn default_settings(mut self, settings: DialogSettings) -> Self {
        self.defaults = settings;
        self
    }

    pub fn build(self) -> std::io::Result<Arc<HostSurface>> {
        let dispatcher = HostDispatcher::spawn(self.name.clone())?;
        Ok(Arc::new(HostSurface {
            id: HostId::new(),
            name: self.name,
            dispatcher,
            animator: self.animator,
            overlay_opacity: self.overlay_opacity,
            defaults: self.defaults,
            state: Mutex::new(HostState {
                stack: DialogStack::default(),
                overlay: Overlay::default(),
                geometry: self.geometry,
                resize_listeners: HashMap::new(),
            }),
            size_changed: EventSource::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::animations::AnimationConfig;
    use std::time::Duration;

    fn host() -> Arc<HostSurface> {
        HostSurface::new("host-test", Geometry::new(100, 40)).unwrap()
    }

    #[tokio::test]
    async fn test_new_host_is_empty() {
        let snapshot = host().snapshot().await.unwrap();
        assert_eq!(snapshot.active, None);
        assert!(snapshot.inactive.is_empty());
        assert_eq!(snapshot.overlay, OverlayState::Hidden);
        assert_eq!(snapshot.geometry, Geometry::new(100, 40));
    }

    #[tokio::test]
    async fn test_set_size_notifies_listeners() {
        let host = host();
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let _sub = host.on_size_changed(move |g| *s.lock().unwrap() = Some(*g));

        host.set_size(120, 50).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(Geometry::new(120, 50)));
        assert_eq!(host.geometry().await.unwrap(), Geometry::new(120, 50));
    }

    #[tokio::test]
    async fn test_dispatch_key_without_dialog() {
        let host = host();
        let key = KeyEvent::from(crossterm::event::KeyCode::Esc);
        assert!(!host.dispatch_key(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_newer_fade_supersedes_older() {
        let animator = StoryboardAnimator::empty()
            .with_storyboard(OVERLAY_FADE_IN, AnimationConfig::new(Duration::from_millis(5)))
            .with_storyboard(OVERLAY_FADE_OUT, AnimationConfig::new(Duration::from_millis(5)));
        let host = HostSurface::builder("fades").animator(Arc::new(animator)).build().unwrap();

        let h = host.clone();
        let first = host.invoke(move || h.begin_overlay(Fade::In, true)).await.unwrap().unwrap();
        let h = host.clone();
        let second = host.invoke(move || h.begin_overlay(Fade::Out, false)).await.unwrap().unwrap();
        assert!(second.is_none());

        first.unwrap().finish(&host).await.unwrap();
        let snapshot = host.snapshot().await.unwrap();
        assert_eq!(snapshot.overlay, OverlayState::Hidden);
        assert_eq!(snapshot.overlay_opacity, 0.0);
    }
}
