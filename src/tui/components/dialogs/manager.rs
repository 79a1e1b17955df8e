//! Dialog manager: show/hide sequencing for one host surface
//!
//! The manager owns nothing itself. It drives the host's two containers (the
//! single `active` slot and the LIFO `inactive` stack) and its overlay
//! through a fixed sequence of steps, each container mutation being one
//! closure run on the host thread. Suspension points (overlay fades, the
//! loaded signal, closing animations, response races) are awaited by the
//! calling task, never by the host thread.

use super::base::{Dialog, SizeBounds};
use super::host::{Fade, HostSurface, OverlayState, OverlayTransition};
use super::input::InputDialog;
use super::lifecycle::{self, DialogLifecycle};
use super::login::LoginDialog;
use super::message::MessageDialog;
use super::progress::{CloseCallback, ProgressController, ProgressDialog};
use super::selector::SelectorDialog;
use super::settings::{DialogSettings, LoginDialogSettings, MessageDialogStyle};
use super::types::{
    DialogError, DialogId, DialogResult, DialogState, LoginDialogData, MessageDialogResult, SelectedItem, Slot,
};
use crate::tui::components::animations::{AnimationCompletion, FrameSink};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened when a dialog left the containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Removal {
    pub slot: Slot,
    /// Dialog moved from the top of `inactive` into `active`
    pub promoted: Option<DialogId>,
}

/// The `active` slot and the `inactive` stack of a host
#[derive(Default)]
pub(crate) struct DialogStack {
    active: Option<Arc<dyn Dialog>>,
    /// Last element is the top of the stack
    inactive: Vec<Arc<dyn Dialog>>,
}

impl DialogStack {
    pub fn contains(&self, id: DialogId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn slot_of(&self, id: DialogId) -> Option<Slot> {
        if self.active.as_ref().is_some_and(|d| d.id() == id) {
            Some(Slot::Active)
        } else if self.inactive.iter().any(|d| d.id() == id) {
            Some(Slot::Inactive)
        } else {
            None
        }
    }

    pub fn active(&self) -> Option<&Arc<dyn Dialog>> {
        self.active.as_ref()
    }

    pub fn inactive_ids(&self) -> Vec<DialogId> {
        self.inactive.iter().map(|d| d.id()).collect()
    }

    pub fn is_active_empty(&self) -> bool {
        self.active.is_none()
    }

    pub fn len(&self) -> usize {
        self.inactive.len() + usize::from(self.active.is_some())
    }

    /// Whether removing `id` would leave `active` empty
    pub fn would_empty_active(&self, id: DialogId) -> bool {
        self.slot_of(id) == Some(Slot::Active) && self.inactive.is_empty()
    }

    /// Place `dialog` into `active`, pushing the current occupant onto the
    /// inactive stack. Returns the demoted dialog.
    pub fn mount(&mut self, dialog: Arc<dyn Dialog>) -> Option<DialogId> {
        let demoted = self.active.take().map(|previous| {
            let base = previous.base();
            base.set_state(base.state().with_slot(Slot::Inactive));
            let id = previous.id();
            self.inactive.push(previous);
            id
        });
        dialog.base().set_state(DialogState::Mounted(Slot::Active));
        self.active = Some(dialog);
        demoted
    }

    /// Take `id` out of the containers. Leaving `active` promotes the top
    /// of `inactive`; geometry is not recomputed for the promoted dialog.
    pub fn remove(&mut self, id: DialogId) -> Option<Removal> {
        match self.slot_of(id)? {
            Slot::Active => {
                self.active = self.inactive.pop();
                let promoted = self.active.as_ref().map(|next| {
                    let base = next.base();
                    base.set_state(base.state().with_slot(Slot::Active));
                    next.id()
                });
                Some(Removal {
                    slot: Slot::Active,
                    promoted,
                })
            }
            Slot::Inactive => {
                self.inactive.retain(|d| d.id() != id);
                Some(Removal {
                    slot: Slot::Inactive,
                    promoted: None,
                })
            }
        }
    }
}

/// Shows, stacks and hides dialogs on one [`HostSurface`]
#[derive(Clone)]
pub struct DialogManager {
    host: Arc<HostSurface>,
    defaults: DialogSettings,
}

impl DialogManager {
    pub fn new(host: Arc<HostSurface>) -> Self {
        Self {
            host,
            defaults: DialogSettings::default(),
        }
    }

    /// Settings used by the `show_*` helpers when none are passed
    pub fn with_default_settings(mut self, settings: DialogSettings) -> Self {
        self.defaults = settings;
        self
    }

    pub fn host(&self) -> &Arc<HostSurface> {
        &self.host
    }

    pub fn default_settings(&self) -> &DialogSettings {
        &self.defaults
    }

    /// Show `dialog` and resolve once it is mounted, loaded and announced.
    pub async fn show_dialog(&self, dialog: Arc<dyn Dialog>, animate_show: bool) -> DialogResult<()> {
        let host = Arc::clone(&self.host);
        debug!("Showing dialog {} on host '{}'", dialog.id(), host.name());

        if let Err(err) = enter(&host, &dialog, animate_show).await {
            if matches!(err, DialogError::HostUnavailable(_)) {
                warn!("Host '{}' went away while showing dialog {}", host.name(), dialog.id());
                dialog.base().detach();
                dialog.base().set_state(DialogState::Created);
            }
            return Err(err);
        }

        dialog.base().wait_loaded().await;

        let (h, d) = (Arc::clone(&host), Arc::clone(&dialog));
        host.invoke(move || {
            let title = d.base().title();
            info!("Dialog '{}' opened on host '{}'", title, h.name());
            lifecycle::notify(DialogLifecycle::Opened, h.id(), d.id(), title);
        })
        .await
    }

    /// Run the close sequence for `dialog` and resolve once it is removed
    /// and the overlay has settled.
    pub async fn hide_dialog(&self, dialog: Arc<dyn Dialog>) -> DialogResult<()> {
        if dialog.base().is_externally_shown() {
            return close_external(dialog).await;
        }

        let host = Arc::clone(&self.host);
        debug!("Hiding dialog {} on host '{}'", dialog.id(), host.name());

        let (h, d) = (Arc::clone(&host), Arc::clone(&dialog));
        let closing = host.invoke(move || begin_close(&h, &d)).await??;

        dialog.base().wait_loaded().await;
        if let Some(closing) = closing {
            closing.wait().await;
        }

        let (h, d) = (Arc::clone(&host), Arc::clone(&dialog));
        let transition = host.invoke(move || remove(&h, &d)).await??;
        if let Some(transition) = transition {
            transition.finish(&host).await?;
        }
        Ok(())
    }

    /// The active dialog, if it is a `T`
    pub async fn current_dialog<T: Dialog>(&self) -> DialogResult<Option<Arc<T>>> {
        let host = Arc::clone(&self.host);
        let active = self.host.invoke(move || host.state().stack.active().cloned()).await?;
        Ok(active.and_then(|dialog| dialog.into_any_arc().downcast::<T>().ok()))
    }

    pub async fn show_message(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        style: MessageDialogStyle,
        settings: Option<DialogSettings>,
    ) -> DialogResult<MessageDialogResult> {
        let settings = settings.unwrap_or_else(|| self.defaults.clone());
        let animate = settings.animate_show;
        let dialog = Arc::new(MessageDialog::new(title, message, style, settings));

        self.show_dialog(dialog.clone(), animate).await?;
        let result = dialog.wait_for_button_press().await?;
        self.hide_dialog(dialog).await?;
        Ok(result)
    }

    pub async fn show_input(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        settings: Option<DialogSettings>,
    ) -> DialogResult<Option<String>> {
        let settings = settings.unwrap_or_else(|| self.defaults.clone());
        let animate = settings.animate_show;
        let dialog = Arc::new(InputDialog::new(title, message, settings));

        self.show_dialog(dialog.clone(), animate).await?;
        let result = dialog.wait_for_input().await?;
        self.hide_dialog(dialog).await?;
        Ok(result)
    }

    pub async fn show_login(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        settings: Option<LoginDialogSettings>,
    ) -> DialogResult<Option<LoginDialogData>> {
        let settings = settings
            .unwrap_or_else(|| LoginDialogSettings::new(self.defaults.clone().with_affirmative_text("Login")));
        let animate = settings.base.animate_show;
        let dialog = Arc::new(LoginDialog::new(title, message, settings));

        self.show_dialog(dialog.clone(), animate).await?;
        let result = dialog.wait_for_login().await?;
        self.hide_dialog(dialog).await?;
        Ok(result)
    }

    pub async fn show_selector(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        items: Vec<String>,
        settings: Option<DialogSettings>,
    ) -> DialogResult<Option<SelectedItem>> {
        let settings = settings.unwrap_or_else(|| self.defaults.clone());
        let animate = settings.animate_show;
        let dialog = Arc::new(SelectorDialog::new(title, message, items, settings));

        self.show_dialog(dialog.clone(), animate).await?;
        let result = dialog.wait_for_selection().await?;
        self.hide_dialog(dialog).await?;
        Ok(result)
    }

    /// Show a progress dialog and hand back its live controller
    pub async fn show_progress(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        cancelable: bool,
        settings: Option<DialogSettings>,
    ) -> DialogResult<ProgressController> {
        let settings = settings.unwrap_or_else(|| self.defaults.clone());
        let animate = settings.animate_show;
        let dialog = Arc::new(ProgressDialog::new(title, message, cancelable, settings));

        self.show_dialog(dialog.clone(), animate).await?;

        let manager = self.clone();
        let target = Arc::clone(&dialog);
        let close: CloseCallback = Arc::new(move || {
            let manager = manager.clone();
            let target = Arc::clone(&target);
            async move { manager.hide_dialog(target).await }.boxed()
        });
        let controller = ProgressController::new(dialog, close);
        controller.watch_cancellation().await?;
        Ok(controller)
    }

    /// Show a caller-built dialog. `settings` overrides the dialog's own
    /// `animate_show` for the overlay.
    pub async fn show_custom(&self, dialog: Arc<dyn Dialog>, settings: Option<&DialogSettings>) -> DialogResult<()> {
        let animate = settings.map_or(dialog.base().settings().animate_show, |s| s.animate_show);
        self.show_dialog(dialog, animate).await
    }

    pub async fn hide(&self, dialog: Arc<dyn Dialog>) -> DialogResult<()> {
        self.hide_dialog(dialog).await
    }

    /// Show a message dialog on its own standalone surface, outside this
    /// host's containers and overlay.
    pub async fn show_modal_message_external(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        style: MessageDialogStyle,
        settings: Option<DialogSettings>,
    ) -> DialogResult<MessageDialogResult> {
        let settings = settings.unwrap_or_else(|| self.defaults.clone());
        let geometry = self.host.geometry().await?;
        let name = format!("{}-external", self.host.name());
        let surface = HostSurface::builder(&name)
            .geometry(geometry)
            .animator(Arc::clone(self.host.animator()))
            .build()
            .map_err(|err| {
                error!("Failed to create standalone surface '{}': {}", name, err);
                DialogError::HostUnavailable(name.clone())
            })?;

        let dialog = Arc::new(MessageDialog::new(title, message, style, settings));
        let (s, d): (_, Arc<dyn Dialog>) = (Arc::clone(&surface), dialog.clone());
        surface
            .invoke(move || {
                let base = d.base();
                base.set_size_bounds(SizeBounds::from_host_height(geometry.height));
                base.attach(&s);
                base.set_standalone(Arc::clone(&s));
                s.state().stack.mount(Arc::clone(&d));
                d.on_shown();
                base.mark_loaded();
            })
            .await?;
        debug!("Dialog {} shown on standalone surface '{}'", dialog.id(), name);

        let result = dialog.wait_for_button_press().await?;
        self.hide_dialog(dialog).await?;
        Ok(result)
    }
}

/// Step 0 and 1 of show: validate, then start the overlay fade-in when
/// nothing is active yet.
fn prepare_show(
    host: &Arc<HostSurface>,
    dialog: &Arc<dyn Dialog>,
    animate: bool,
) -> DialogResult<Option<OverlayTransition>> {
    let id = dialog.id();
    let base = dialog.base();
    let (shown, active_empty) = {
        let state = host.state();
        (state.stack.contains(id), state.stack.is_active_empty())
    };
    if shown || base.host().is_some() || base.is_externally_shown() {
        warn!("Rejected show of dialog {}: already shown", id);
        return Err(DialogError::AlreadyShown(id));
    }
    if active_empty && animate {
        if let Some(resource) = host.overlay_resource_missing(Fade::In) {
            warn!("Rejected show of dialog {}: no '{}' storyboard", id, resource);
            return Err(DialogError::MissingAnimationResource(resource.to_string()));
        }
    }

    base.attach(host);
    base.set_state(DialogState::OverlayShowing);
    if !active_empty {
        return Ok(None);
    }
    host.begin_overlay(Fade::In, animate)
}

/// Steps 1 to 3 of show, from the overlay fade-in to the mounted dialog
async fn enter(host: &Arc<HostSurface>, dialog: &Arc<dyn Dialog>, animate: bool) -> DialogResult<()> {
    let (h, d) = (Arc::clone(host), Arc::clone(dialog));
    let transition = host.invoke(move || prepare_show(&h, &d, animate)).await??;
    if let Some(transition) = transition {
        transition.finish(host).await?;
    }

    let (h, d) = (Arc::clone(host), Arc::clone(dialog));
    let transition = host.invoke(move || mount(&h, &d, animate)).await??;
    if let Some(transition) = transition {
        transition.finish(host).await?;
    }
    Ok(())
}

/// Step 2 and 3 of show: size the dialog, track resizes, mount it. A hide
/// that emptied the host since `prepare_show` leaves the overlay hidden or
/// fading out, so it is faded back in here.
fn mount(host: &Arc<HostSurface>, dialog: &Arc<dyn Dialog>, animate: bool) -> DialogResult<Option<OverlayTransition>> {
    let base = dialog.base();
    let geometry = host.state().geometry;
    base.set_size_bounds(SizeBounds::from_host_height(geometry.height));

    let weak = Arc::downgrade(dialog);
    let listener = host.on_size_changed(move |geometry| {
        if let Some(dialog) = weak.upgrade() {
            dialog.base().set_size_bounds(SizeBounds::from_host_height(geometry.height));
        }
    });

    let (demoted, stale, count) = {
        let mut state = host.state();
        let stale = state.resize_listeners.insert(dialog.id(), listener);
        let demoted = state.stack.mount(Arc::clone(dialog));
        (demoted, stale, state.stack.len())
    };
    drop(stale);
    if let Some(demoted) = demoted {
        debug!("Dialog {} moved to the inactive stack", demoted);
    }
    debug!("Host '{}' now holds {} dialogs", host.name(), count);

    dialog.on_shown();
    base.mark_loaded();

    let overlay = host.state().overlay.state;
    if !matches!(overlay, OverlayState::Hidden | OverlayState::FadingOut) {
        return Ok(None);
    }
    debug!("Host '{}' overlay went away before dialog {} mounted", host.name(), dialog.id());
    let animate = animate && host.overlay_resource_missing(Fade::In).is_none();
    host.begin_overlay(Fade::In, animate)
}

/// Steps 0 to 3 of hide: validate, drop the resize listener, run the
/// closing hook and start the closing animation.
fn begin_close(host: &Arc<HostSurface>, dialog: &Arc<dyn Dialog>) -> DialogResult<Option<AnimationCompletion>> {
    let id = dialog.id();
    let base = dialog.base();
    if base.state() == DialogState::Closing {
        warn!("Rejected hide of dialog {}: already closing", id);
        return Err(DialogError::AlreadyClosing(id));
    }
    let (shown, empties_active) = {
        let state = host.state();
        (state.stack.contains(id), state.stack.would_empty_active(id))
    };
    if !shown {
        warn!("Rejected hide of dialog {}: not shown on '{}'", id, host.name());
        return Err(DialogError::NotShown(id));
    }

    let animate = base.settings().animate_hide;
    let closing_animation = if animate {
        let resource = base
            .closing_animation()
            .ok_or(DialogError::MissingClosingAnimation(id))?;
        if !host.animator().has_resource(resource) {
            return Err(DialogError::MissingAnimationResource(resource.to_string()));
        }
        if empties_active {
            if let Some(resource) = host.overlay_resource_missing(Fade::Out) {
                return Err(DialogError::MissingAnimationResource(resource.to_string()));
            }
        }
        Some(resource.to_string())
    } else {
        None
    };

    base.set_state(DialogState::Closing);
    let listener = host.state().resize_listeners.remove(&id);
    drop(listener);
    dialog.on_closing();

    match closing_animation {
        Some(resource) => {
            let weak = Arc::downgrade(dialog);
            let sink: FrameSink = Arc::new(move |opacity| {
                if let Some(dialog) = weak.upgrade() {
                    dialog.base().set_opacity(opacity);
                }
            });
            host.animator().begin(&resource, base.opacity(), 0.0, sink).map(Some)
        }
        None => {
            base.set_opacity(0.0);
            Ok(None)
        }
    }
}

/// Steps 4 to 6 of hide: announce, remove, fade the overlay out when the
/// host is left without an active dialog.
fn remove(host: &Arc<HostSurface>, dialog: &Arc<dyn Dialog>) -> DialogResult<Option<OverlayTransition>> {
    let id = dialog.id();
    let base = dialog.base();
    let title = base.title();
    info!("Dialog '{}' closed on host '{}'", title, host.name());
    lifecycle::notify(DialogLifecycle::Closed, host.id(), id, title);

    let (removal, active_empty) = {
        let mut state = host.state();
        let removal = state.stack.remove(id);
        (removal, state.stack.is_active_empty())
    };
    base.detach();
    base.set_state(DialogState::Removed);

    let removal = removal.ok_or(DialogError::NotShown(id))?;
    debug!("Dialog {} left the {:?} container", id, removal.slot);
    if let Some(promoted) = removal.promoted {
        debug!("Dialog {} promoted to active", promoted);
    }

    if !active_empty {
        return Ok(None);
    }
    host.begin_overlay(Fade::Out, base.settings().animate_hide)
}

/// Hide path of an externally shown dialog: run its closing hook and tear
/// down its standalone surface.
async fn close_external(dialog: Arc<dyn Dialog>) -> DialogResult<()> {
    let id = dialog.id();
    let surface = dialog.base().host().ok_or(DialogError::NotShown(id))?;
    let d = Arc::clone(&dialog);
    surface
        .invoke(move || {
            let base = d.base();
            if base.state() == DialogState::Closing {
                return Err(DialogError::AlreadyClosing(id));
            }
            base.set_state(DialogState::Closing);
            d.on_closing();
            if let Some(standalone) = base.take_standalone() {
                standalone.state().stack.remove(id);
                debug!("Closed standalone surface '{}'", standalone.name());
            }
            base.detach();
            base.set_state(DialogState::Removed);
            Ok(())
        })
        .await?
}
