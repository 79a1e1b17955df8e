//! Context-based entry points
//!
//! Callers that only hold an opaque context (a view model, a controller)
//! register it against the [`UiElement`] that displays it. The
//! [`DialogCoordinator`] resolves a context to that element's host surface
//! and forwards to the host's [`DialogManager`].
//!
//! The registration table is process-wide. Entries are keyed by the
//! context's `Arc` identity and hold only weak references, so neither side
//! is kept alive by being registered. Detaching an element clears every
//! registration made against it.

use super::base::Dialog;
use super::host::HostSurface;
use super::manager::DialogManager;
use super::progress::ProgressController;
use super::settings::{DialogSettings, LoginDialogSettings, MessageDialogStyle};
use super::types::{DialogError, DialogResult, LoginDialogData, MessageDialogResult, SelectedItem};
use crate::tui::events::lock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::{debug, warn};

/// Opaque caller context
pub type DialogContext = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContextKey(usize);

impl ContextKey {
    fn of(context: &DialogContext) -> Self {
        Self(Arc::as_ptr(context) as *const () as usize)
    }
}

struct Registration {
    context: Weak<dyn Any + Send + Sync>,
    element: Weak<UiElement>,
}

fn registry() -> &'static Mutex<HashMap<ContextKey, Registration>> {
    static REGISTRY: OnceLock<Mutex<HashMap<ContextKey, Registration>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Drop registrations whose context is gone and forget their keys on the
/// owning elements
fn prune_dropped() {
    let dead: Vec<(ContextKey, Weak<UiElement>)> = {
        let mut table = lock(registry());
        let keys: Vec<ContextKey> = table
            .iter()
            .filter(|(_, r)| r.context.strong_count() == 0)
            .map(|(key, _)| *key)
            .collect();
        keys.into_iter()
            .filter_map(|key| table.remove(&key).map(|r| (key, r.element)))
            .collect()
    };
    if dead.is_empty() {
        return;
    }
    for (key, element) in &dead {
        if let Some(element) = element.upgrade() {
            lock(&element.contexts).retain(|k| k != key);
        }
    }
    debug!("Pruned {} registrations of dropped contexts", dead.len());
}

/// A visual element that can sit on a host surface and display a context
pub struct UiElement {
    name: String,
    host: Mutex<Weak<HostSurface>>,
    contexts: Mutex<Vec<ContextKey>>,
}

impl UiElement {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            host: Mutex::new(Weak::new()),
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Place the element on `host`
    pub fn attach(&self, host: &Arc<HostSurface>) {
        *lock(&self.host) = Arc::downgrade(host);
        debug!("Element '{}' attached to host '{}'", self.name, host.name());
    }

    /// Take the element off its host and drop its context registrations
    pub fn detach(&self) {
        *lock(&self.host) = Weak::new();
        let keys: Vec<ContextKey> = lock(&self.contexts).drain(..).collect();
        let mut table = lock(registry());
        for key in &keys {
            table.remove(key);
        }
        debug!("Element '{}' detached, {} contexts unregistered", self.name, keys.len());
    }

    /// The live host the element sits on
    pub fn host(&self) -> Option<Arc<HostSurface>> {
        lock(&self.host).upgrade()
    }

    /// Number of contexts currently registered with this element
    pub fn context_count(&self) -> usize {
        lock(&self.contexts).len()
    }
}

impl fmt::Debug for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiElement")
            .field("name", &self.name)
            .field("attached", &self.host().is_some())
            .finish()
    }
}

/// Register `context` as displayed by `element`, replacing any earlier
/// registration of the same context
pub fn register(context: &DialogContext, element: &Arc<UiElement>) {
    prune_dropped();
    let key = ContextKey::of(context);
    let previous = lock(registry()).insert(
        key,
        Registration {
            context: Arc::downgrade(context),
            element: Arc::downgrade(element),
        },
    );
    if let Some(owner) = previous.and_then(|p| p.element.upgrade()) {
        lock(&owner.contexts).retain(|k| *k != key);
    }
    lock(&element.contexts).push(key);
    debug!("Registered context with element '{}'", element.name);
}

/// Remove `context` from the table. Returns whether it was registered.
pub fn unregister(context: &DialogContext) -> bool {
    let key = ContextKey::of(context);
    let removed = lock(registry()).remove(&key);
    match removed {
        Some(registration) => {
            if let Some(element) = registration.element.upgrade() {
                lock(&element.contexts).retain(|k| *k != key);
            }
            true
        }
        None => false,
    }
}

pub fn is_registered(context: &DialogContext) -> bool {
    prune_dropped();
    let key = ContextKey::of(context);
    lock(registry())
        .get(&key)
        .is_some_and(|r| r.context.upgrade().is_some())
}

/// The element `context` is registered with, if it is still alive
pub fn resolve(context: &DialogContext) -> Option<Arc<UiElement>> {
    let key = ContextKey::of(context);
    lock(registry()).get(&key).and_then(|r| r.element.upgrade())
}

/// Resolves contexts to hosts and forwards to their [`DialogManager`]
#[derive(Debug, Default)]
pub struct DialogCoordinator {
    _private: (),
}

impl DialogCoordinator {
    /// The process-wide coordinator
    pub fn instance() -> &'static DialogCoordinator {
        static INSTANCE: DialogCoordinator = DialogCoordinator { _private: () };
        &INSTANCE
    }

    /// Host surface of the element `context` is registered with
    pub fn resolve_host(&self, context: &DialogContext) -> DialogResult<Arc<HostSurface>> {
        if !is_registered(context) {
            warn!("Dialog requested for an unregistered context");
            return Err(DialogError::UnregisteredContext);
        }
        let element = resolve(context).ok_or_else(|| DialogError::NoHostSurface("<dropped>".to_string()))?;
        element.host().ok_or_else(|| {
            warn!("Element '{}' is not attached to a host", element.name());
            DialogError::NoHostSurface(element.name().to_string())
        })
    }

    /// Run `f` on `host`'s thread; synchronous when already there
    pub async fn invoke_on_host_thread<T, F>(&self, host: &HostSurface, f: F) -> DialogResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        host.invoke(f).await
    }

    fn manager(&self, context: &DialogContext) -> DialogResult<DialogManager> {
        Ok(self.resolve_host(context)?.dialogs())
    }

    pub async fn show_message(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        style: MessageDialogStyle,
        settings: Option<DialogSettings>,
    ) -> DialogResult<MessageDialogResult> {
        self.manager(context)?.show_message(title, message, style, settings).await
    }

    pub async fn show_modal_message_external(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        style: MessageDialogStyle,
        settings: Option<DialogSettings>,
    ) -> DialogResult<MessageDialogResult> {
        self.manager(context)?
            .show_modal_message_external(title, message, style, settings)
            .await
    }

    pub async fn show_input(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        settings: Option<DialogSettings>,
    ) -> DialogResult<Option<String>> {
        self.manager(context)?.show_input(title, message, settings).await
    }

    pub async fn show_login(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        settings: Option<LoginDialogSettings>,
    ) -> DialogResult<Option<LoginDialogData>> {
        self.manager(context)?.show_login(title, message, settings).await
    }

    pub async fn show_selector(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        items: Vec<String>,
        settings: Option<DialogSettings>,
    ) -> DialogResult<Option<SelectedItem>> {
        self.manager(context)?.show_selector(title, message, items, settings).await
    }

    pub async fn show_progress(
        &self,
        context: &DialogContext,
        title: impl Into<String>,
        message: impl Into<String>,
        cancelable: bool,
        settings: Option<DialogSettings>,
    ) -> DialogResult<ProgressController> {
        self.manager(context)?
            .show_progress(title, message, cancelable, settings)
            .await
    }

    pub async fn show_custom(
        &self,
        context: &DialogContext,
        dialog: Arc<dyn Dialog>,
        settings: Option<&DialogSettings>,
    ) -> DialogResult<()> {
        self.manager(context)?.show_custom(dialog, settings).await
    }

    pub async fn hide(&self, context: &DialogContext, dialog: Arc<dyn Dialog>) -> DialogResult<()> {
        self.manager(context)?.hide(dialog).await
    }

    pub async fn current_dialog<T: Dialog>(&self, context: &DialogContext) -> DialogResult<Option<Arc<T>>> {
        self.manager(context)?.current_dialog::<T>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::custom::CustomDialog;
    use crate::tui::components::dialogs::host::Geometry;

    fn context() -> DialogContext {
        Arc::new(String::from("view model"))
    }

    #[test]
    fn test_unregistered_context_is_rejected() {
        let err = DialogCoordinator::instance().resolve_host(&context()).unwrap_err();
        assert_eq!(err, DialogError::UnregisteredContext);
    }

    #[test]
    fn test_detached_element_has_no_host() {
        let ctx = context();
        let element = UiElement::new("panel");
        register(&ctx, &element);
        assert!(is_registered(&ctx));

        let err = DialogCoordinator::instance().resolve_host(&ctx).unwrap_err();
        assert_eq!(err, DialogError::NoHostSurface("panel".to_string()));
        assert!(unregister(&ctx));
        assert!(!unregister(&ctx));
    }

    #[test]
    fn test_detach_clears_registrations() {
        let (a, b) = (context(), context());
        let element = UiElement::new("list");
        register(&a, &element);
        register(&b, &element);

        element.detach();
        assert!(!is_registered(&a));
        assert!(!is_registered(&b));
        assert!(resolve(&a).is_none());
    }

    #[test]
    fn test_dropped_contexts_are_pruned() {
        let element = UiElement::new("short-lived");
        for _ in 0..3 {
            let ctx = context();
            register(&ctx, &element);
            assert!(element.context_count() >= 1);
        }

        let kept = context();
        register(&kept, &element);
        assert_eq!(element.context_count(), 1);
        assert!(is_registered(&kept));

        drop(kept);
        assert!(!is_registered(&context()));
        assert_eq!(element.context_count(), 0);
    }

    #[tokio::test]
    async fn test_resolves_host_and_shows() {
        let host = HostSurface::new("coordinated", Geometry::new(80, 24)).unwrap();
        let element = UiElement::new("main");
        element.attach(&host);
        let ctx = context();
        register(&ctx, &element);

        let coordinator = DialogCoordinator::instance();
        assert_eq!(coordinator.resolve_host(&ctx).unwrap().id(), host.id());

        let dialog = Arc::new(CustomDialog::new("Hi", DialogSettings::default().animated(false)));
        coordinator.show_custom(&ctx, dialog.clone(), None).await.unwrap();
        let current = coordinator.current_dialog::<CustomDialog>(&ctx).await.unwrap();
        assert_eq!(current.map(|d| d.id()), Some(dialog.id()));

        coordinator.hide(&ctx, dialog).await.unwrap();
        let on_host = coordinator
            .invoke_on_host_thread(&host, {
                let host = host.clone();
                move || host.is_host_thread()
            })
            .await
            .unwrap();
        assert!(on_host);
        element.detach();
    }
}
