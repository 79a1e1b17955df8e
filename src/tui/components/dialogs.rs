//! Modal overlay dialogs
//!
//! Dialogs are shown on a [`HostSurface`]: at most one is active, others wait
//! in a LIFO stack underneath, and a dimming overlay covers the host while
//! any dialog is up. The [`DialogManager`] sequences showing and hiding,
//! each dialog flavor races its dismissal sources to a single answer, and
//! the [`DialogCoordinator`] maps opaque caller contexts to hosts.

pub mod base;
pub mod cancellation;
pub mod controls;
pub mod coordinator;
pub mod custom;
pub mod dispatcher;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod login;
pub mod manager;
pub mod message;
pub mod progress;
pub mod race;
pub mod render;
pub mod selector;
pub mod settings;
pub mod types;

pub use base::{Dialog, DialogBase, SizeBounds};
pub use cancellation::CancellationToken;
pub use controls::{Button, CheckBox, Focusable, ListBox, TextField};
pub use coordinator::{DialogContext, DialogCoordinator, UiElement};
pub use custom::CustomDialog;
pub use host::{Geometry, HostSnapshot, HostSurface, HostSurfaceBuilder, OverlayState};
pub use input::InputDialog;
pub use lifecycle::{on_dialog_closed, on_dialog_lifecycle, on_dialog_opened, DialogLifecycle, DialogLifecycleEvent};
pub use login::LoginDialog;
pub use manager::DialogManager;
pub use message::MessageDialog;
pub use progress::{ProgressController, ProgressDialog, ProgressState};
pub use render::{draw_surface, DialogView, SurfaceView};
pub use selector::SelectorDialog;
pub use settings::{ColorScheme, DefaultButtonFocus, DialogSettings, LoginDialogSettings, MessageDialogStyle};
pub use types::*;
