//! Modal overlay dialogs for terminal UIs
//!
//! A host surface shows one active dialog at a time, keeps earlier dialogs
//! suspended in a stack underneath and dims itself with an overlay while any
//! dialog is up. Each dialog flavor resolves to a single answer from
//! whichever of its buttons, keys or cancellation token fires first.
//!
//! ```no_run
//! use overlay_dialogs::{HostSurface, Geometry, MessageDialogStyle};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let host = HostSurface::new("main", Geometry::new(80, 24))?;
//! let answer = host
//!     .dialogs()
//!     .show_message("Quit?", "Unsaved work will be lost.", MessageDialogStyle::AffirmativeAndNegative, None)
//!     .await?;
//! println!("{:?}", answer);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod tui;

pub use config::Config;
pub use tui::components::animations::{Animator, StoryboardAnimator};
pub use tui::components::dialogs::{
    CancellationToken, ColorScheme, CustomDialog, Dialog, DialogCoordinator, DialogError, DialogManager,
    DialogResult, DialogSettings, Geometry, HostSurface, InputDialog, LoginDialog, LoginDialogData,
    LoginDialogSettings, MessageDialog, MessageDialogResult, MessageDialogStyle, ProgressController,
    SelectorDialog, UiElement,
};
