//! Core dialog types
//!
//! Identifiers, lifecycle states, response values and the error taxonomy
//! shared by every dialog flavor and the host coordinator.

use std::fmt;
use uuid::Uuid;

/// Unique identifier for dialog instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(Uuid);

impl DialogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DialogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for host surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(Uuid);

impl HostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which container of a host a dialog sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The single interactive slot
    Active,
    /// The suspended stack
    Inactive,
}

/// Dialog lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Created, not yet handed to a host
    #[default]
    Created,
    /// Waiting for the host overlay to fade in
    OverlayShowing,
    /// Placed into one of the host containers
    Mounted(Slot),
    /// Mounted and racing for a user response
    AwaitingResponse(Slot),
    /// Running the close sequence
    Closing,
    /// Removed from the host
    Removed,
}

impl DialogState {
    /// Same phase, different container
    pub fn with_slot(self, slot: Slot) -> Self {
        match self {
            DialogState::AwaitingResponse(_) => DialogState::AwaitingResponse(slot),
            _ => DialogState::Mounted(slot),
        }
    }

    /// Container the dialog currently sits in, if any
    pub fn slot(self) -> Option<Slot> {
        match self {
            DialogState::Mounted(slot) | DialogState::AwaitingResponse(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Outcome of a message dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDialogResult {
    Negative,
    Affirmative,
    FirstAuxiliary,
    SecondAuxiliary,
}

/// Credentials captured by a login dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDialogData {
    pub username: String,
    pub password: String,
    pub should_remember: bool,
}

/// Entry picked in a selector dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub index: usize,
    pub label: String,
}

/// Result type for dialog operations
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Dialog-specific error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DialogError {
    #[error("Dialog '{0}' is already shown on a host")]
    AlreadyShown(DialogId),

    #[error("Dialog '{0}' is not shown on this host")]
    NotShown(DialogId),

    #[error("Dialog '{0}' is already closing")]
    AlreadyClosing(DialogId),

    #[error("Context is not registered for dialogs")]
    UnregisteredContext,

    #[error("No host surface found for element '{0}'")]
    NoHostSurface(String),

    #[error("Value {value} is outside the range [{minimum}, {maximum}]")]
    ValueOutOfRange { value: f64, minimum: f64, maximum: f64 },

    #[error("Animation resource '{0}' is not defined")]
    MissingAnimationResource(String),

    #[error("Dialog '{0}' has no closing animation")]
    MissingClosingAnimation(DialogId),

    #[error("Host dispatcher for '{0}' has shut down")]
    HostUnavailable(String),

    #[error("Dialog '{0}' was dropped before it produced a response")]
    ResponseAbandoned(DialogId),
}

impl DialogError {
    /// Programmer mistakes, as opposed to resource or host failures
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DialogError::AlreadyShown(_)
                | DialogError::NotShown(_)
                | DialogError::AlreadyClosing(_)
                | DialogError::UnregisteredContext
                | DialogError::NoHostSurface(_)
                | DialogError::ValueOutOfRange { .. }
        )
    }
}
