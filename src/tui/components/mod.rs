//! UI components
//!
//! - [`animations`]: easing, storyboards and the animator hosts drive
//! - [`dialogs`]: overlay dialogs and their host coordinator

pub mod animations;
pub mod dialogs;
