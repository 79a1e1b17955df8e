//! Animation support for dialogs and overlays
//!
//! - [`animation_engine`]: easing curves and tween sampling
//! - [`storyboard`]: named storyboards and the [`Animator`] seam hosts use

pub mod animation_engine;
pub mod storyboard;

pub use animation_engine::{AnimationConfig, EasingType, Tween};
pub use storyboard::{
    AnimationCompletion, Animator, CompletionTrigger, FrameSink, StoryboardAnimator, DIALOG_CLOSE,
    OVERLAY_FADE_IN, OVERLAY_FADE_OUT,
};
