//! Named animation resources
//!
//! Hosts and dialogs never drive animations themselves. They ask an
//! [`Animator`] to begin a named storyboard, hand it a sink that applies each
//! frame's value, and await the returned [`AnimationCompletion`]. Asking for
//! a storyboard that was never registered fails with
//! [`DialogError::MissingAnimationResource`].

use super::animation_engine::{AnimationConfig, Tween};
use crate::tui::components::dialogs::{DialogError, DialogResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::debug;

/// Overlay fade from transparent to semi-opaque
pub const OVERLAY_FADE_IN: &str = "OverlayFastSemiFadeIn";
/// Overlay fade back to transparent
pub const OVERLAY_FADE_OUT: &str = "OverlayFastSemiFadeOut";
/// Default dialog closing transition
pub const DIALOG_CLOSE: &str = "DialogCloseStoryboard";

/// Receives each animated value
pub type FrameSink = Arc<dyn Fn(f32) + Send + Sync>;

/// Fires once when an animation has finished
#[derive(Debug)]
pub struct AnimationCompletion {
    receiver: Option<oneshot::Receiver<()>>,
}

impl AnimationCompletion {
    /// A completion that has already fired
    pub fn ready() -> Self {
        Self { receiver: None }
    }

    /// Create a completion together with the trigger that fires it
    pub fn pending() -> (CompletionTrigger, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            CompletionTrigger { sender },
            Self {
                receiver: Some(receiver),
            },
        )
    }

    /// Wait for the animation to finish. An animation torn down before it
    /// finished counts as finished.
    pub async fn wait(self) {
        if let Some(receiver) = self.receiver {
            if receiver.await.is_err() {
                debug!("Animation dropped before completing");
            }
        }
    }
}

/// Sending half of an [`AnimationCompletion`]
#[derive(Debug)]
pub struct CompletionTrigger {
    sender: oneshot::Sender<()>,
}

impl CompletionTrigger {
    pub fn fire(self) {
        let _ = self.sender.send(());
    }
}

/// External animation engine
pub trait Animator: Send + Sync {
    /// Whether a storyboard with this name is registered
    fn has_resource(&self, resource: &str) -> bool;

    /// Start animating from `from` to `to`, pushing every frame into `sink`.
    /// Must be called from within a tokio runtime.
    fn begin(&self, resource: &str, from: f32, to: f32, sink: FrameSink) -> DialogResult<AnimationCompletion>;
}

/// Timer-driven animator backed by a table of named storyboards
#[derive(Clone)]
pub struct StoryboardAnimator {
    storyboards: HashMap<String, AnimationConfig>,
}

impl StoryboardAnimator {
    /// An animator with no storyboards registered
    pub fn empty() -> Self {
        Self {
            storyboards: HashMap::new(),
        }
    }

    /// Register or replace a storyboard
    pub fn with_storyboard(mut self, name: impl Into<String>, config: AnimationConfig) -> Self {
        self.storyboards.insert(name.into(), config);
        self
    }

    /// Remove a storyboard
    pub fn without_storyboard(mut self, name: &str) -> Self {
        self.storyboards.remove(name);
        self
    }

    pub fn storyboard(&self, name: &str) -> Option<&AnimationConfig> {
        self.storyboards.get(name)
    }
}

impl Default for StoryboardAnimator {
    fn default() -> Self {
        Self::empty()
            .with_storyboard(OVERLAY_FADE_IN, AnimationConfig::fade_in())
            .with_storyboard(OVERLAY_FADE_OUT, AnimationConfig::fade_out())
            .with_storyboard(DIALOG_CLOSE, AnimationConfig::dialog_close())
    }
}

impl fmt::Debug for StoryboardAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.storyboards.keys().collect();
        names.sort();
        f.debug_struct("StoryboardAnimator")
            .field("storyboards", &names)
            .finish()
    }
}

impl Animator for StoryboardAnimator {
    fn has_resource(&self, resource: &str) -> bool {
        self.storyboards.contains_key(resource)
    }

    fn begin(&self, resource: &str, from: f32, to: f32, sink: FrameSink) -> DialogResult<AnimationCompletion> {
        let config = self
            .storyboards
            .get(resource)
            .cloned()
            .ok_or_else(|| DialogError::MissingAnimationResource(resource.to_string()))?;

        debug!("Beginning storyboard '{}' ({:?})", resource, config.duration);
        let (trigger, completion) = AnimationCompletion::pending();
        let name = resource.to_string();

        tokio::spawn(async move {
            let tween = Tween::new(&config, from, to);
            let mut frames = tokio::time::interval(config.frame_interval());
            let started = Instant::now();
            sink(from);
            loop {
                frames.tick().await;
                match tween.sample(started.elapsed()) {
                    Some(value) => sink(value),
                    None => break,
                }
            }
            sink(to);
            debug!("Storyboard '{}' completed", name);
            trigger.fire();
        });

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_storyboard_ends_on_target_value() {
        let animator = StoryboardAnimator::empty()
            .with_storyboard("fade", AnimationConfig::new(Duration::from_millis(20)).with_fps(120));
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink_frames = frames.clone();

        let completion = animator
            .begin("fade", 0.0, 0.7, Arc::new(move |v| sink_frames.lock().unwrap().push(v)))
            .unwrap();
        completion.wait().await;

        let frames = frames.lock().unwrap();
        assert_eq!(frames.first().copied(), Some(0.0));
        assert_eq!(frames.last().copied(), Some(0.7));
    }

    #[test]
    fn test_missing_storyboard_is_an_error() {
        let animator = StoryboardAnimator::default().without_storyboard(DIALOG_CLOSE);
        assert!(!animator.has_resource(DIALOG_CLOSE));
        let err = animator.begin(DIALOG_CLOSE, 1.0, 0.0, Arc::new(|_| {})).unwrap_err();
        assert_eq!(err, DialogError::MissingAnimationResource(DIALOG_CLOSE.to_string()));
    }

    #[tokio::test]
    async fn test_ready_completion_resolves_immediately() {
        AnimationCompletion::ready().wait().await;
    }
}
