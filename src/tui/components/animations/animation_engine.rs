//! Tween timing for storyboards.
//!
//! An [`AnimationConfig`] says how long a storyboard runs, which curve it
//! follows and at what frame rate. A [`Tween`] samples the value between two
//! endpoints for a given elapsed time.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_FPS: u8 = 60;

/// Curve a tween follows from start to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInCubic,
}

impl EasingType {
    /// Map linear progress in `0.0..=1.0` onto the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInCubic => t.powi(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub duration: Duration,
    pub easing: EasingType,
    pub fps: u8,
}

impl AnimationConfig {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            easing: EasingType::Linear,
            fps: DEFAULT_FPS,
        }
    }

    pub fn with_easing(mut self, easing: EasingType) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_fps(mut self, fps: u8) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / u32::from(self.fps.max(1))
    }

    /// Overlay fade in
    pub fn fade_in() -> Self {
        Self::new(Duration::from_millis(200)).with_easing(EasingType::EaseOut)
    }

    /// Overlay fade out
    pub fn fade_out() -> Self {
        Self::new(Duration::from_millis(200)).with_easing(EasingType::EaseIn)
    }

    /// Dialog close transition
    pub fn dialog_close() -> Self {
        Self::new(Duration::from_millis(150)).with_easing(EasingType::EaseInCubic)
    }
}

/// One run of a storyboard between two values
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    easing: EasingType,
}

impl Tween {
    pub fn new(config: &AnimationConfig, from: f32, to: f32) -> Self {
        Self {
            from,
            to,
            duration: config.duration,
            easing: config.easing,
        }
    }

    /// Value after `elapsed`, or `None` once the tween has run its course
    pub fn sample(&self, elapsed: Duration) -> Option<f32> {
        if elapsed >= self.duration {
            return None;
        }
        let t = self.easing.apply(elapsed.as_secs_f32() / self.duration.as_secs_f32());
        Some(self.from + (self.to - self.from) * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_keeps_endpoints() {
        for easing in [EasingType::Linear, EasingType::EaseIn, EasingType::EaseOut, EasingType::EaseInCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
        assert!(EasingType::EaseIn.apply(0.5) < 0.5);
        assert!(EasingType::EaseOut.apply(0.5) > 0.5);
    }

    #[test]
    fn test_tween_samples_between_endpoints() {
        let config = AnimationConfig::new(Duration::from_millis(100));
        let tween = Tween::new(&config, 1.0, 0.0);

        assert_eq!(tween.sample(Duration::ZERO), Some(1.0));
        assert_eq!(tween.sample(Duration::from_millis(50)), Some(0.5));
        assert_eq!(tween.sample(Duration::from_millis(100)), None);
    }

    #[test]
    fn test_zero_duration_ends_at_once() {
        let tween = Tween::new(&AnimationConfig::new(Duration::ZERO), 0.0, 0.7);
        assert_eq!(tween.sample(Duration::ZERO), None);
    }

    #[test]
    fn test_fps_floor() {
        let config = AnimationConfig::new(Duration::from_millis(10)).with_fps(0);
        assert_eq!(config.fps, 1);
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }
}
