use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::tui::components::animations::{
    AnimationConfig, EasingType, StoryboardAnimator, DIALOG_CLOSE, OVERLAY_FADE_IN, OVERLAY_FADE_OUT,
};
use crate::tui::components::dialogs::host::DEFAULT_OVERLAY_OPACITY;
use crate::tui::components::dialogs::{ColorScheme, DialogSettings, HostSurfaceBuilder};

const ENV_PREFIX: &str = "OVERLAY_DIALOGS_";

/// Dialog and animation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay fade-in duration in milliseconds
    pub overlay_fade_in_ms: u64,

    /// Overlay fade-out duration in milliseconds
    pub overlay_fade_out_ms: u64,

    /// Dialog closing transition duration in milliseconds
    pub dialog_close_ms: u64,

    /// Animation frame rate
    pub fps: u8,

    /// Easing applied to every storyboard; unset keeps each one's own curve
    pub easing: Option<EasingType>,

    /// Opacity the overlay settles at when visible
    pub overlay_opacity: f32,

    /// Whether dialogs animate when shown and hidden
    pub animate: bool,

    /// Color scheme dialogs are drawn with
    pub color_scheme: ColorScheme,

    /// Rows available to a dialog body
    pub maximum_body_height: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay_fade_in_ms: 200,
            overlay_fade_out_ms: 200,
            dialog_close_ms: 150,
            fps: 60,
            easing: None,
            overlay_opacity: DEFAULT_OVERLAY_OPACITY,
            animate: true,
            color_scheme: ColorScheme::Theme,
            maximum_body_height: None,
        }
    }
}

impl Config {
    /// Initialize configuration from files and the environment
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = match Self::load_from_file().await? {
            Some(config) => config,
            None => Self::default(),
        };
        config.load_from_env();

        Ok(config)
    }

    /// Candidate configuration files, most specific first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("./.overlay-dialogs.json"),
            PathBuf::from("./overlay-dialogs.json"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("overlay-dialogs").join("config.json"));
        }
        paths
    }

    /// Load the first configuration file that exists
    pub async fn load_from_file() -> Result<Option<Self>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }
        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Load configuration from a JSON file; missing keys take their defaults
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Apply `OVERLAY_DIALOGS_*` environment variables
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by full variable name.
    /// Values that fail to parse are skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("FADE_IN_MS") {
            parse_into(&mut self.overlay_fade_in_ms, "FADE_IN_MS", &value);
        }
        if let Some(value) = var("FADE_OUT_MS") {
            parse_into(&mut self.overlay_fade_out_ms, "FADE_OUT_MS", &value);
        }
        if let Some(value) = var("CLOSE_MS") {
            parse_into(&mut self.dialog_close_ms, "CLOSE_MS", &value);
        }
        if let Some(value) = var("FPS") {
            parse_into(&mut self.fps, "FPS", &value);
        }
        if let Some(value) = var("OVERLAY_OPACITY") {
            parse_into(&mut self.overlay_opacity, "OVERLAY_OPACITY", &value);
        }
        if let Some(value) = var("ANIMATE") {
            self.animate = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(value) = var("EASING") {
            match from_name::<EasingType>(&value) {
                Some(easing) => self.easing = Some(easing),
                None => warn!("Ignoring unknown easing '{}'", value),
            }
        }
        if let Some(value) = var("COLOR_SCHEME") {
            match from_name::<ColorScheme>(&value) {
                Some(scheme) => self.color_scheme = scheme,
                None => warn!("Ignoring unknown color scheme '{}'", value),
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.overlay_fade_in_ms == 0 || self.overlay_fade_out_ms == 0 || self.dialog_close_ms == 0 {
            return Err(anyhow::anyhow!("animation durations must be greater than 0"));
        }

        if self.fps == 0 {
            return Err(anyhow::anyhow!("fps must be greater than 0"));
        }

        if !(self.overlay_opacity > 0.0 && self.overlay_opacity <= 1.0) {
            return Err(anyhow::anyhow!("overlay_opacity must be in (0.0, 1.0]"));
        }

        if self.maximum_body_height == Some(0) {
            return Err(anyhow::anyhow!("maximum_body_height must be greater than 0"));
        }

        Ok(())
    }

    fn storyboard(&self, millis: u64, easing: EasingType) -> AnimationConfig {
        AnimationConfig::new(Duration::from_millis(millis))
            .with_easing(self.easing.unwrap_or(easing))
            .with_fps(self.fps)
    }

    /// Animator with the overlay and closing storyboards registered
    pub fn animator(&self) -> StoryboardAnimator {
        StoryboardAnimator::empty()
            .with_storyboard(OVERLAY_FADE_IN, self.storyboard(self.overlay_fade_in_ms, EasingType::EaseOut))
            .with_storyboard(OVERLAY_FADE_OUT, self.storyboard(self.overlay_fade_out_ms, EasingType::EaseIn))
            .with_storyboard(DIALOG_CLOSE, self.storyboard(self.dialog_close_ms, EasingType::EaseInCubic))
    }

    /// Settings dialogs start from when the caller passes none
    pub fn default_settings(&self) -> DialogSettings {
        let settings = DialogSettings::new()
            .animated(self.animate)
            .with_color_scheme(self.color_scheme);
        match self.maximum_body_height {
            Some(rows) => settings.with_maximum_body_height(rows),
            None => settings,
        }
    }

    /// Host builder carrying this configuration
    pub fn host_builder(&self, name: impl Into<String>) -> HostSurfaceBuilder {
        HostSurfaceBuilder::new(name)
            .animator(Arc::new(self.animator()))
            .overlay_opacity(self.overlay_opacity)
            .default_settings(self.default_settings())
    }
}

fn parse_into<T: std::str::FromStr>(target: &mut T, name: &str, value: &str) {
    match value.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!("Ignoring invalid {}{}='{}'", ENV_PREFIX, name, value),
    }
}

fn from_name<T: serde::de::DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::animations::Animator;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.animate);
        assert_eq!(config.overlay_opacity, DEFAULT_OVERLAY_OPACITY);
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fps": 30, "color_scheme": "inverted", "animate": false }}"#).unwrap();

        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.color_scheme, ColorScheme::Inverted);
        assert!(!config.animate);
        assert_eq!(config.overlay_fade_in_ms, 200);
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(Config::load_from_path(file.path()).await.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OVERLAY_DIALOGS_FPS", "24"),
            ("OVERLAY_DIALOGS_ANIMATE", "false"),
            ("OVERLAY_DIALOGS_EASING", "linear"),
            ("OVERLAY_DIALOGS_COLOR_SCHEME", "Accented"),
            ("OVERLAY_DIALOGS_CLOSE_MS", "not a number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.fps, 24);
        assert!(!config.animate);
        assert_eq!(config.easing, Some(EasingType::Linear));
        assert_eq!(config.color_scheme, ColorScheme::Accented);
        assert_eq!(config.dialog_close_ms, 150);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_fps = Config {
            fps: 0,
            ..Config::default()
        };
        assert!(zero_fps.validate().is_err());

        let zero_duration = Config {
            dialog_close_ms: 0,
            ..Config::default()
        };
        assert!(zero_duration.validate().is_err());

        let opaque = Config {
            overlay_opacity: 1.0,
            ..Config::default()
        };
        assert!(opaque.validate().is_ok());

        let transparent = Config {
            overlay_opacity: 0.0,
            ..Config::default()
        };
        assert!(transparent.validate().is_err());
    }

    #[test]
    fn test_animator_registers_storyboards() {
        let config = Config {
            dialog_close_ms: 80,
            easing: Some(EasingType::Linear),
            ..Config::default()
        };
        let animator = config.animator();
        assert!(animator.has_resource(OVERLAY_FADE_IN));
        assert!(animator.has_resource(OVERLAY_FADE_OUT));

        let close = animator.storyboard(DIALOG_CLOSE).unwrap();
        assert_eq!(close.duration, Duration::from_millis(80));
        assert_eq!(close.easing, EasingType::Linear);
    }

    #[test]
    fn test_default_settings_follow_config() {
        let config = Config {
            animate: false,
            color_scheme: ColorScheme::Accented,
            maximum_body_height: Some(6),
            ..Config::default()
        };
        let settings = config.default_settings();
        assert!(!settings.animate_show);
        assert!(!settings.animate_hide);
        assert_eq!(settings.color_scheme, ColorScheme::Accented);
        assert_eq!(settings.maximum_body_height, Some(6));
    }
}
