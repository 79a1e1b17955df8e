//! Dialog settings
//!
//! Settings are plain values: built once with the `with_*` methods and never
//! mutated after a dialog takes them. Flavors that need extra knobs wrap
//! [`DialogSettings`] in their own struct ([`LoginDialogSettings`]).

use super::cancellation::CancellationToken;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Color scheme a dialog is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Theme,
    Accented,
    Inverted,
}

/// Button that receives focus when a message dialog opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultButtonFocus {
    Affirmative,
    #[default]
    Negative,
    FirstAuxiliary,
    SecondAuxiliary,
}

/// Button layout of a message dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageDialogStyle {
    #[default]
    Affirmative,
    AffirmativeAndNegative,
    AffirmativeAndNegativeAndSingleAuxiliary,
    AffirmativeAndNegativeAndDoubleAuxiliary,
}

impl MessageDialogStyle {
    pub fn shows_negative(self) -> bool {
        self != MessageDialogStyle::Affirmative
    }

    pub fn shows_first_auxiliary(self) -> bool {
        matches!(
            self,
            MessageDialogStyle::AffirmativeAndNegativeAndSingleAuxiliary
                | MessageDialogStyle::AffirmativeAndNegativeAndDoubleAuxiliary
        )
    }

    pub fn shows_second_auxiliary(self) -> bool {
        self == MessageDialogStyle::AffirmativeAndNegativeAndDoubleAuxiliary
    }
}

/// Settings shared by every dialog flavor
#[derive(Clone)]
pub struct DialogSettings {
    pub affirmative_button_text: String,
    pub negative_button_text: String,
    pub first_auxiliary_button_text: String,
    pub second_auxiliary_button_text: String,
    pub color_scheme: ColorScheme,
    pub animate_show: bool,
    pub animate_hide: bool,
    /// Rows available to the dialog body; `None` leaves it unbounded
    pub maximum_body_height: Option<u16>,
    pub default_button_focus: DefaultButtonFocus,
    pub cancellation_token: CancellationToken,
    /// Initial text of input dialogs
    pub default_text: String,
    /// Opaque caller data, carried along untouched
    pub custom_resource: Option<Arc<dyn Any + Send + Sync>>,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            affirmative_button_text: "OK".to_string(),
            negative_button_text: "Cancel".to_string(),
            first_auxiliary_button_text: "Cancel".to_string(),
            second_auxiliary_button_text: "Cancel".to_string(),
            color_scheme: ColorScheme::Theme,
            animate_show: true,
            animate_hide: true,
            maximum_body_height: None,
            default_button_focus: DefaultButtonFocus::Negative,
            cancellation_token: CancellationToken::new(),
            default_text: String::new(),
            custom_resource: None,
        }
    }
}

impl DialogSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affirmative_text(mut self, text: impl Into<String>) -> Self {
        self.affirmative_button_text = text.into();
        self
    }

    pub fn with_negative_text(mut self, text: impl Into<String>) -> Self {
        self.negative_button_text = text.into();
        self
    }

    pub fn with_auxiliary_texts(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.first_auxiliary_button_text = first.into();
        self.second_auxiliary_button_text = second.into();
        self
    }

    pub fn with_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    /// Turn both show and hide animations on or off
    pub fn animated(mut self, animate: bool) -> Self {
        self.animate_show = animate;
        self.animate_hide = animate;
        self
    }

    pub fn with_animate_show(mut self, animate: bool) -> Self {
        self.animate_show = animate;
        self
    }

    pub fn with_animate_hide(mut self, animate: bool) -> Self {
        self.animate_hide = animate;
        self
    }

    pub fn with_maximum_body_height(mut self, rows: u16) -> Self {
        self.maximum_body_height = Some(rows);
        self
    }

    pub fn with_default_button_focus(mut self, focus: DefaultButtonFocus) -> Self {
        self.default_button_focus = focus;
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    pub fn with_custom_resource(mut self, resource: Arc<dyn Any + Send + Sync>) -> Self {
        self.custom_resource = Some(resource);
        self
    }
}

impl fmt::Debug for DialogSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSettings")
            .field("affirmative_button_text", &self.affirmative_button_text)
            .field("negative_button_text", &self.negative_button_text)
            .field("color_scheme", &self.color_scheme)
            .field("animate_show", &self.animate_show)
            .field("animate_hide", &self.animate_hide)
            .field("maximum_body_height", &self.maximum_body_height)
            .field("default_button_focus", &self.default_button_focus)
            .field("cancellation_token", &self.cancellation_token)
            .field("has_custom_resource", &self.custom_resource.is_some())
            .finish()
    }
}

/// Settings for login dialogs
#[derive(Debug, Clone)]
pub struct LoginDialogSettings {
    pub base: DialogSettings,
    pub username_watermark: String,
    pub password_watermark: String,
    pub initial_username: String,
    pub initial_password: String,
    pub negative_button_visible: bool,
    pub enable_password_preview: bool,
    pub remember_checkbox_visible: bool,
    pub remember_checkbox_text: String,
    pub remember_checkbox_checked: bool,
}

impl Default for LoginDialogSettings {
    fn default() -> Self {
        Self {
            base: DialogSettings::default().with_affirmative_text("Login"),
            username_watermark: "Username...".to_string(),
            password_watermark: "Password...".to_string(),
            initial_username: String::new(),
            initial_password: String::new(),
            negative_button_visible: false,
            enable_password_preview: false,
            remember_checkbox_visible: false,
            remember_checkbox_text: "Remember".to_string(),
            remember_checkbox_checked: false,
        }
    }
}

impl LoginDialogSettings {
    pub fn new(base: DialogSettings) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn with_initial_username(mut self, username: impl Into<String>) -> Self {
        self.initial_username = username.into();
        self
    }

    pub fn with_initial_password(mut self, password: impl Into<String>) -> Self {
        self.initial_password = password.into();
        self
    }

    pub fn with_negative_button(mut self, visible: bool) -> Self {
        self.negative_button_visible = visible;
        self
    }

    pub fn with_password_preview(mut self, enabled: bool) -> Self {
        self.enable_password_preview = enabled;
        self
    }

    pub fn with_remember_checkbox(mut self, text: impl Into<String>, checked: bool) -> Self {
        self.remember_checkbox_visible = true;
        self.remember_checkbox_text = text.into();
        self.remember_checkbox_checked = checked;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DialogSettings::default();
        assert_eq!(settings.affirmative_button_text, "OK");
        assert_eq!(settings.negative_button_text, "Cancel");
        assert_eq!(settings.color_scheme, ColorScheme::Theme);
        assert!(settings.animate_show && settings.animate_hide);
        assert_eq!(settings.maximum_body_height, None);
        assert_eq!(settings.default_button_focus, DefaultButtonFocus::Negative);
        assert!(!settings.cancellation_token.is_cancelled());
    }

    #[test]
    fn test_style_button_visibility() {
        assert!(!MessageDialogStyle::Affirmative.shows_negative());
        assert!(MessageDialogStyle::AffirmativeAndNegativeAndSingleAuxiliary.shows_first_auxiliary());
        assert!(!MessageDialogStyle::AffirmativeAndNegativeAndSingleAuxiliary.shows_second_auxiliary());
    }

    #[test]
    fn test_login_settings_default_to_login_button() {
        let settings = LoginDialogSettings::default();
        assert_eq!(settings.base.affirmative_button_text, "Login");
        assert!(!settings.negative_button_visible);
    }
}
