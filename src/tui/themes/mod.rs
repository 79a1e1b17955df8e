//! Theme resolution for dialogs
//!
//! Dialogs never compute colors. They ask the theme for a [`DialogPalette`]
//! matching their configured [`ColorScheme`] and draw with whatever comes back.

use crate::tui::components::dialogs::ColorScheme;
use ratatui::style::{Color, Modifier, Style};

/// Theme represents a complete visual style configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub is_dark: bool,

    // Brand colors
    pub accent: Color,
    pub accent_foreground: Color,

    // Background colors
    pub bg_base: Color,
    pub bg_overlay: Color,

    // Foreground colors
    pub fg_base: Color,
    pub fg_muted: Color,

    // Border colors
    pub border: Color,
    pub border_focus: Color,

    // Status colors
    pub warning: Color,
}

/// Resolved colors for one dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogPalette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub border: Color,
    pub highlight: Color,
}

impl DialogPalette {
    /// Style for the dialog body
    pub fn body(&self) -> Style {
        Style::default().bg(self.background).fg(self.foreground)
    }

    /// Style for a control that has input focus
    pub fn focused(&self) -> Style {
        Style::default()
            .bg(self.highlight)
            .fg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for secondary text such as watermarks
    pub fn muted(&self) -> Style {
        Style::default().bg(self.background).fg(self.muted)
    }
}

impl Theme {
    /// Default dark theme
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            is_dark: true,
            accent: Color::Rgb(0x41, 0xb1, 0xe1),
            accent_foreground: Color::Rgb(0xff, 0xff, 0xff),
            bg_base: Color::Rgb(0x25, 0x25, 0x25),
            bg_overlay: Color::Rgb(0x00, 0x00, 0x00),
            fg_base: Color::Rgb(0xe6, 0xe6, 0xe6),
            fg_muted: Color::Rgb(0x8a, 0x8a, 0x8a),
            border: Color::Rgb(0x44, 0x44, 0x44),
            border_focus: Color::Rgb(0x41, 0xb1, 0xe1),
            warning: Color::Rgb(0xf0, 0xa3, 0x0a),
        }
    }

    /// Default light theme
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            is_dark: false,
            accent: Color::Rgb(0x11, 0x9e, 0xda),
            accent_foreground: Color::Rgb(0xff, 0xff, 0xff),
            bg_base: Color::Rgb(0xff, 0xff, 0xff),
            bg_overlay: Color::Rgb(0x25, 0x25, 0x25),
            fg_base: Color::Rgb(0x00, 0x00, 0x00),
            fg_muted: Color::Rgb(0x71, 0x71, 0x71),
            border: Color::Rgb(0xcc, 0xcc, 0xcc),
            border_focus: Color::Rgb(0x11, 0x9e, 0xda),
            warning: Color::Rgb(0xf0, 0xa3, 0x0a),
        }
    }

    /// Resolve the palette a dialog with `scheme` draws with
    pub fn palette(&self, scheme: ColorScheme) -> DialogPalette {
        match scheme {
            ColorScheme::Theme => DialogPalette {
                background: self.bg_base,
                foreground: self.fg_base,
                muted: self.fg_muted,
                border: self.border,
                highlight: self.border_focus,
            },
            ColorScheme::Accented => DialogPalette {
                background: self.accent,
                foreground: self.accent_foreground,
                muted: self.accent_foreground,
                border: self.accent,
                highlight: self.accent_foreground,
            },
            ColorScheme::Inverted => DialogPalette {
                background: self.fg_base,
                foreground: self.bg_base,
                muted: self.fg_muted,
                border: self.fg_base,
                highlight: self.accent,
            },
        }
    }

    /// Style of the dimming overlay at the given opacity
    pub fn overlay(&self, opacity: f32) -> Style {
        let style = Style::default().bg(self.bg_overlay).fg(self.fg_muted);
        if opacity >= 0.5 {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_swaps_background_and_foreground() {
        let theme = Theme::dark();
        let normal = theme.palette(ColorScheme::Theme);
        let inverted = theme.palette(ColorScheme::Inverted);
        assert_eq!(normal.background, inverted.foreground);
        assert_eq!(normal.foreground, inverted.background);
    }

    #[test]
    fn test_accented_uses_accent_background() {
        let theme = Theme::light();
        assert_eq!(theme.palette(ColorScheme::Accented).background, theme.accent);
    }
}
