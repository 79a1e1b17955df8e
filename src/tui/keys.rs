use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub description: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, description: &str) -> Self {
        Self {
            key,
            modifiers,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }
}

/// Keys understood by every dialog
#[derive(Debug, Clone)]
pub struct DialogKeyMap {
    /// Confirm the focused control
    pub accept: KeyBinding,

    /// Dismiss the dialog
    pub dismiss: KeyBinding,

    /// Window-close chord, treated like dismiss
    pub close_window: KeyBinding,

    /// Move focus to the next control
    pub focus_next: KeyBinding,
}

impl Default for DialogKeyMap {
    fn default() -> Self {
        Self {
            accept: KeyBinding::new(KeyCode::Enter, KeyModifiers::NONE, "Confirm"),
            dismiss: KeyBinding::new(KeyCode::Esc, KeyModifiers::NONE, "Dismiss dialog"),
            close_window: KeyBinding::new(KeyCode::F(4), KeyModifiers::ALT, "Close dialog"),
            focus_next: KeyBinding::new(KeyCode::Tab, KeyModifiers::NONE, "Next control"),
        }
    }
}

impl DialogKeyMap {
    /// Check if the event confirms the focused control
    pub fn is_accept(&self, event: &KeyEvent) -> bool {
        self.accept.matches(event)
    }

    /// Check if the event dismisses the dialog
    pub fn is_dismiss(&self, event: &KeyEvent) -> bool {
        self.dismiss.matches(event) || self.close_window.matches(event)
    }

    /// Check if the event moves focus forward
    pub fn is_focus_next(&self, event: &KeyEvent) -> bool {
        self.focus_next.matches(event)
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        format!(
            "Enter: {}  Esc: {}  Tab: {}",
            self.accept.description, self.dismiss.description, self.focus_next.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismiss_matches_escape_and_alt_f4() {
        let keys = DialogKeyMap::default();
        assert!(keys.is_dismiss(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(keys.is_dismiss(&KeyEvent::new(KeyCode::F(4), KeyModifiers::ALT)));
        assert!(!keys.is_dismiss(&KeyEvent::new(KeyCode::F(4), KeyModifiers::NONE)));
    }

    #[test]
    fn test_accept_requires_plain_enter() {
        let keys = DialogKeyMap::default();
        assert!(keys.is_accept(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!keys.is_accept(&KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)));
    }
}
