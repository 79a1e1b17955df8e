//! Minimal control models used inside dialogs
//!
//! These hold just enough state for the response race and for drawing:
//! labels, visibility, focus, text. Each control is a cheap cloneable handle
//! so listener closures can capture it directly.

use crate::tui::events::{lock, EventSource, Subscription};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::{Arc, Mutex};

/// A control that can take keyboard focus
pub trait Focusable: Send + Sync {
    fn has_focus(&self) -> bool;

    fn set_focus(&self, focused: bool);

    /// Visible and enabled controls can take focus
    fn is_focusable(&self) -> bool;

    /// Deliver a key press to the control
    fn press_key(&self, key: &KeyEvent);
}

fn is_plain(key: &KeyEvent) -> bool {
    key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT
}

#[derive(Debug, Clone)]
struct ButtonState {
    label: String,
    visible: bool,
    enabled: bool,
    focused: bool,
}

struct ButtonInner {
    state: Mutex<ButtonState>,
    click: EventSource<()>,
    key_down: EventSource<KeyEvent>,
}

/// Push button
#[derive(Clone)]
pub struct Button {
    inner: Arc<ButtonInner>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ButtonInner {
                state: Mutex::new(ButtonState {
                    label: label.into(),
                    visible: true,
                    enabled: true,
                    focused: false,
                }),
                click: EventSource::new(),
                key_down: EventSource::new(),
            }),
        }
    }

    pub fn label(&self) -> String {
        lock(&self.inner.state).label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        lock(&self.inner.state).label = label.into();
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.inner.state).visible
    }

    pub fn set_visible(&self, visible: bool) {
        let mut state = lock(&self.inner.state);
        state.visible = visible;
        if !visible {
            state.focused = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.inner.state).enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut state = lock(&self.inner.state);
        state.enabled = enabled;
        if !enabled {
            state.focused = false;
        }
    }

    /// Simulate a click. Hidden or disabled buttons ignore it.
    pub fn click(&self) -> bool {
        if !self.is_focusable() {
            return false;
        }
        self.inner.click.emit(&());
        true
    }

    pub fn on_click<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.click.subscribe(move |_| handler())
    }

    pub fn on_key_down<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        self.inner.key_down.subscribe(handler)
    }

    pub fn click_listener_count(&self) -> usize {
        self.inner.click.listener_count()
    }

    pub fn key_listener_count(&self) -> usize {
        self.inner.key_down.listener_count()
    }
}

impl Focusable for Button {
    fn has_focus(&self) -> bool {
        lock(&self.inner.state).focused
    }

    fn set_focus(&self, focused: bool) {
        lock(&self.inner.state).focused = focused;
    }

    fn is_focusable(&self) -> bool {
        let state = lock(&self.inner.state);
        state.visible && state.enabled
    }

    fn press_key(&self, key: &KeyEvent) {
        self.inner.key_down.emit(key);
    }
}

#[derive(Debug, Clone)]
struct TextFieldState {
    text: String,
    watermark: String,
    masked: bool,
    revealed: bool,
    focused: bool,
}

struct TextFieldInner {
    state: Mutex<TextFieldState>,
    key_down: EventSource<KeyEvent>,
}

/// Single-line text entry, optionally masked for passwords
#[derive(Clone)]
pub struct TextField {
    inner: Arc<TextFieldInner>,
}

impl TextField {
    pub fn new(text: impl Into<String>) -> Self {
        Self::build(text.into(), false)
    }

    pub fn password(text: impl Into<String>) -> Self {
        Self::build(text.into(), true)
    }

    fn build(text: String, masked: bool) -> Self {
        Self {
            inner: Arc::new(TextFieldInner {
                state: Mutex::new(TextFieldState {
                    text,
                    watermark: String::new(),
                    masked,
                    revealed: false,
                    focused: false,
                }),
                key_down: EventSource::new(),
            }),
        }
    }

    pub fn with_watermark(self, watermark: impl Into<String>) -> Self {
        lock(&self.inner.state).watermark = watermark.into();
        self
    }

    pub fn text(&self) -> String {
        lock(&self.inner.state).text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        lock(&self.inner.state).text = text.into();
    }

    pub fn watermark(&self) -> String {
        lock(&self.inner.state).watermark.clone()
    }

    pub fn is_masked(&self) -> bool {
        let state = lock(&self.inner.state);
        state.masked && !state.revealed
    }

    /// Show or hide a masked field's content
    pub fn set_revealed(&self, revealed: bool) {
        lock(&self.inner.state).revealed = revealed;
    }

    /// Text as it should be drawn
    pub fn display_text(&self) -> String {
        let state = lock(&self.inner.state);
        if state.masked && !state.revealed {
            "*".repeat(state.text.chars().count())
        } else {
            state.text.clone()
        }
    }

    pub fn on_key_down<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        self.inner.key_down.subscribe(handler)
    }
}

impl Focusable for TextField {
    fn has_focus(&self) -> bool {
        lock(&self.inner.state).focused
    }

    fn set_focus(&self, focused: bool) {
        lock(&self.inner.state).focused = focused;
    }

    fn is_focusable(&self) -> bool {
        true
    }

    fn press_key(&self, key: &KeyEvent) {
        {
            let mut state = lock(&self.inner.state);
            match key.code {
                KeyCode::Char(c) if is_plain(key) => state.text.push(c),
                KeyCode::Backspace => {
                    state.text.pop();
                }
                _ => {}
            }
        }
        self.inner.key_down.emit(key);
    }
}

#[derive(Debug, Clone)]
struct CheckBoxState {
    label: String,
    checked: bool,
    visible: bool,
    focused: bool,
}

/// Two-state toggle
#[derive(Clone)]
pub struct CheckBox {
    state: Arc<Mutex<CheckBoxState>>,
}

impl CheckBox {
    pub fn new(label: impl Into<String>, checked: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(CheckBoxState {
                label: label.into(),
                checked,
                visible: true,
                focused: false,
            })),
        }
    }

    pub fn label(&self) -> String {
        lock(&self.state).label.clone()
    }

    pub fn is_checked(&self) -> bool {
        lock(&self.state).checked
    }

    pub fn set_checked(&self, checked: bool) {
        lock(&self.state).checked = checked;
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    pub fn set_visible(&self, visible: bool) {
        lock(&self.state).visible = visible;
    }
}

impl Focusable for CheckBox {
    fn has_focus(&self) -> bool {
        lock(&self.state).focused
    }

    fn set_focus(&self, focused: bool) {
        lock(&self.state).focused = focused;
    }

    fn is_focusable(&self) -> bool {
        lock(&self.state).visible
    }

    fn press_key(&self, key: &KeyEvent) {
        if key.code == KeyCode::Char(' ') {
            let mut state = lock(&self.state);
            state.checked = !state.checked;
        }
    }
}

#[derive(Debug, Clone)]
struct ListBoxState {
    items: Vec<String>,
    selected: Option<usize>,
    focused: bool,
}

struct ListBoxInner {
    state: Mutex<ListBoxState>,
    key_down: EventSource<KeyEvent>,
}

/// Single-selection list
#[derive(Clone)]
pub struct ListBox {
    inner: Arc<ListBoxInner>,
}

impl ListBox {
    pub fn new(items: Vec<String>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self {
            inner: Arc::new(ListBoxInner {
                state: Mutex::new(ListBoxState {
                    items,
                    selected,
                    focused: false,
                }),
                key_down: EventSource::new(),
            }),
        }
    }

    pub fn items(&self) -> Vec<String> {
        lock(&self.inner.state).items.clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        lock(&self.inner.state).selected
    }

    /// Select an item; out-of-range indices clear the selection
    pub fn select(&self, index: Option<usize>) {
        let mut state = lock(&self.inner.state);
        let len = state.items.len();
        state.selected = index.filter(|i| *i < len);
    }

    pub fn selected_label(&self) -> Option<(usize, String)> {
        let state = lock(&self.inner.state);
        state
            .selected
            .and_then(|i| state.items.get(i).map(|label| (i, label.clone())))
    }

    pub fn on_key_down<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        self.inner.key_down.subscribe(handler)
    }
}

impl Focusable for ListBox {
    fn has_focus(&self) -> bool {
        lock(&self.inner.state).focused
    }

    fn set_focus(&self, focused: bool) {
        lock(&self.inner.state).focused = focused;
    }

    fn is_focusable(&self) -> bool {
        true
    }

    fn press_key(&self, key: &KeyEvent) {
        {
            let mut state = lock(&self.inner.state);
            let len = state.items.len();
            if len > 0 {
                match key.code {
                    KeyCode::Up => {
                        state.selected = Some(state.selected.map_or(0, |i| i.saturating_sub(1)));
                    }
                    KeyCode::Down => {
                        state.selected = Some(state.selected.map_or(0, |i| (i + 1).min(len - 1)));
                    }
                    _ => {}
                }
            }
        }
        self.inner.key_down.emit(key);
    }
}
