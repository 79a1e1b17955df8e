//! Message dialog: a message and up to four buttons

use super::base::{move_focus, Dialog, DialogBase};
use super::controls::{Button, Focusable};
use super::race::{await_response, ResponseFuture, ResponseRace};
use super::render::{ButtonView, DialogView};
use super::settings::{DefaultButtonFocus, DialogSettings, MessageDialogStyle};
use super::types::{DialogResult, MessageDialogResult};
use std::sync::Arc;

pub struct MessageDialog {
    base: DialogBase,
    message: String,
    style: MessageDialogStyle,
    affirmative: Button,
    negative: Button,
    first_auxiliary: Button,
    second_auxiliary: Button,
}

impl MessageDialog {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        style: MessageDialogStyle,
        settings: DialogSettings,
    ) -> Self {
        let affirmative = Button::new(settings.affirmative_button_text.clone());
        let negative = Button::new(settings.negative_button_text.clone());
        let first_auxiliary = Button::new(settings.first_auxiliary_button_text.clone());
        let second_auxiliary = Button::new(settings.second_auxiliary_button_text.clone());
        negative.set_visible(style.shows_negative());
        first_auxiliary.set_visible(style.shows_first_auxiliary());
        second_auxiliary.set_visible(style.shows_second_auxiliary());

        let dialog = Self {
            base: DialogBase::new(title, settings),
            message: message.into(),
            style,
            affirmative,
            negative,
            first_auxiliary,
            second_auxiliary,
        };
        dialog.focus_default_button();
        dialog
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn style(&self) -> MessageDialogStyle {
        self.style
    }

    pub fn affirmative_button(&self) -> &Button {
        &self.affirmative
    }

    pub fn negative_button(&self) -> &Button {
        &self.negative
    }

    pub fn first_auxiliary_button(&self) -> &Button {
        &self.first_auxiliary
    }

    pub fn second_auxiliary_button(&self) -> &Button {
        &self.second_auxiliary
    }

    /// Wait for the first button press, Escape or cancellation
    pub async fn wait_for_button_press(self: &Arc<Self>) -> DialogResult<MessageDialogResult> {
        let dialog = Arc::clone(self);
        await_response(self.base.host(), move || dialog.register_race()).await
    }

    fn buttons(&self) -> [(&Button, MessageDialogResult); 4] {
        [
            (&self.affirmative, MessageDialogResult::Affirmative),
            (&self.negative, MessageDialogResult::Negative),
            (&self.first_auxiliary, MessageDialogResult::FirstAuxiliary),
            (&self.second_auxiliary, MessageDialogResult::SecondAuxiliary),
        ]
    }

    fn focus_default_button(&self) {
        let preferred = match self.base.settings().default_button_focus {
            DefaultButtonFocus::Affirmative => &self.affirmative,
            DefaultButtonFocus::Negative => &self.negative,
            DefaultButtonFocus::FirstAuxiliary => &self.first_auxiliary,
            DefaultButtonFocus::SecondAuxiliary => &self.second_auxiliary,
        };
        let target = if preferred.is_visible() {
            preferred
        } else if self.style == MessageDialogStyle::Affirmative {
            &self.affirmative
        } else {
            &self.negative
        };
        move_focus(&self.focusables(), target);
    }

    fn register_race(&self) -> ResponseFuture<MessageDialogResult> {
        let (race, response) = ResponseRace::new(self.base.id());

        for (button, result) in self.buttons() {
            let r = race.clone();
            race.hold(button.on_click(move || {
                r.resolve(result);
            }));
            let r = race.clone();
            let keys = self.base.keys().clone();
            race.hold(button.on_key_down(move |key| {
                if keys.is_accept(key) {
                    r.resolve(result);
                }
            }));
        }

        let r = race.clone();
        let keys = self.base.keys().clone();
        race.hold(self.base.on_key_down(move |key| {
            if keys.is_dismiss(key) {
                r.resolve(MessageDialogResult::Negative);
            }
        }));

        let r = race.clone();
        race.hold(self.base.settings().cancellation_token.register(move || {
            r.resolve(MessageDialogResult::Negative);
        }));

        self.base.begin_awaiting();
        response
    }
}

impl Dialog for MessageDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn focusables(&self) -> Vec<&dyn Focusable> {
        self.buttons().into_iter().map(|(b, _)| b as &dyn Focusable).collect()
    }

    fn view(&self) -> DialogView {
        let buttons: Vec<&Button> = self.buttons().into_iter().map(|(b, _)| b).collect();
        DialogView {
            message: self.message.clone(),
            buttons: ButtonView::visible(&buttons),
            ..self.base.view()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::CancellationToken;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn dialog(style: MessageDialogStyle, settings: DialogSettings) -> Arc<MessageDialog> {
        Arc::new(MessageDialog::new("Title", "Body", style, settings))
    }

    #[test]
    fn test_buttons_follow_style() {
        let d = dialog(MessageDialogStyle::AffirmativeAndNegativeAndSingleAuxiliary, DialogSettings::default());
        assert!(d.affirmative_button().is_visible());
        assert!(d.negative_button().is_visible());
        assert!(d.first_auxiliary_button().is_visible());
        assert!(!d.second_auxiliary_button().is_visible());
        assert_eq!(d.view().buttons.len(), 3);
    }

    #[test]
    fn test_default_focus_falls_back_when_hidden() {
        let single = dialog(MessageDialogStyle::Affirmative, DialogSettings::default());
        assert!(single.affirmative_button().has_focus());

        let settings = DialogSettings::default().with_default_button_focus(DefaultButtonFocus::SecondAuxiliary);
        let pair = dialog(MessageDialogStyle::AffirmativeAndNegative, settings);
        assert!(pair.negative_button().has_focus());

        let settings = DialogSettings::default().with_default_button_focus(DefaultButtonFocus::Affirmative);
        let pair = dialog(MessageDialogStyle::AffirmativeAndNegative, settings);
        assert!(pair.affirmative_button().has_focus());
    }

    #[tokio::test]
    async fn test_click_and_escape_in_same_tick_resolve_once() {
        let d = dialog(MessageDialogStyle::AffirmativeAndNegative, DialogSettings::default());
        let response = d.register_race();

        assert!(d.affirmative_button().click());
        d.handle_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));

        assert_eq!(response.wait().await.unwrap(), MessageDialogResult::Affirmative);
        assert_eq!(d.affirmative_button().click_listener_count(), 0);
        assert_eq!(d.negative_button().key_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_enter_on_focused_button() {
        let settings = DialogSettings::default().with_default_button_focus(DefaultButtonFocus::FirstAuxiliary);
        let d = dialog(MessageDialogStyle::AffirmativeAndNegativeAndDoubleAuxiliary, settings);
        let response = d.register_race();

        d.handle_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(response.wait().await.unwrap(), MessageDialogResult::FirstAuxiliary);
    }

    #[tokio::test]
    async fn test_alt_f4_dismisses() {
        let d = dialog(MessageDialogStyle::AffirmativeAndNegative, DialogSettings::default());
        let response = d.register_race();
        d.handle_key(&KeyEvent::new(KeyCode::F(4), KeyModifiers::ALT));
        assert_eq!(response.wait().await.unwrap(), MessageDialogResult::Negative);
    }

    #[tokio::test]
    async fn test_cancellation_after_resolution_is_ignored() {
        let token = CancellationToken::new();
        let settings = DialogSettings::default().with_cancellation_token(token.clone());
        let d = dialog(MessageDialogStyle::AffirmativeAndNegative, settings);
        let response = d.register_race();

        d.affirmative_button().click();
        token.cancel();
        assert_eq!(response.wait().await.unwrap(), MessageDialogResult::Affirmative);
    }

    #[tokio::test]
    async fn test_cancellation_resolves_negative() {
        let token = CancellationToken::new();
        let settings = DialogSettings::default().with_cancellation_token(token.clone());
        let d = dialog(MessageDialogStyle::Affirmative, settings);
        let response = d.register_race();

        token.cancel();
        assert_eq!(response.wait().await.unwrap(), MessageDialogResult::Negative);
    }
}
