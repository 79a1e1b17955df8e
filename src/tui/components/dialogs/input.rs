//! Input dialog: one text field, answered with its text or nothing

use super::base::{move_focus, Dialog, DialogBase};
use super::controls::{Button, Focusable, TextField};
use super::race::{await_response, ResponseFuture, ResponseRace};
use super::render::{ButtonView, DialogView, ViewRow};
use super::settings::DialogSettings;
use super::types::DialogResult;
use std::sync::Arc;

pub struct InputDialog {
    base: DialogBase,
    message: String,
    input: TextField,
    affirmative: Button,
    negative: Button,
}

impl InputDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, settings: DialogSettings) -> Self {
        let input = TextField::new(settings.default_text.clone());
        let affirmative = Button::new(settings.affirmative_button_text.clone());
        let negative = Button::new(settings.negative_button_text.clone());
        let dialog = Self {
            base: DialogBase::new(title, settings),
            message: message.into(),
            input,
            affirmative,
            negative,
        };
        move_focus(&dialog.focusables(), &dialog.input);
        dialog
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn input(&self) -> &TextField {
        &self.input
    }

    pub fn affirmative_button(&self) -> &Button {
        &self.affirmative
    }

    pub fn negative_button(&self) -> &Button {
        &self.negative
    }

    /// The entered text, or `None` when dismissed
    pub async fn wait_for_input(self: &Arc<Self>) -> DialogResult<Option<String>> {
        let dialog = Arc::clone(self);
        let accepted = await_response(self.base.host(), move || dialog.register_race()).await?;
        Ok(accepted.then(|| self.input.text()))
    }

    fn register_race(&self) -> ResponseFuture<bool> {
        let (race, response) = ResponseRace::new(self.base.id());
        let keys = self.base.keys();

        for (button, accepted) in [(&self.affirmative, true), (&self.negative, false)] {
            let r = race.clone();
            race.hold(button.on_click(move || {
                r.resolve(accepted);
            }));
            let (r, keys) = (race.clone(), keys.clone());
            race.hold(button.on_key_down(move |key| {
                if keys.is_accept(key) {
                    r.resolve(accepted);
                }
            }));
        }

        let (r, keys_for_field) = (race.clone(), keys.clone());
        race.hold(self.input.on_key_down(move |key| {
            if keys_for_field.is_accept(key) {
                r.resolve(true);
            }
        }));

        let (r, keys) = (race.clone(), keys.clone());
        race.hold(self.base.on_key_down(move |key| {
            if keys.is_dismiss(key) {
                r.resolve(false);
            }
        }));

        let r = race.clone();
        race.hold(self.base.settings().cancellation_token.register(move || {
            r.resolve(false);
        }));

        self.base.begin_awaiting();
        response
    }
}

impl Dialog for InputDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn focusables(&self) -> Vec<&dyn Focusable> {
        vec![&self.input, &self.affirmative, &self.negative]
    }

    fn view(&self) -> DialogView {
        DialogView {
            message: self.message.clone(),
            rows: vec![ViewRow::Field {
                text: self.input.display_text(),
                watermark: self.input.watermark(),
                focused: self.input.has_focus(),
            }],
            buttons: ButtonView::visible(&[&self.affirmative, &self.negative]),
            ..self.base.view()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(dialog: &InputDialog, code: KeyCode) {
        dialog.handle_key(&KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_field_starts_with_default_text_and_focus() {
        let d = InputDialog::new("Name", "Enter a name", DialogSettings::default().with_default_text("bob"));
        assert_eq!(d.input().text(), "bob");
        assert!(d.input().has_focus());
    }

    #[tokio::test]
    async fn test_enter_in_field_accepts_typed_text() {
        let d = Arc::new(InputDialog::new("Name", "", DialogSettings::default()));
        let waiter = {
            let d = d.clone();
            tokio::spawn(async move { d.wait_for_input().await })
        };
        while d.affirmative_button().click_listener_count() == 0 {
            tokio::task::yield_now().await;
        }

        for c in "ann".chars() {
            press(&d, KeyCode::Char(c));
        }
        press(&d, KeyCode::Enter);
        assert_eq!(waiter.await.unwrap().unwrap(), Some("ann".to_string()));
    }

    #[tokio::test]
    async fn test_negative_button_yields_none() {
        let d = Arc::new(InputDialog::new("Name", "", DialogSettings::default().with_default_text("x")));
        let response = d.register_race();
        d.negative_button().click();
        assert!(!response.wait().await.unwrap());
    }

    #[tokio::test]
    async fn test_escape_yields_none() {
        let d = InputDialog::new("Name", "", DialogSettings::default());
        let response = d.register_race();
        press(&d, KeyCode::Esc);
        assert!(!response.wait().await.unwrap());
    }
}
