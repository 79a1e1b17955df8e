//! Login dialog: username, password and an optional remember checkbox

use super::base::{move_focus, route_key, Dialog, DialogBase};
use super::controls::{Button, CheckBox, Focusable, TextField};
use super::race::{await_response, ResponseFuture, ResponseRace};
use super::render::{ButtonView, DialogView, ViewRow};
use super::settings::LoginDialogSettings;
use super::types::{DialogResult, LoginDialogData};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct LoginDialog {
    base: DialogBase,
    message: String,
    username: TextField,
    password: TextField,
    remember: CheckBox,
    affirmative: Button,
    negative: Button,
    password_preview: bool,
    revealed: AtomicBool,
}

impl LoginDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, settings: LoginDialogSettings) -> Self {
        let username = TextField::new(settings.initial_username.clone()).with_watermark(settings.username_watermark.clone());
        let password =
            TextField::password(settings.initial_password.clone()).with_watermark(settings.password_watermark.clone());
        let remember = CheckBox::new(settings.remember_checkbox_text.clone(), settings.remember_checkbox_checked);
        remember.set_visible(settings.remember_checkbox_visible);
        let affirmative = Button::new(settings.base.affirmative_button_text.clone());
        let negative = Button::new(settings.base.negative_button_text.clone());
        negative.set_visible(settings.negative_button_visible);

        let start_on_password = !settings.initial_username.is_empty();
        let dialog = Self {
            base: DialogBase::new(title, settings.base),
            message: message.into(),
            username,
            password,
            remember,
            affirmative,
            negative,
            password_preview: settings.enable_password_preview,
            revealed: AtomicBool::new(false),
        };
        let target = if start_on_password { &dialog.password } else { &dialog.username };
        move_focus(&dialog.focusables(), target);
        dialog
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn username(&self) -> &TextField {
        &self.username
    }

    pub fn password(&self) -> &TextField {
        &self.password
    }

    pub fn remember_checkbox(&self) -> &CheckBox {
        &self.remember
    }

    pub fn affirmative_button(&self) -> &Button {
        &self.affirmative
    }

    pub fn negative_button(&self) -> &Button {
        &self.negative
    }

    /// Credentials on acceptance, `None` when dismissed
    pub async fn wait_for_login(self: &Arc<Self>) -> DialogResult<Option<LoginDialogData>> {
        let dialog = Arc::clone(self);
        let accepted = await_response(self.base.host(), move || dialog.register_race()).await?;
        Ok(accepted.then(|| self.credentials()))
    }

    fn credentials(&self) -> LoginDialogData {
        LoginDialogData {
            username: self.username.text(),
            password: self.password.text(),
            should_remember: self.remember.is_visible() && self.remember.is_checked(),
        }
    }

    fn is_preview_toggle(&self, key: &KeyEvent) -> bool {
        self.password_preview && key.code == KeyCode::Char('p') && key.modifiers == KeyModifiers::CONTROL
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

        for field in [&self.username, &self.password] {
            let (r, keys) = (race.clone(), keys.clone());
            race.hold(field.on_key_down(move |key| {
                if keys.is_accept(key) {
                    r.resolve(true);
                }
            }));
        }

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

impl Dialog for LoginDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn focusables(&self) -> Vec<&dyn Focusable> {
        vec![
            &self.username,
            &self.password,
            &self.remember,
            &self.affirmative,
            &self.negative,
        ]
    }

    fn handle_key(&self, key: &KeyEvent) {
        if self.is_preview_toggle(key) {
            let revealed = !self.revealed.fetch_xor(true, Ordering::SeqCst);
            self.password.set_revealed(revealed);
            return;
        }
        route_key(&self.focusables(), &self.base, key);
    }

    fn view(&self) -> DialogView {
        let mut rows = vec![
            ViewRow::Field {
                text: self.username.display_text(),
                watermark: self.username.watermark(),
                focused: self.username.has_focus(),
            },
            ViewRow::Field {
                text: self.password.display_text(),
                watermark: self.password.watermark(),
                focused: self.password.has_focus(),
            },
        ];
        if self.remember.is_visible() {
            rows.push(ViewRow::CheckBox {
                label: self.remember.label(),
                checked: self.remember.is_checked(),
                focused: self.remember.has_focus(),
            });
        }
        DialogView {
            message: self.message.clone(),
            rows,
            buttons: ButtonView::visible(&[&self.affirmative, &self.negative]),
            ..self.base.view()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_initial_focus() {
        let d = LoginDialog::new("Login", "", LoginDialogSettings::default());
        assert!(d.username().has_focus());
        assert!(!d.negative_button().is_visible());

        let d = LoginDialog::new("Login", "", LoginDialogSettings::default().with_initial_username("ann"));
        assert!(d.password().has_focus());
        assert_eq!(d.affirmative_button().label(), "Login");
    }

    #[tokio::test]
    async fn test_enter_in_password_field_logs_in() {
        let settings = LoginDialogSettings::default()
            .with_initial_username("ann")
            .with_remember_checkbox("Keep me signed in", false);
        let d = LoginDialog::new("Login", "", settings);
        let response = d.register_race();

        for c in "hunter2".chars() {
            d.handle_key(&key(KeyCode::Char(c)));
        }
        d.handle_key(&key(KeyCode::Tab));
        d.handle_key(&key(KeyCode::Char(' ')));
        assert!(d.remember_checkbox().is_checked());
        d.handle_key(&key(KeyCode::Tab));
        d.handle_key(&key(KeyCode::Enter));

        assert!(response.wait().await.unwrap());
        assert_eq!(
            d.credentials(),
            LoginDialogData {
                username: "ann".to_string(),
                password: "hunter2".to_string(),
                should_remember: true,
            }
        );
    }

    #[test]
    fn test_password_preview_toggle() {
        let settings = LoginDialogSettings::default()
            .with_initial_password("secret")
            .with_password_preview(true);
        let d = LoginDialog::new("Login", "", settings);
        assert_eq!(d.password().display_text(), "******");

        let toggle = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL);
        d.handle_key(&toggle);
        assert_eq!(d.password().display_text(), "secret");
        d.handle_key(&toggle);
        assert_eq!(d.password().display_text(), "******");
    }

    #[tokio::test]
    async fn test_escape_dismisses() {
        let d = LoginDialog::new("Login", "", LoginDialogSettings::default());
        let response = d.register_race();
        d.handle_key(&key(KeyCode::Esc));
        assert!(!response.wait().await.unwrap());
    }
}
