//! Selector dialog: pick one entry from a list

use super::base::{move_focus, Dialog, DialogBase};
use super::controls::{Button, Focusable, ListBox};
use super::race::{await_response, ResponseFuture, ResponseRace};
use super::render::{ButtonView, DialogView, ViewRow};
use super::settings::DialogSettings;
use super::types::{DialogResult, SelectedItem};
use std::sync::Arc;

pub struct SelectorDialog {
    base: DialogBase,
    message: String,
    list: ListBox,
    affirmative: Button,
    negative: Button,
}

impl SelectorDialog {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        items: Vec<String>,
        settings: DialogSettings,
    ) -> Self {
        let list = ListBox::new(items);
        let affirmative = Button::new(settings.affirmative_button_text.clone());
        let negative = Button::new(settings.negative_button_text.clone());
        let dialog = Self {
            base: DialogBase::new(title, settings),
            message: message.into(),
            list,
            affirmative,
            negative,
        };
        move_focus(&dialog.focusables(), &dialog.list);
        dialog
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn list(&self) -> &ListBox {
        &self.list
    }

    pub fn affirmative_button(&self) -> &Button {
        &self.affirmative
    }

    pub fn negative_button(&self) -> &Button {
        &self.negative
    }

    /// The chosen entry, `None` when dismissed or nothing is selected
    pub async fn wait_for_selection(self: &Arc<Self>) -> DialogResult<Option<SelectedItem>> {
        let dialog = Arc::clone(self);
        let accepted = await_response(self.base.host(), move || dialog.register_race()).await?;
        Ok(accepted.then(|| self.selection()).flatten())
    }

    fn selection(&self) -> Option<SelectedItem> {
        self.list
            .selected_label()
            .map(|(index, label)| SelectedItem { index, label })
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

        let (r, list_keys) = (race.clone(), keys.clone());
        race.hold(self.list.on_key_down(move |key| {
            if list_keys.is_accept(key) {
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

impl Dialog for SelectorDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn focusables(&self) -> Vec<&dyn Focusable> {
        vec![&self.list, &self.affirmative, &self.negative]
    }

    fn view(&self) -> DialogView {
        DialogView {
            message: self.message.clone(),
            rows: vec![ViewRow::List {
                items: self.list.items(),
                selected: self.list.selected_index(),
                focused: self.list.has_focus(),
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

    fn items() -> Vec<String> {
        vec!["red".to_string(), "green".to_string(), "blue".to_string()]
    }

    #[tokio::test]
    async fn test_arrow_then_enter_selects() {
        let d = SelectorDialog::new("Color", "Pick one", items(), DialogSettings::default());
        assert!(d.list().has_focus());
        let response = d.register_race();

        d.handle_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        d.handle_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        d.handle_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(response.wait().await.unwrap());
        assert_eq!(d.selection(), Some(SelectedItem { index: 2, label: "blue".to_string() }));
    }

    #[tokio::test]
    async fn test_empty_list_accepts_as_none() {
        let d = Arc::new(SelectorDialog::new("Color", "", Vec::new(), DialogSettings::default()));
        let waiter = {
            let d = d.clone();
            tokio::spawn(async move { d.wait_for_selection().await })
        };
        while d.affirmative_button().click_listener_count() == 0 {
            tokio::task::yield_now().await;
        }
        d.affirmative_button().click();
        assert_eq!(waiter.await.unwrap().unwrap(), None);
    }
}
