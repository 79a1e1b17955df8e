//! Caller-built dialog with free-form content
//!
//! The coordinator treats it like any other dialog but runs no response
//! race for it: callers listen to its key events and hide it themselves.

use super::base::{Dialog, DialogBase};
use super::render::DialogView;
use super::settings::DialogSettings;
use crate::tui::events::lock;
use std::sync::Mutex;

pub struct CustomDialog {
    base: DialogBase,
    content: Mutex<String>,
}

impl CustomDialog {
    pub fn new(title: impl Into<String>, settings: DialogSettings) -> Self {
        Self {
            base: DialogBase::new(title, settings),
            content: Mutex::new(String::new()),
        }
    }

    pub fn with_content(self, content: impl Into<String>) -> Self {
        *lock(&self.content) = content.into();
        self
    }

    /// Storyboard played on hide; `None` leaves the dialog without one
    pub fn with_closing_animation(mut self, resource: Option<String>) -> Self {
        self.base = self.base.with_closing_animation(resource);
        self
    }

    pub fn content(&self) -> String {
        lock(&self.content).clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        *lock(&self.content) = content.into();
    }
}

impl Dialog for CustomDialog {
    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn view(&self) -> DialogView {
        DialogView {
            message: self.content(),
            ..self.base.view()
        }
    }
}
