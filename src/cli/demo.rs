use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::tui::components::dialogs::{
    draw_surface, on_dialog_lifecycle, CustomDialog, DefaultButtonFocus, Dialog, DialogId, DialogLifecycle, DialogManager,
    DialogResult, DialogState, Geometry, HostSurface, LoginDialogSettings, MessageDialogStyle, Slot,
    SurfaceView,
};
use crate::tui::themes::Theme;
use crate::tui::{init_terminal, restore_terminal, Event, EventHandler};

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Dialog scenario to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// A three-button message dialog
    Message,
    /// A message dialog stacked on top of another dialog
    Stacked,
    /// A cancelable progress dialog
    Progress,
    /// A login dialog with a remember checkbox
    Login,
    /// A single-line input dialog
    Input,
}

/// Show dialogs on a demo host
#[derive(Args)]
pub struct DemoCommand {
    #[arg(value_enum)]
    pub scenario: Scenario,

    /// Drive the dialogs from the keyboard instead of a canned script
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,
}

/// Keys fed to one dialog once it waits for a response
struct Step {
    delay: Duration,
    keys: Vec<KeyEvent>,
}

impl Step {
    fn new(keys: Vec<KeyEvent>) -> Self {
        Self {
            delay: Duration::ZERO,
            keys,
        }
    }

    fn after(delay: Duration, keys: Vec<KeyEvent>) -> Self {
        Self { delay, keys }
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn typed(text: &str) -> impl Iterator<Item = KeyEvent> + '_ {
    text.chars().map(|c| key(KeyCode::Char(c)))
}

impl DemoCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        config.validate()?;
        info!("Playing {:?} demo", self.scenario);

        if self.interactive {
            self.run_interactive(config).await
        } else {
            self.run_scripted(config).await
        }
    }

    async fn run_scripted(&self, config: &Config) -> Result<()> {
        let host = config.host_builder("demo").geometry(Geometry::new(60, 16)).build()?;

        let host_id = host.id();
        let _lifecycle = on_dialog_lifecycle(move |event| {
            if event.host == host_id {
                let kind = match event.kind {
                    DialogLifecycle::Opened => "opened",
                    DialogLifecycle::Closed => "closed",
                };
                println!("[{}] {}", kind, event.title);
            }
        });

        let scene = tokio::spawn(play(self.scenario, host.dialogs()));
        tokio::time::timeout(SCRIPT_TIMEOUT, drive(&host, script(self.scenario)))
            .await
            .map_err(|_| anyhow!("demo script timed out"))??;

        let outcome = scene.await??;
        println!("{}", outcome);
        Ok(())
    }

    async fn run_interactive(&self, config: &Config) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = async {
            let size = terminal.size()?;
            let host = config
                .host_builder("demo")
                .geometry(Geometry::new(size.width, size.height))
                .build()?;
            let scene = tokio::spawn(play(self.scenario, host.dialogs()));
            let theme = Theme::default();
            let mut events = EventHandler::new();

            while !scene.is_finished() {
                let view = host.view().await?;
                terminal.draw(|frame| {
                    let area = frame.size();
                    draw_surface(frame, area, &view, &theme)
                })?;

                match events.next().await {
                    Event::Key(key) if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) => {
                        scene.abort();
                        return Ok(None);
                    }
                    Event::Key(key) => {
                        host.dispatch_key(key).await?;
                    }
                    Event::Resize(width, height) => host.set_size(width, height).await?,
                    Event::Tick => {}
                }
            }

            Ok::<_, anyhow::Error>(Some(scene.await??))
        }
        .await;
        restore_terminal(&mut terminal)?;

        if let Some(outcome) = result? {
            println!("{}", outcome);
        }
        Ok(())
    }
}

fn script(scenario: Scenario) -> Vec<Step> {
    match scenario {
        Scenario::Message => vec![Step::new(vec![key(KeyCode::Enter)])],
        Scenario::Stacked => vec![Step::new(vec![key(KeyCode::Esc)])],
        Scenario::Progress => vec![Step::after(Duration::from_millis(150), vec![key(KeyCode::Esc)])],
        Scenario::Login => {
            let mut keys: Vec<KeyEvent> = typed("demo").collect();
            keys.push(key(KeyCode::Tab));
            keys.extend(typed("hunter2"));
            keys.push(key(KeyCode::Enter));
            vec![Step::new(keys)]
        }
        Scenario::Input => {
            let mut keys: Vec<KeyEvent> = typed("hello").collect();
            keys.push(key(KeyCode::Enter));
            vec![Step::new(keys)]
        }
    }
}

/// Feed each step to the next dialog that starts waiting for a response
async fn drive(host: &Arc<HostSurface>, steps: Vec<Step>) -> Result<()> {
    let mut handled: HashSet<DialogId> = HashSet::new();

    for step in steps {
        let id = loop {
            match host.active_dialog().await? {
                Some((id, DialogState::AwaitingResponse(Slot::Active))) if !handled.contains(&id) => break id,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        };
        handled.insert(id);
        tokio::time::sleep(step.delay).await;

        let view = host.view().await?;
        println!("{}", render_text(&view)?);

        for key in step.keys {
            debug!("Scripted key {:?} for dialog {}", key.code, id);
            host.dispatch_key(key).await?;
        }
    }
    Ok(())
}

/// Draw one frame into an off-screen buffer and return it as text
fn render_text(view: &SurfaceView) -> Result<String> {
    let geometry = view.geometry;
    let mut terminal = Terminal::new(TestBackend::new(geometry.width, geometry.height))?;
    let theme = Theme::default();
    terminal.draw(|frame| {
        let area = frame.size();
        draw_surface(frame, area, view, &theme)
    })?;

    let buffer = terminal.backend().buffer();
    let lines: Vec<String> = (0..geometry.height)
        .map(|y| {
            let line: String = (0..geometry.width).map(|x| buffer.get(x, y).symbol()).collect();
            line.trim_end().to_string()
        })
        .collect();
    Ok(lines.join("\n"))
}

async fn play(scenario: Scenario, manager: DialogManager) -> DialogResult<String> {
    let defaults = manager.default_settings().clone();

    match scenario {
        Scenario::Message => {
            let settings = defaults
                .with_affirmative_text("Save")
                .with_negative_text("Don't save")
                .with_auxiliary_texts("Cancel", "Cancel")
                .with_default_button_focus(DefaultButtonFocus::Affirmative);
            let result = manager
                .show_message(
                    "Unsaved changes",
                    "Save changes to notes.txt before closing?",
                    MessageDialogStyle::AffirmativeAndNegativeAndSingleAuxiliary,
                    Some(settings),
                )
                .await?;
            Ok(format!("Message answered: {:?}", result))
        }
        Scenario::Stacked => {
            let background: Arc<CustomDialog> = Arc::new(
                CustomDialog::new("Background job", defaults.clone()).with_content("Indexing 1,204 files..."),
            );
            manager.show_custom(background.clone(), None).await?;

            let result = manager
                .show_message(
                    "Overwrite?",
                    "A file named report.pdf already exists.",
                    MessageDialogStyle::AffirmativeAndNegative,
                    Some(defaults),
                )
                .await?;
            let promoted = manager.current_dialog::<CustomDialog>().await?.map(|d| d.id());
            manager.hide(background.clone()).await?;
            Ok(format!(
                "Top dialog answered {:?}; background promoted back: {}",
                result,
                promoted == Some(background.id())
            ))
        }
        Scenario::Progress => {
            let controller = manager
                .show_progress("Copying", "Copying files to backup...", true, Some(defaults))
                .await?;
            controller.set_maximum(10.0).await?;

            let mut copied = 0;
            while copied < 10 && !controller.is_canceled() {
                tokio::time::sleep(Duration::from_millis(40)).await;
                copied += 1;
                controller.set_progress(copied as f64).await?;
                controller.set_message(format!("Copied {} of 10 files", copied)).await?;
            }
            let canceled = controller.is_canceled();
            controller.close().await?;
            Ok(if canceled {
                format!("Copy canceled after {} files", copied)
            } else {
                "Copy finished".to_string()
            })
        }
        Scenario::Login => {
            let settings = LoginDialogSettings::new(defaults.with_affirmative_text("Sign in"))
                .with_remember_checkbox("Remember me", true);
            let login = manager
                .show_login("Sign in", "Enter your credentials", Some(settings))
                .await?;
            Ok(match login {
                Some(data) => format!(
                    "Signed in as '{}' ({} character password, remember: {})",
                    data.username,
                    data.password.chars().count(),
                    data.should_remember
                ),
                None => "Login canceled".to_string(),
            })
        }
        Scenario::Input => {
            let input = manager
                .show_input("Rename", "New name for the selection", Some(defaults))
                .await?;
            Ok(match input {
                Some(text) => format!("Input: '{}'", text),
                None => "Input canceled".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> Config {
        Config {
            overlay_fade_in_ms: 10,
            overlay_fade_out_ms: 10,
            dialog_close_ms: 10,
            ..Config::default()
        }
    }

    async fn run(scenario: Scenario) -> String {
        let config = quick_config();
        let host = config.host_builder("demo-test").build().unwrap();
        let scene = tokio::spawn(play(scenario, host.dialogs()));
        tokio::time::timeout(SCRIPT_TIMEOUT, drive(&host, script(scenario)))
            .await
            .unwrap()
            .unwrap();
        scene.await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_message_script_accepts() {
        assert_eq!(run(Scenario::Message).await, "Message answered: Affirmative");
    }

    #[tokio::test]
    async fn test_stacked_script_promotes_background() {
        let outcome = run(Scenario::Stacked).await;
        assert_eq!(outcome, "Top dialog answered Negative; background promoted back: true");
    }

    #[tokio::test]
    async fn test_input_script_types_text() {
        assert_eq!(run(Scenario::Input).await, "Input: 'hello'");
    }

    #[tokio::test]
    async fn test_login_script_captures_credentials() {
        let outcome = run(Scenario::Login).await;
        assert_eq!(outcome, "Signed in as 'demo' (7 character password, remember: true)");
    }

    #[test]
    fn test_render_text_trims_lines() {
        let view = SurfaceView {
            overlay: Default::default(),
            overlay_opacity: 0.0,
            geometry: Geometry::new(20, 4),
            dialog: None,
        };
        let text = render_text(&view).unwrap();
        assert_eq!(text.split('\n').count(), 4);
        assert!(text.split('\n').all(|line| line.is_empty()));
    }
}
