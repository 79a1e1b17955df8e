//! Drawing dialogs with ratatui
//!
//! Dialogs never draw themselves directly. They describe what they look like
//! as a [`DialogView`], the host bundles that with its overlay state into a
//! [`SurfaceView`], and [`draw_surface`] turns the pair into widgets.

use super::base::SizeBounds;
use super::controls::{Button, Focusable};
use super::host::{Geometry, OverlayState};
use super::settings::ColorScheme;
use crate::tui::themes::{DialogPalette, Theme};
use crate::tui::Frame;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};

/// One body row below the message
#[derive(Debug, Clone, PartialEq)]
pub enum ViewRow {
    Field {
        text: String,
        watermark: String,
        focused: bool,
    },
    CheckBox {
        label: String,
        checked: bool,
        focused: bool,
    },
    List {
        items: Vec<String>,
        selected: Option<usize>,
        focused: bool,
    },
    /// `ratio` is `None` while indeterminate
    Progress { ratio: Option<f64> },
}

impl ViewRow {
    fn height(&self) -> u16 {
        match self {
            ViewRow::List { items, .. } => u16::try_from(items.len()).unwrap_or(u16::MAX).max(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    pub label: String,
    pub focused: bool,
    pub enabled: bool,
}

impl ButtonView {
    /// Views of the visible buttons, in order
    pub fn visible(buttons: &[&Button]) -> Vec<Self> {
        buttons
            .iter()
            .filter(|b| b.is_visible())
            .map(|b| Self {
                label: b.label(),
                focused: b.has_focus(),
                enabled: b.is_enabled(),
            })
            .collect()
    }
}

/// Everything needed to draw one dialog
#[derive(Debug, Clone, PartialEq)]
pub struct DialogView {
    pub title: String,
    pub message: String,
    pub color_scheme: ColorScheme,
    pub maximum_body_height: Option<u16>,
    pub bounds: SizeBounds,
    pub opacity: f32,
    pub rows: Vec<ViewRow>,
    pub buttons: Vec<ButtonView>,
}

impl Default for DialogView {
    fn default() -> Self {
        Self {
            title: String::new(),
            message: String::new(),
            color_scheme: ColorScheme::Theme,
            maximum_body_height: None,
            bounds: SizeBounds::default(),
            opacity: 1.0,
            rows: Vec::new(),
            buttons: Vec::new(),
        }
    }
}

/// A host frame: overlay plus the active dialog
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceView {
    pub overlay: OverlayState,
    pub overlay_opacity: f32,
    pub geometry: Geometry,
    pub dialog: Option<DialogView>,
}

/// Draw the overlay and the active dialog into `area`
pub fn draw_surface(frame: &mut Frame, area: Rect, view: &SurfaceView, theme: &Theme) {
    if view.overlay != OverlayState::Hidden && view.overlay_opacity > 0.0 {
        frame.render_widget(Block::default().style(theme.overlay(view.overlay_opacity)), area);
    }

    if let Some(dialog) = &view.dialog {
        // Fully faded dialogs are mid-close
        if dialog.opacity > 0.0 {
            draw_dialog(frame, area, dialog, &theme.palette(dialog.color_scheme));
        }
    }
}

fn dialog_area(area: Rect, dialog: &DialogView) -> Rect {
    let body_rows: u16 = dialog.rows.iter().map(ViewRow::height).sum();
    let message_rows = u16::try_from(dialog.message.lines().count()).unwrap_or(u16::MAX);
    let mut body = message_rows.saturating_add(body_rows);
    if let Some(limit) = dialog.maximum_body_height {
        body = body.min(limit);
    }

    // Borders, a blank line, the button row
    let mut height = body.saturating_add(6);
    if dialog.bounds.max_height > 0 {
        height = height.clamp(dialog.bounds.min_height, dialog.bounds.max_height);
    }
    let height = height.min(area.height);

    Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: area.width,
        height,
    }
}

fn draw_dialog(frame: &mut Frame, area: Rect, dialog: &DialogView, palette: &DialogPalette) {
    let area = dialog_area(area, dialog);
    frame.render_widget(Clear, area);

    let mut body_style = palette.body();
    if dialog.opacity < 0.5 {
        body_style = body_style.add_modifier(Modifier::DIM);
    }
    let block = Block::default()
        .title(format!(" {} ", dialog.title))
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(Style::default().fg(palette.border))
        .style(body_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(1)
        .split(inner);

    draw_body(frame, chunks[0], dialog, palette);
    draw_buttons(frame, chunks[1], &dialog.buttons, palette);
}

fn draw_body(frame: &mut Frame, area: Rect, dialog: &DialogView, palette: &DialogPalette) {
    let message_rows = u16::try_from(dialog.message.lines().count()).unwrap_or(u16::MAX);
    let mut constraints = vec![Constraint::Length(message_rows)];
    constraints.extend(dialog.rows.iter().map(|row| Constraint::Length(row.height())));
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let message = Paragraph::new(dialog.message.as_str())
        .style(palette.body())
        .wrap(Wrap { trim: true });
    frame.render_widget(message, chunks[0]);

    for (row, chunk) in dialog.rows.iter().zip(chunks.iter().skip(1)) {
        draw_row(frame, *chunk, row, palette);
    }
}

fn draw_row(frame: &mut Frame, area: Rect, row: &ViewRow, palette: &DialogPalette) {
    let focus_style = |focused: bool| if focused { palette.focused() } else { palette.body() };
    match row {
        ViewRow::Field {
            text,
            watermark,
            focused,
        } => {
            let line = if text.is_empty() {
                Line::from(Span::styled(watermark.clone(), palette.muted()))
            } else {
                Line::from(Span::styled(text.clone(), focus_style(*focused)))
            };
            let marker = if *focused { "> " } else { "  " };
            let mut spans = vec![Span::raw(marker)];
            spans.extend(line.spans);
            frame.render_widget(Paragraph::new(Line::from(spans)), area);
        }
        ViewRow::CheckBox {
            label,
            checked,
            focused,
        } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            let text = Span::styled(format!("{} {}", mark, label), focus_style(*focused));
            frame.render_widget(Paragraph::new(Line::from(text)), area);
        }
        ViewRow::List {
            items,
            selected,
            focused,
        } => {
            let lines: Vec<Line> = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if Some(i) == *selected {
                        Line::from(Span::styled(format!("> {}", item), focus_style(*focused)))
                    } else {
                        Line::from(Span::styled(format!("  {}", item), palette.body()))
                    }
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), area);
        }
        ViewRow::Progress { ratio } => {
            let gauge = match ratio {
                Some(ratio) => Gauge::default().ratio(ratio.clamp(0.0, 1.0)),
                None => Gauge::default().ratio(0.0).label("..."),
            };
            frame.render_widget(gauge.gauge_style(Style::default().fg(palette.highlight)), area);
        }
    }
}

fn draw_buttons(frame: &mut Frame, area: Rect, buttons: &[ButtonView], palette: &DialogPalette) {
    let mut spans = Vec::new();
    for button in buttons {
        let style = if button.focused {
            palette.focused()
        } else if button.enabled {
            palette.body()
        } else {
            palette.muted()
        };
        spans.push(Span::styled(format!(" {} ", button.label), style));
        spans.push(Span::raw(" "));
    }
    let row = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(row, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(view: &SurfaceView) -> String {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                draw_surface(frame, area, view, &Theme::dark())
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn surface(dialog: Option<DialogView>) -> SurfaceView {
        SurfaceView {
            overlay: OverlayState::Visible,
            overlay_opacity: 0.7,
            geometry: Geometry::new(60, 20),
            dialog,
        }
    }

    #[test]
    fn test_draws_title_message_and_buttons() {
        let view = DialogView {
            title: "Delete".to_string(),
            message: "Delete the file?".to_string(),
            buttons: vec![
                ButtonView { label: "OK".to_string(), focused: false, enabled: true },
                ButtonView { label: "Cancel".to_string(), focused: true, enabled: true },
            ],
            ..DialogView::default()
        };
        let screen = render(&surface(Some(view)));
        assert!(screen.contains("Delete"));
        assert!(screen.contains("Delete the file?"));
        assert!(screen.contains(" OK "));
        assert!(screen.contains(" Cancel "));
    }

    #[test]
    fn test_field_shows_watermark_when_empty() {
        let view = DialogView {
            title: "Login".to_string(),
            rows: vec![ViewRow::Field {
                text: String::new(),
                watermark: "Username...".to_string(),
                focused: true,
            }],
            ..DialogView::default()
        };
        assert!(render(&surface(Some(view))).contains("Username..."));
    }

    #[test]
    fn test_faded_out_dialog_is_not_drawn() {
        let view = DialogView {
            title: "Gone".to_string(),
            opacity: 0.0,
            ..DialogView::default()
        };
        assert!(!render(&surface(Some(view))).contains("Gone"));
    }
}
