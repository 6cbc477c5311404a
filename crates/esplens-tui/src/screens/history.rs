//! History screen — past change-detection analyses.
//!
//! Image pairs are heavy, so they download lazily: an entry's pair is
//! requested the first time its row scrolls into view, and exactly once.
//! A failed download marks the entry but never removes it from the list.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use esplens_api::AnalysisEntry;

use crate::action::{Action, EntryImages};
use crate::component::Component;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryState {
    Loading,
    Ready,
    Failed,
}

/// Download lifecycle for one entry's image pair. Strictly forward:
/// `Pending` fires a request and becomes `Fetching`; the outcome parks in
/// `Ready` or `Failed` and is never retried.
#[derive(Debug, Clone)]
enum ImageState {
    Pending,
    Fetching,
    Ready(EntryImages),
    Failed(String),
}

pub struct HistoryScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    state: HistoryState,
    entries: Vec<AnalysisEntry>,
    images: HashMap<Uuid, ImageState>,
    selected: usize,
    /// First visible row.
    offset: usize,
    /// Rows the list area held at last render; drives the visibility scan.
    viewport_rows: Cell<u16>,
    detail_open: bool,
    load_error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl HistoryScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            state: HistoryState::Loading,
            entries: Vec::new(),
            images: HashMap::new(),
            selected: 0,
            offset: 0,
            viewport_rows: Cell::new(0),
            detail_open: false,
            load_error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let current = self.selected as isize;
        self.selected = (current + delta).clamp(0, self.entries.len() as isize - 1) as usize;
        self.ensure_visible();
    }

    /// Keep the selection inside the visible window, moving the window
    /// when it is not.
    fn ensure_visible(&mut self) {
        let rows = self.viewport_rows.get() as usize;
        if rows == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
    }

    /// Request images for every visible entry that has never been asked
    /// for. Each entry moves `Pending` to `Fetching` at most once, so a
    /// row scrolling in and out of view cannot fire twice.
    fn visible_requests(&mut self) -> Vec<Action> {
        let rows = self.viewport_rows.get() as usize;
        if rows == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let start = self.offset.min(self.entries.len() - 1);
        let end = (start + rows).min(self.entries.len());

        let mut requests = Vec::new();
        for entry in &self.entries[start..end] {
            let state = self.images.entry(entry.id).or_insert(ImageState::Pending);
            if matches!(state, ImageState::Pending) {
                *state = ImageState::Fetching;
                requests.push(Action::RequestEntryImages {
                    id: entry.id,
                    image1: entry.image1.clone(),
                    image2: entry.image2.clone(),
                });
            }
        }
        requests
    }

    fn reload(&mut self) {
        self.state = HistoryState::Loading;
        self.load_error = None;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::RequestHistory);
        }
    }

    fn short_id(id: Uuid) -> String {
        let mut s = id.simple().to_string();
        s.truncate(8);
        s
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        self.viewport_rows.set(area.height.saturating_sub(1));

        if self.entries.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  No analyses yet. History fills in as devices upload image pairs.",
                    Style::default().fg(theme::SLATE),
                )),
                area,
            );
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("    Entry     ", theme::table_header()),
            Span::styled("Created           ", theme::table_header()),
            Span::styled("Model           ", theme::table_header()),
            Span::styled("Description", theme::table_header()),
        ]));

        let rows = area.height.saturating_sub(1) as usize;
        let start = self.offset.min(self.entries.len().saturating_sub(1));
        let end = (start + rows).min(self.entries.len());

        for (i, entry) in self.entries[start..end].iter().enumerate() {
            let idx = start + i;
            let is_selected = idx == self.selected;
            let marker = if is_selected { "\u{25B8}" } else { " " };

            let (glyph, glyph_color) = match self.images.get(&entry.id) {
                None | Some(ImageState::Pending) => ("\u{25CB}", theme::SLATE),
                Some(ImageState::Fetching) => ("\u{25D0}", theme::SAND),
                Some(ImageState::Ready(_)) => ("\u{25CF}", theme::SPRING_GREEN),
                Some(ImageState::Failed(_)) => ("\u{2717}", theme::SIGNAL_RED),
            };

            let created = entry
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            let description = entry.description.as_deref().unwrap_or("(pending)");
            let desc_width = area.width.saturating_sub(52).max(10) as usize;
            let description: String = description.chars().take(desc_width).collect();

            let row_style = if is_selected {
                theme::table_selected()
            } else {
                theme::table_row()
            };
            let desc_style = if entry.description.is_some() {
                row_style
            } else {
                Style::default().fg(theme::SLATE)
            };

            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} "), row_style),
                Span::styled(format!("{glyph} "), Style::default().fg(glyph_color)),
                Span::styled(format!("{:<10}", Self::short_id(entry.id)), row_style),
                Span::styled(format!("{created:<18}"), row_style),
                Span::styled(format!("{:<16}", entry.model_used), row_style),
                Span::styled(description, desc_style),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, entry: &AnalysisEntry) {
        let title = format!(" Analysis {} ", Self::short_id(entry.id));
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let created = entry
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        let mut lines = vec![
            Line::from(vec![
                Span::styled("  Created  ", Style::default().fg(theme::FOG)),
                Span::styled(created, Style::default().fg(theme::SAND)),
                Span::styled("    Model  ", Style::default().fg(theme::FOG)),
                Span::styled(entry.model_used.clone(), Style::default().fg(theme::TEAL)),
            ]),
            Line::raw(""),
        ];

        match self.images.get(&entry.id) {
            Some(ImageState::Ready(images)) => {
                lines.push(Line::from(vec![
                    Span::styled("  Before  ", Style::default().fg(theme::FOG)),
                    Span::styled(
                        images.before.display().to_string(),
                        Style::default().fg(theme::TEAL),
                    ),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("  After   ", Style::default().fg(theme::FOG)),
                    Span::styled(
                        images.after.display().to_string(),
                        Style::default().fg(theme::TEAL),
                    ),
                ]));
            }
            Some(ImageState::Failed(msg)) => {
                lines.push(Line::from(Span::styled(
                    format!("  Images unavailable ({msg})"),
                    Style::default().fg(theme::SIGNAL_RED),
                )));
            }
            None | Some(ImageState::Pending | ImageState::Fetching) => {
                lines.push(Line::from(Span::styled(
                    "  Images: fetching...",
                    Style::default().fg(theme::SLATE),
                )));
            }
        }

        lines.push(Line::raw(""));
        match entry.description.as_deref() {
            Some(description) => {
                lines.push(Line::from(Span::styled(
                    format!("  {description}"),
                    Style::default().fg(theme::FOG),
                )));
            }
            None => {
                lines.push(Line::from(Span::styled(
                    "  Analysis pending.",
                    Style::default().fg(theme::SLATE),
                )));
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn render_busy(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label("  Loading history...")
            .style(Style::default().fg(theme::TEAL))
            .throbber_style(Style::default().fg(theme::AMBER));

        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                "  Could not load history",
                Style::default().fg(theme::SIGNAL_RED),
            )),
        ];
        if let Some(ref err) = self.load_error {
            lines.push(Line::from(Span::styled(
                format!("  {err}"),
                Style::default().fg(theme::FOG),
            )));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("  r ", theme::key_hint_key()),
            Span::styled("retry", theme::key_hint()),
        ]));
        frame.render_widget(Paragraph::new(lines), area);
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for HistoryScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.state {
            HistoryState::Loading => return Ok(None),
            HistoryState::Failed => {
                if key.code == KeyCode::Char('r') {
                    self.reload();
                }
                return Ok(None);
            }
            HistoryState::Ready => {}
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') => {
                self.selected = 0;
                self.ensure_visible();
            }
            KeyCode::Char('G') => {
                self.selected = self.entries.len().saturating_sub(1);
                self.ensure_visible();
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
            }
            KeyCode::Enter => {
                if !self.entries.is_empty() {
                    self.detail_open = !self.detail_open;
                }
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::HistoryLoaded(result) => match result {
                Ok(entries) => {
                    self.entries.clone_from(entries);
                    self.state = HistoryState::Ready;
                    self.selected = self.selected.min(self.entries.len().saturating_sub(1));
                    self.offset = self.offset.min(self.selected);
                    // Forget image state for entries that no longer exist
                    let ids: HashSet<Uuid> = self.entries.iter().map(|e| e.id).collect();
                    self.images.retain(|id, _| ids.contains(id));
                }
                Err(msg) => {
                    self.load_error = Some(msg.clone());
                    self.state = HistoryState::Failed;
                }
            },
            Action::EntryImagesLoaded { id, result } => {
                let state = match result {
                    Ok(images) => ImageState::Ready(images.clone()),
                    Err(msg) => ImageState::Failed(msg.clone()),
                };
                self.images.insert(*id, state);
            }
            Action::SessionReady { .. } => {
                self.entries.clear();
                self.images.clear();
                self.selected = 0;
                self.offset = 0;
                self.detail_open = false;
                self.state = HistoryState::Loading;
            }
            Action::Tick => {
                if self.state == HistoryState::Loading {
                    self.throbber_state.calc_next();
                }
                if self.state == HistoryState::Ready {
                    let requests = self.visible_requests();
                    if let Some(tx) = &self.action_tx {
                        for request in requests {
                            let _ = tx.send(request);
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" History ({}) ", self.entries.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (list_area, detail_area) = if self.detail_open && !self.entries.is_empty() {
            let chunks = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(inner);
            (chunks[0], Some(chunks[1]))
        } else {
            (inner, None)
        };

        let layout = Layout::vertical([
            Constraint::Min(1),    // list
            Constraint::Length(1), // hints
        ])
        .split(list_area);

        match self.state {
            HistoryState::Loading => self.render_busy(frame, layout[0]),
            HistoryState::Failed => self.render_failed(frame, layout[0]),
            HistoryState::Ready => self.render_list(frame, layout[0]),
        }

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled(
                if self.detail_open { "close  " } else { "detail  " },
                theme::key_hint(),
            ),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[1]);

        if let Some(detail_area) = detail_area {
            if let Some(entry) = self.entries.get(self.selected) {
                self.render_detail(frame, detail_area, entry);
            }
        }
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "history"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(n: u8) -> AnalysisEntry {
        AnalysisEntry {
            id: Uuid::from_u128(u128::from(n)),
            image1: format!("/media/images/{n}-before.jpg"),
            image2: format!("/media/images/{n}-after.jpg"),
            model_used: "gpt-4o-mini".into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn loaded_screen(count: u8, viewport: u16) -> HistoryScreen {
        let mut screen = HistoryScreen::new();
        screen.entries = (0..count).map(entry).collect();
        screen.state = HistoryState::Ready;
        screen.viewport_rows.set(viewport);
        screen
    }

    #[test]
    fn visible_rows_request_images_exactly_once() {
        let mut screen = loaded_screen(10, 4);

        let first = screen.visible_requests();
        assert_eq!(first.len(), 4);

        // Same rows still visible: nothing new fires
        assert!(screen.visible_requests().is_empty());
    }

    #[test]
    fn rows_outside_the_viewport_are_not_requested() {
        let mut screen = loaded_screen(10, 4);
        let _ = screen.visible_requests();

        // Jump to the bottom: only the newly visible rows fire
        screen.selected = 9;
        screen.ensure_visible();
        let at_bottom = screen.visible_requests();
        assert_eq!(at_bottom.len(), 4);

        // Rows 4 and 5 were skipped over and never became visible
        assert!(!screen.images.contains_key(&Uuid::from_u128(4)));
        assert!(!screen.images.contains_key(&Uuid::from_u128(5)));
    }

    #[test]
    fn scrolling_back_does_not_refire() {
        let mut screen = loaded_screen(10, 4);
        let _ = screen.visible_requests();

        screen.selected = 9;
        screen.ensure_visible();
        let _ = screen.visible_requests();

        screen.selected = 0;
        screen.ensure_visible();
        assert!(screen.visible_requests().is_empty());
    }

    #[test]
    fn failed_downloads_park_and_are_not_retried() {
        let mut screen = loaded_screen(3, 3);
        assert_eq!(screen.visible_requests().len(), 3);

        let id = screen.entries[0].id;
        screen
            .update(&Action::EntryImagesLoaded {
                id,
                result: Err("HTTP 500".into()),
            })
            .unwrap();

        // No retry, and the entry itself stays listed
        assert!(screen.visible_requests().is_empty());
        assert_eq!(screen.entries.len(), 3);
    }
}
