//! Keys screen — manage device API keys.
//!
//! Lists prefix, name, and creation time; the secret itself exists only in
//! the one-time panel shown right after creation. Revocation goes through
//! the app's confirm dialog and always names the key prefix.

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use esplens_api::{ApiKey, ConfigScope, CreatedApiKey, DEFAULT_KEY_NAME};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeysState {
    Loading,
    Ready,
    Failed,
}

pub struct KeysScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    state: KeysState,
    keys: Vec<ApiKey>,
    table_state: TableState,
    /// `Some` while the inline create form is open.
    name_input: Option<String>,
    /// The one-time secret panel, shown until dismissed.
    created: Option<CreatedApiKey>,
    load_error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl KeysScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            state: KeysState::Loading,
            keys: Vec::new(),
            table_state: TableState::default(),
            name_input: None,
            created: None,
            load_error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        let clamped = if self.keys.is_empty() {
            0
        } else {
            idx.min(self.keys.len() - 1)
        };
        self.table_state.select(Some(clamped));
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        if self.keys.is_empty() {
            return;
        }
        let current = self.selected_index() as isize;
        let next = (current + delta).clamp(0, self.keys.len() as isize - 1);
        self.select(next as usize);
    }

    fn selected_key(&self) -> Option<&ApiKey> {
        self.keys.get(self.selected_index())
    }

    fn reload(&mut self) {
        self.state = KeysState::Loading;
        self.load_error = None;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::RequestKeys);
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_create_input(&self, frame: &mut Frame, area: Rect, input: &str) {
        if area.height < 4 {
            return;
        }
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("  Name for the new key (blank for {DEFAULT_KEY_NAME})"),
                Style::default().fg(theme::TEAL),
            )),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::AMBER));
        let block_area = Rect::new(area.x + 1, area.y + 1, area.width.saturating_sub(2), 3);
        let inner = block.inner(block_area);
        frame.render_widget(block, block_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{input}\u{2588}"),
                Style::default().fg(theme::TEAL),
            )),
            inner,
        );
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        if self.keys.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  No API keys yet. Press n to create one.",
                    Style::default().fg(theme::SLATE),
                )),
                area,
            );
            return;
        }

        let header = Row::new(vec![
            Cell::from("  Prefix").style(theme::table_header()),
            Cell::from("Name").style(theme::table_header()),
            Cell::from("Created").style(theme::table_header()),
        ]);

        let selected_idx = self.selected_index();
        let rows: Vec<Row> = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let marker = if i == selected_idx { "\u{25B8}" } else { " " };
                let style = if i == selected_idx {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                let created = key
                    .created
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string();
                Row::new(vec![
                    Cell::from(format!("{marker} {}", key.prefix)),
                    Cell::from(key.name.clone()),
                    Cell::from(created),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(18),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(Style::default().bg(theme::BG_PANEL));

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_busy(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label("  Loading keys...")
            .style(Style::default().fg(theme::TEAL))
            .throbber_style(Style::default().fg(theme::AMBER));

        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                "  Could not load API keys",
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

    #[allow(clippy::unused_self)]
    fn render_secret_panel(&self, frame: &mut Frame, area: Rect, created: &CreatedApiKey) {
        let panel_w = 64u16.min(area.width.saturating_sub(4));
        let panel_h = 12u16.min(area.height.saturating_sub(2));
        let x = (area.width.saturating_sub(panel_w)) / 2;
        let y = (area.height.saturating_sub(panel_h)) / 2;
        let panel = Rect::new(area.x + x, area.y + y, panel_w, panel_h);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            panel,
        );

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    "New API Key",
                    Style::default()
                        .fg(theme::SPRING_GREEN)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::SPRING_GREEN));

        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::styled("  Name    ", Style::default().fg(theme::FOG)),
                Span::styled(created.name.clone(), Style::default().fg(theme::TEAL)),
            ]),
            Line::from(vec![
                Span::styled("  Prefix  ", Style::default().fg(theme::FOG)),
                Span::styled(created.prefix.clone(), Style::default().fg(theme::TEAL)),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::styled("  Key     ", Style::default().fg(theme::FOG)),
                Span::styled(
                    created.key.clone(),
                    Style::default()
                        .fg(theme::SAND)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::raw(""),
            Line::from(Span::styled(
                "  Store the key now; the server keeps only a hash",
                Style::default().fg(theme::SIGNAL_RED),
            )),
            Line::from(Span::styled(
                "  and cannot show it again.",
                Style::default().fg(theme::SIGNAL_RED),
            )),
            Line::raw(""),
            Line::from(vec![
                Span::styled("  Enter/Esc ", theme::key_hint_key()),
                Span::styled("dismiss", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for KeysScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // One-time secret panel: dismiss only
        if self.created.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.created = None;
            }
            return Ok(None);
        }

        // Inline create form
        if let Some(ref mut input) = self.name_input {
            match key.code {
                KeyCode::Enter => {
                    let name = input.clone();
                    self.name_input = None;
                    return Ok(Some(Action::RequestCreateKey(name)));
                }
                KeyCode::Esc => {
                    self.name_input = None;
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => {
                    input.push(c);
                }
                _ => {}
            }
            return Ok(None);
        }

        match self.state {
            KeysState::Loading => return Ok(None),
            KeysState::Failed => {
                if key.code == KeyCode::Char('r') {
                    self.reload();
                }
                return Ok(None);
            }
            KeysState::Ready => {}
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('g') => {
                self.select(0);
                Ok(None)
            }
            KeyCode::Char('G') => {
                self.select(self.keys.len().saturating_sub(1));
                Ok(None)
            }
            KeyCode::Char('n') => {
                self.name_input = Some(String::new());
                Ok(None)
            }
            KeyCode::Char('d') => Ok(self.selected_key().map(|key| Action::RequestDeleteKey {
                prefix: key.prefix.clone(),
                name: key.name.clone(),
            })),
            KeyCode::Char('c') => Ok(self
                .selected_key()
                .map(|key| Action::ShowConfig(ConfigScope::Key(key.prefix.clone())))),
            KeyCode::Char('r') => {
                self.reload();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::KeysLoaded(result) => match result {
                Ok(keys) => {
                    self.keys.clone_from(keys);
                    self.state = KeysState::Ready;
                    self.select(self.selected_index());
                }
                Err(msg) => {
                    self.load_error = Some(msg.clone());
                    self.state = KeysState::Failed;
                }
            },
            Action::KeyCreated(Ok(created)) => {
                self.keys.push(ApiKey {
                    prefix: created.prefix.clone(),
                    name: created.name.clone(),
                    created: created.created,
                });
                self.select(self.keys.len() - 1);
                self.created = Some(created.clone());
            }
            Action::KeyDeleted {
                prefix,
                result: Ok(()),
            } => {
                self.keys.retain(|key| key.prefix != *prefix);
                self.select(self.selected_index());
            }
            Action::SessionReady { .. } => {
                self.keys.clear();
                self.state = KeysState::Loading;
                self.name_input = None;
                self.created = None;
            }
            Action::Tick => {
                if self.state == KeysState::Loading {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" API Keys ({}) ", self.keys.len());
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

        let has_form = self.name_input.is_some();
        let layout = Layout::vertical([
            Constraint::Length(if has_form { 5 } else { 0 }),
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(inner);

        if let Some(ref input) = self.name_input {
            self.render_create_input(frame, layout[0], input);
        }

        match self.state {
            KeysState::Loading => self.render_busy(frame, layout[1]),
            KeysState::Failed => self.render_failed(frame, layout[1]),
            KeysState::Ready => self.render_table(frame, layout[1]),
        }

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("new  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("revoke  ", theme::key_hint()),
            Span::styled("c ", theme::key_hint_key()),
            Span::styled("config  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);

        if let Some(ref created) = self.created {
            self.render_secret_panel(frame, inner, created);
        }
    }

    fn capturing_input(&self) -> bool {
        self.name_input.is_some() || self.created.is_some()
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "keys"
    }
}
