//! Logs screen — the live device log stream.
//!
//! Lines arrive over the WebSocket bridge and accumulate here. The stream
//! never reconnects on its own: when it drops, a notice line says so and
//! `r` opens a fresh connection.

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// One row in the log panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// A device log line from the stream.
    Message,
    /// A synthetic marker the TUI inserted (connected, closed).
    Notice,
}

#[derive(Debug, Clone)]
struct LogLine {
    at: DateTime<Local>,
    kind: LineKind,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Connecting,
    Live,
    Closed,
}

pub struct LogsScreen {
    focused: bool,
    lines: Vec<LogLine>,
    state: StreamState,
    paused: bool,
    scroll_offset: usize,
    /// Max lines to keep in memory.
    capacity: usize,
}

impl LogsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            lines: Vec::new(),
            state: StreamState::Connecting,
            paused: false,
            scroll_offset: 0,
            capacity: 10_000,
        }
    }

    fn push(&mut self, kind: LineKind, text: String) {
        self.lines.push(LogLine {
            at: Local::now(),
            kind,
            text,
        });
        if self.lines.len() > self.capacity {
            self.lines.remove(0);
        }
    }

    fn push_message(&mut self, at: DateTime<Local>, text: String) {
        self.lines.push(LogLine {
            at,
            kind: LineKind::Message,
            text,
        });
        if self.lines.len() > self.capacity {
            self.lines.remove(0);
        }
    }
}

impl Component for LogsScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char(' ') => {
                self.paused = !self.paused;
                if !self.paused {
                    // Resume: snap to bottom
                    self.scroll_offset = 0;
                }
                Ok(None)
            }
            KeyCode::Char('r') if self.state == StreamState::Closed => {
                self.state = StreamState::Connecting;
                Ok(Some(Action::ReconnectLogs))
            }
            KeyCode::Char('j') | KeyCode::Down if self.paused => {
                if self.scroll_offset > 0 {
                    self.scroll_offset -= 1;
                }
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up if self.paused => {
                self.scroll_offset =
                    (self.scroll_offset + 1).min(self.lines.len().saturating_sub(1));
                Ok(None)
            }
            KeyCode::Char('g') if self.paused => {
                self.scroll_offset = self.lines.len().saturating_sub(1);
                Ok(None)
            }
            KeyCode::Char('G') if self.paused => {
                self.scroll_offset = 0;
                Ok(None)
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) && self.paused => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                Ok(None)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) && self.paused => {
                self.scroll_offset =
                    (self.scroll_offset + 10).min(self.lines.len().saturating_sub(1));
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LogsConnected => {
                self.state = StreamState::Live;
                self.push(
                    LineKind::Notice,
                    "--- Connected to live log stream ---".into(),
                );
            }
            Action::LogLine { at, message } => {
                self.push_message(*at, message.clone());
            }
            Action::LogsClosed(reason) => {
                self.state = StreamState::Closed;
                let text = match reason {
                    Some(reason) => {
                        format!("--- Log stream closed ({reason}). Press r to reconnect. ---")
                    }
                    None => "--- Log stream closed. Press r to reconnect. ---".into(),
                };
                self.push(LineKind::Notice, text);
            }
            Action::SessionReady { .. } => {
                // Fresh session, fresh stream
                self.lines.clear();
                self.state = StreamState::Connecting;
                self.paused = false;
                self.scroll_offset = 0;
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let count = self.lines.len();
        let indicator = if self.paused {
            Span::styled("PAUSED", Style::default().fg(theme::SAND))
        } else {
            match self.state {
                StreamState::Connecting => {
                    Span::styled("\u{25CC} connecting", Style::default().fg(theme::SLATE))
                }
                StreamState::Live => {
                    Span::styled("\u{25CF} LIVE", Style::default().fg(theme::SPRING_GREEN))
                }
                StreamState::Closed => {
                    Span::styled("\u{25CB} CLOSED", Style::default().fg(theme::SIGNAL_RED))
                }
            }
        };

        let title = format!(" Live Logs ({count}) ");
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

        let layout = Layout::vertical([
            Constraint::Length(1), // status line
            Constraint::Min(1),    // log lines
            Constraint::Length(1), // hints
        ])
        .split(inner);

        // Status line
        let status = Line::from(vec![Span::raw("  "), indicator]);
        frame.render_widget(Paragraph::new(status), layout[0]);

        // Log lines, newest at the bottom
        let visible_height = layout[1].height as usize;
        let total = self.lines.len();
        let end = total.saturating_sub(self.scroll_offset);
        let start = end.saturating_sub(visible_height);

        let mut rows: Vec<Line> = Vec::new();
        for line in self.lines.get(start..end).unwrap_or_default() {
            let time_str = line.at.format("%H:%M:%S").to_string();
            let msg_width = layout[1].width.saturating_sub(14).max(10) as usize;
            let msg: String = line.text.chars().take(msg_width).collect();
            let msg_style = match line.kind {
                LineKind::Message => Style::default().fg(theme::FOG),
                LineKind::Notice => Style::default().fg(theme::TEAL),
            };
            rows.push(Line::from(vec![
                Span::styled(
                    format!("  {time_str:<10}"),
                    Style::default().fg(theme::SAND),
                ),
                Span::styled(msg, msg_style),
            ]));
        }

        if self.lines.is_empty() {
            rows.push(Line::from(Span::styled(
                "  Waiting for log lines...",
                Style::default().fg(theme::SLATE),
            )));
        }

        // Auto-scroll indicator
        if !self.paused && !self.lines.is_empty() {
            rows.push(Line::from(Span::styled(
                "  ↓ auto-scrolling",
                Style::default().fg(theme::SLATE),
            )));
        }

        frame.render_widget(Paragraph::new(rows), layout[1]);

        // Hints
        let mut hints = vec![
            Span::styled("  Space ", theme::key_hint_key()),
            Span::styled("pause/resume  ", theme::key_hint()),
            Span::styled("j/k ", theme::key_hint_key()),
            Span::styled("scroll (paused)", theme::key_hint()),
        ];
        if self.state == StreamState::Closed {
            hints.push(Span::styled("  r ", theme::key_hint_key()));
            hints.push(Span::styled("reconnect", theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(hints)), layout[2]);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "logs"
    }
}
