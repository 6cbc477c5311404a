//! Login screen — establish the dashboard session from within the TUI.
//!
//! Shown at startup when no stored credentials work, and again whenever
//! the server rejects a request as unauthenticated. Not in the tab bar.

use std::cell::Cell;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

// ── Types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginState {
    Editing,
    Submitting,
}

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Username,
    Password,
}

// ── Component ────────────────────────────────────────────────────────

pub struct LoginScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    state: LoginState,
    active_field: LoginField,
    // Form data
    username_input: String,
    password_input: String,
    show_password: bool,
    // Where we are signing in to, for display only
    server: String,
    error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
    // Last full-screen area, for mouse hit-testing
    last_area: Cell<Rect>,
}

impl LoginScreen {
    /// Create the login form. `username` pre-fills the first field when the
    /// profile names an account.
    pub fn new(server: String, username: Option<String>) -> Self {
        Self {
            focused: false,
            action_tx: None,
            state: LoginState::Editing,
            active_field: LoginField::Username,
            username_input: username.unwrap_or_default(),
            password_input: String::new(),
            show_password: false,
            server,
            error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
            last_area: Cell::new(Rect::default()),
        }
    }

    fn focus_next(&mut self) {
        self.active_field = match self.active_field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    fn active_input_mut(&mut self) -> &mut String {
        match self.active_field {
            LoginField::Username => &mut self.username_input,
            LoginField::Password => &mut self.password_input,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.username_input.trim().is_empty() {
            return Err("Username cannot be empty".into());
        }
        if self.password_input.is_empty() {
            return Err("Password cannot be empty".into());
        }
        Ok(())
    }

    fn submit(&mut self) {
        if let Err(msg) = self.validate() {
            self.error = Some(msg);
            return;
        }
        self.state = LoginState::Submitting;
        self.error = None;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::SubmitLogin {
                username: self.username_input.trim().to_string(),
                password: SecretString::from(self.password_input.clone()),
            });
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn panel_rect(area: Rect) -> Rect {
        let panel_w = 56u16.min(area.width.saturating_sub(4));
        let panel_h = 17u16.min(area.height.saturating_sub(2));
        let x = (area.width.saturating_sub(panel_w)) / 2;
        let y = (area.height.saturating_sub(panel_h)) / 2;
        Rect::new(area.x + x, area.y + y, panel_w, panel_h)
    }

    fn render_centered_panel(frame: &mut Frame, area: Rect) -> Rect {
        let panel = Self::panel_rect(area);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            panel,
        );

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    "Sign In",
                    Style::default()
                        .fg(theme::TEAL)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::AMBER));

        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        inner
    }

    #[allow(clippy::unused_self)]
    fn render_input_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        active: bool,
        masked: bool,
    ) {
        if area.height < 3 {
            return;
        }

        let label_area = Rect::new(area.x, area.y, area.width, 1);
        let label_style = if active {
            Style::default().fg(theme::TEAL)
        } else {
            Style::default().fg(theme::FOG)
        };
        frame.render_widget(Paragraph::new(Span::styled(label, label_style)), label_area);

        let display = if masked && !value.is_empty() {
            "\u{25CF}".repeat(value.len())
        } else {
            value.to_string()
        };

        let border_color = if active { theme::AMBER } else { theme::SLATE };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let block_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
        let inner = block.inner(block_area);
        frame.render_widget(block, block_area);

        let text = if active {
            format!("{display}\u{2588}")
        } else {
            display
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme::TEAL))),
            inner,
        );
    }

    fn render_editing(&self, frame: &mut Frame, area: Rect) {
        let fields_area = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height);
        let chunks = Layout::vertical([
            Constraint::Length(1), // server line
            Constraint::Length(1), // spacer
            Constraint::Length(4), // username
            Constraint::Length(4), // password
            Constraint::Min(0),
        ])
        .split(fields_area);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Server  ", Style::default().fg(theme::FOG)),
                Span::styled(self.server.as_str(), Style::default().fg(theme::SAND)),
            ])),
            chunks[0],
        );

        self.render_input_field(
            frame,
            chunks[2],
            "  Username",
            &self.username_input,
            self.active_field == LoginField::Username,
            false,
        );
        self.render_input_field(
            frame,
            chunks[3],
            "  Password",
            &self.password_input,
            self.active_field == LoginField::Password,
            !self.show_password,
        );
    }

    fn render_submitting(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label("  Signing in...")
            .style(Style::default().fg(theme::TEAL))
            .throbber_style(Style::default().fg(theme::AMBER));

        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("  Connecting to {}", self.server),
                Style::default().fg(theme::SLATE),
            )),
            layout[2],
        );
    }

    fn render_key_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = match self.state {
            LoginState::Editing => {
                if self.active_field == LoginField::Password {
                    "Ctrl+U reveal  Tab next  Enter sign in  Ctrl+C quit"
                } else {
                    "Tab next  Enter sign in  Ctrl+C quit"
                }
            }
            LoginState::Submitting => "Esc cancel",
        };

        frame.render_widget(
            Paragraph::new(Span::styled(hints, theme::key_hint())).alignment(Alignment::Center),
            area,
        );
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for LoginScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.state {
            LoginState::Submitting => {
                if key.code == KeyCode::Esc {
                    self.state = LoginState::Editing;
                }
                return Ok(None);
            }
            LoginState::Editing => {}
        }

        // Clear the error on any input
        self.error = None;

        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => self.focus_next(),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.active_input_mut().pop();
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && c == 'u' {
                    self.show_password = !self.show_password;
                } else {
                    self.active_input_mut().push(c);
                }
            }
            _ => {}
        }

        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.state != LoginState::Editing {
            return Ok(None);
        }

        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let area = self.last_area.get();
            if area.width == 0 {
                return Ok(None);
            }
            let panel = Self::panel_rect(area);

            // border + spacer + server line + spacer
            let mut y = panel.y + 1 + 1 + 2;
            for field in [LoginField::Username, LoginField::Password] {
                if mouse.row >= y && mouse.row < y + 4 {
                    self.active_field = field;
                    break;
                }
                y += 4;
            }
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            // Covers stored-credential sign-in, where no key was typed here
            Action::SubmitLogin { username, .. } => {
                self.username_input.clone_from(username);
                self.state = LoginState::Submitting;
                self.error = None;
            }
            Action::LoginFailed(msg) => {
                self.state = LoginState::Editing;
                self.error = Some(msg.clone());
            }
            Action::SessionExpired => {
                self.state = LoginState::Editing;
                self.password_input.clear();
                self.error = Some("Session expired. Sign in again.".into());
            }
            Action::SessionReady { .. } => {
                self.state = LoginState::Editing;
                self.password_input.clear();
                self.error = None;
            }
            Action::Tick => {
                if self.state == LoginState::Submitting {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.last_area.set(area);

        // Full-screen dark background
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            area,
        );

        let inner = Self::render_centered_panel(frame, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // spacer
            Constraint::Min(1),    // content
            Constraint::Length(1), // error
            Constraint::Length(1), // hints
        ])
        .split(inner);

        if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err, Style::default().fg(theme::SIGNAL_RED)))
                    .alignment(Alignment::Center),
                layout[2],
            );
        }

        self.render_key_hints(frame, layout[3]);

        match self.state {
            LoginState::Editing => self.render_editing(frame, layout[1]),
            LoginState::Submitting => self.render_submitting(frame, layout[1]),
        }
    }

    fn capturing_input(&self) -> bool {
        true
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn id(&self) -> &'static str {
        "login"
    }
}
