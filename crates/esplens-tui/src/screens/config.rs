//! Config screen — view and edit capture configuration.
//!
//! One form serves both targets: the account-wide device config and the
//! per-key overrides reached from the keys screen. The scope in use is
//! part of the title, and late responses for a different scope are
//! dropped rather than applied.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use esplens_api::{ConfigScope, DeviceConfig, DeviceConfigPatch, ModelInfo};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// How long a save outcome stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ── Types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigState {
    Loading,
    Ready,
    Saving,
    Failed,
}

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigField {
    Flash,
    Delay,
    Model,
    Context,
}

impl ConfigField {
    /// All fields in navigation order.
    const ALL: [ConfigField; 4] = [Self::Flash, Self::Delay, Self::Model, Self::Context];
}

// ── Component ────────────────────────────────────────────────────────

pub struct ConfigScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    scope: ConfigScope,
    state: ConfigState,
    active_field: ConfigField,
    // Form data
    flash_enabled: bool,
    delay_input: String,
    models: Vec<ModelInfo>,
    model_index: usize,
    context_input: String,
    // Text-edit mode for Delay/Context
    editing_text: bool,
    pre_edit: String,
    // Last loaded server state, for the updated-at line
    loaded: Option<DeviceConfig>,
    load_error: Option<String>,
    // Transient save status: message, is_error, when it was set
    status: Option<(String, bool, Instant)>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl ConfigScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            scope: ConfigScope::Device,
            state: ConfigState::Loading,
            active_field: ConfigField::Flash,
            flash_enabled: false,
            delay_input: String::new(),
            models: Vec::new(),
            model_index: 0,
            context_input: String::new(),
            editing_text: false,
            pre_edit: String::new(),
            loaded: None,
            load_error: None,
            status: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    // ── Field navigation ─────────────────────────────────────────────

    fn focus_next(&mut self) {
        let pos = ConfigField::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.active_field = ConfigField::ALL[(pos + 1) % ConfigField::ALL.len()];
    }

    fn focus_prev(&mut self) {
        let pos = ConfigField::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.active_field =
            ConfigField::ALL[(pos + ConfigField::ALL.len() - 1) % ConfigField::ALL.len()];
    }

    fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.active_field {
            ConfigField::Delay => Some(&mut self.delay_input),
            ConfigField::Context => Some(&mut self.context_input),
            ConfigField::Flash | ConfigField::Model => None,
        }
    }

    fn begin_edit(&mut self) {
        let current = match self.active_field {
            ConfigField::Delay => self.delay_input.clone(),
            ConfigField::Context => self.context_input.clone(),
            ConfigField::Flash | ConfigField::Model => return,
        };
        self.pre_edit = current;
        self.editing_text = true;
    }

    fn commit_edit(&mut self) {
        self.editing_text = false;
    }

    fn cancel_edit(&mut self) {
        let pre_edit = self.pre_edit.clone();
        if let Some(input) = self.active_input_mut() {
            *input = pre_edit;
        }
        self.editing_text = false;
    }

    fn cycle_model(&mut self, forward: bool) {
        if self.models.is_empty() {
            return;
        }
        let len = self.models.len();
        self.model_index = if forward {
            (self.model_index + 1) % len
        } else {
            (self.model_index + len - 1) % len
        };
    }

    // ── Load & save ──────────────────────────────────────────────────

    fn populate(&mut self, config: &DeviceConfig) {
        self.flash_enabled = config.flash_enabled;
        self.delay_input = config.delay_seconds.to_string();
        self.model_index = self
            .models
            .iter()
            .position(|m| m.name == config.default_model)
            .unwrap_or(0);
        self.context_input.clone_from(&config.prompt_context);
        self.loaded = Some(config.clone());
    }

    fn reload(&mut self) {
        self.state = ConfigState::Loading;
        self.load_error = None;
        self.status = None;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::RequestConfig(self.scope.clone()));
        }
    }

    fn validate(&self) -> std::result::Result<u32, String> {
        match self.delay_input.trim().parse::<u32>() {
            Ok(delay) if delay >= 1 => Ok(delay),
            _ => Err("Delay must be a positive number of seconds".into()),
        }
    }

    /// Submit the whole form. Every field is sent, so the current state of
    /// the flash toggle always wins over whatever the server last saw.
    fn submit(&mut self) {
        let delay = match self.validate() {
            Ok(delay) => delay,
            Err(msg) => {
                self.status = Some((msg, true, Instant::now()));
                return;
            }
        };
        let patch = DeviceConfigPatch {
            flash_enabled: Some(self.flash_enabled),
            delay_seconds: Some(delay),
            default_model: self.models.get(self.model_index).map(|m| m.name.clone()),
            prompt_context: Some(self.context_input.clone()),
        };
        self.state = ConfigState::Saving;
        self.status = None;
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::SubmitConfig {
                scope: self.scope.clone(),
                patch,
            });
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_input_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        active: bool,
    ) {
        if area.height < 3 {
            return;
        }

        let label_style = if active {
            Style::default().fg(theme::TEAL)
        } else {
            Style::default().fg(theme::FOG)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let border_color = if active { theme::AMBER } else { theme::SLATE };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let block_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
        let inner = block.inner(block_area);
        frame.render_widget(block, block_area);

        let text = if active && self.editing_text {
            format!("{value}\u{2588}")
        } else {
            value.to_string()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme::TEAL))),
            inner,
        );
    }

    fn render_model_selector(&self, frame: &mut Frame, area: Rect) {
        if area.height < 3 {
            return;
        }

        let active = self.active_field == ConfigField::Model;
        let label_style = if active {
            Style::default().fg(theme::TEAL)
        } else {
            Style::default().fg(theme::FOG)
        };
        frame.render_widget(
            Paragraph::new(Span::styled("  Analysis model", label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let border_color = if active { theme::AMBER } else { theme::SLATE };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let block_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
        let inner = block.inner(block_area);
        frame.render_widget(block, block_area);

        let arrow_style = if active {
            Style::default().fg(theme::AMBER)
        } else {
            Style::default().fg(theme::SLATE)
        };
        let value_style = if active {
            Style::default().fg(theme::TEAL).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::FOG)
        };
        let name = self
            .models
            .get(self.model_index)
            .map_or("(no models)", |m| m.name.as_str());
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" \u{25C2} ", arrow_style),
                Span::styled(name, value_style),
                Span::styled(" \u{25B8}", arrow_style),
            ])),
            inner,
        );
    }

    #[allow(clippy::unused_self)]
    fn render_toggle(&self, frame: &mut Frame, area: Rect, label: &str, value: bool, active: bool) {
        if area.height < 1 {
            return;
        }
        let marker = if value { "[\u{2713}]" } else { "[ ]" };
        let marker_style = if active {
            Style::default().fg(theme::AMBER)
        } else if value {
            Style::default().fg(theme::SPRING_GREEN)
        } else {
            Style::default().fg(theme::SLATE)
        };
        let label_style = if active {
            Style::default().fg(theme::TEAL)
        } else {
            Style::default().fg(theme::FOG)
        };

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("  {marker} "), marker_style),
                Span::styled(label, label_style),
            ])),
            area,
        );
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let fields_area = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height);
        let chunks = Layout::vertical([
            Constraint::Length(1), // flash toggle
            Constraint::Length(1), // spacer
            Constraint::Length(4), // delay
            Constraint::Length(4), // model selector
            Constraint::Length(1), // model description
            Constraint::Length(4), // prompt context
            Constraint::Length(1), // updated-at
            Constraint::Min(0),
        ])
        .split(fields_area);

        self.render_toggle(
            frame,
            chunks[0],
            "Flash LED during capture",
            self.flash_enabled,
            self.active_field == ConfigField::Flash,
        );

        self.render_input_field(
            frame,
            chunks[2],
            "  Capture delay (seconds)",
            &self.delay_input,
            self.active_field == ConfigField::Delay,
        );

        self.render_model_selector(frame, chunks[3]);

        if let Some(model) = self.models.get(self.model_index) {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("    {}", model.description),
                    Style::default().fg(theme::SLATE),
                )),
                chunks[4],
            );
        }

        self.render_input_field(
            frame,
            chunks[5],
            "  Prompt context",
            &self.context_input,
            self.active_field == ConfigField::Context,
        );

        if let Some(updated_at) = self.loaded.as_ref().and_then(|c| c.updated_at) {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  Updated {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
                    Style::default().fg(theme::SLATE),
                )),
                chunks[6],
            );
        }
    }

    fn render_busy(&self, frame: &mut Frame, area: Rect, label: &'static str) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label(label)
            .style(Style::default().fg(theme::TEAL))
            .throbber_style(Style::default().fg(theme::AMBER));

        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                "  Could not load configuration",
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

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some((ref msg, is_error, _)) = self.status {
            let (text, color) = if is_error {
                (format!("  \u{2717} {msg}"), theme::SIGNAL_RED)
            } else {
                (format!("  \u{2713} {msg}"), theme::SPRING_GREEN)
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, Style::default().fg(color))),
                area,
            );
        }
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let hints: Vec<Span> = if self.editing_text {
            vec![
                Span::styled("  Enter ", theme::key_hint_key()),
                Span::styled("done  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("cancel edit", theme::key_hint()),
            ]
        } else {
            match self.active_field {
                ConfigField::Flash => vec![
                    Span::styled("  j/k ", theme::key_hint_key()),
                    Span::styled("field  ", theme::key_hint()),
                    Span::styled("Space ", theme::key_hint_key()),
                    Span::styled("toggle  ", theme::key_hint()),
                    Span::styled("s ", theme::key_hint_key()),
                    Span::styled("save  ", theme::key_hint()),
                    Span::styled("r ", theme::key_hint_key()),
                    Span::styled("reload", theme::key_hint()),
                ],
                ConfigField::Model => vec![
                    Span::styled("  j/k ", theme::key_hint_key()),
                    Span::styled("field  ", theme::key_hint()),
                    Span::styled("\u{25C2}/\u{25B8} ", theme::key_hint_key()),
                    Span::styled("model  ", theme::key_hint()),
                    Span::styled("s ", theme::key_hint_key()),
                    Span::styled("save  ", theme::key_hint()),
                    Span::styled("r ", theme::key_hint_key()),
                    Span::styled("reload", theme::key_hint()),
                ],
                ConfigField::Delay | ConfigField::Context => vec![
                    Span::styled("  j/k ", theme::key_hint_key()),
                    Span::styled("field  ", theme::key_hint()),
                    Span::styled("Enter ", theme::key_hint_key()),
                    Span::styled("edit  ", theme::key_hint()),
                    Span::styled("s ", theme::key_hint_key()),
                    Span::styled("save  ", theme::key_hint()),
                    Span::styled("r ", theme::key_hint_key()),
                    Span::styled("reload", theme::key_hint()),
                ],
            }
        };
        frame.render_widget(Paragraph::new(Line::from(hints)), area);
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for ConfigScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Text-edit mode owns the keyboard
        if self.editing_text {
            match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Tab => {
                    self.commit_edit();
                    self.focus_next();
                }
                KeyCode::Backspace => {
                    if let Some(input) = self.active_input_mut() {
                        input.pop();
                    }
                }
                KeyCode::Char(c) => {
                    let numeric = self.active_field == ConfigField::Delay;
                    if let Some(input) = self.active_input_mut() {
                        if !numeric || c.is_ascii_digit() {
                            input.push(c);
                        }
                    }
                }
                _ => {}
            }
            return Ok(None);
        }

        match self.state {
            ConfigState::Loading | ConfigState::Saving => return Ok(None),
            ConfigState::Failed => {
                if key.code == KeyCode::Char('r') {
                    self.reload();
                }
                return Ok(None);
            }
            ConfigState::Ready => {}
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.focus_next(),
            KeyCode::Char('k') | KeyCode::Up => self.focus_prev(),
            KeyCode::Char(' ') if self.active_field == ConfigField::Flash => {
                self.flash_enabled = !self.flash_enabled;
            }
            KeyCode::Char('h') | KeyCode::Left if self.active_field == ConfigField::Model => {
                self.cycle_model(false);
            }
            KeyCode::Char('l') | KeyCode::Right if self.active_field == ConfigField::Model => {
                self.cycle_model(true);
            }
            KeyCode::Enter => match self.active_field {
                ConfigField::Flash => self.flash_enabled = !self.flash_enabled,
                ConfigField::Model => self.cycle_model(true),
                ConfigField::Delay | ConfigField::Context => self.begin_edit(),
            },
            KeyCode::Char('s') => self.submit(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ShowConfig(scope) => {
                self.scope = scope.clone();
                self.active_field = ConfigField::Flash;
                self.editing_text = false;
                self.reload();
            }
            Action::ConfigLoaded { scope, result } => {
                // A late response for another scope must not clobber this one
                if *scope != self.scope {
                    return Ok(None);
                }
                match result {
                    Ok((config, models)) => {
                        self.models.clone_from(models);
                        self.populate(config);
                        self.state = ConfigState::Ready;
                    }
                    Err(msg) => {
                        self.load_error = Some(msg.clone());
                        self.state = ConfigState::Failed;
                    }
                }
            }
            Action::ConfigSaved { scope, result } => {
                if *scope != self.scope {
                    return Ok(None);
                }
                match result {
                    Ok(config) => {
                        // The server's answer is authoritative
                        self.populate(config);
                        self.state = ConfigState::Ready;
                        self.status = Some(("Saved".into(), false, Instant::now()));
                    }
                    Err(msg) => {
                        self.state = ConfigState::Ready;
                        self.status = Some((msg.clone(), true, Instant::now()));
                    }
                }
            }
            Action::Tick => {
                if matches!(self.state, ConfigState::Loading | ConfigState::Saving) {
                    self.throbber_state.calc_next();
                }
                if let Some((_, _, set_at)) = self.status {
                    if set_at.elapsed() >= STATUS_TTL {
                        self.status = None;
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Capture Config ({}) ", self.scope);
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
            Constraint::Min(1),    // form / busy / failed
            Constraint::Length(1), // status
            Constraint::Length(1), // hints
        ])
        .split(inner);

        match self.state {
            ConfigState::Loading => self.render_busy(frame, layout[0], "  Loading..."),
            ConfigState::Saving => self.render_busy(frame, layout[0], "  Saving..."),
            ConfigState::Failed => self.render_failed(frame, layout[0]),
            ConfigState::Ready => self.render_form(frame, layout[0]),
        }

        self.render_status(frame, layout[1]);
        if self.state == ConfigState::Ready {
            self.render_hints(frame, layout[2]);
        }
    }

    fn capturing_input(&self) -> bool {
        self.editing_text
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "config"
    }
}
