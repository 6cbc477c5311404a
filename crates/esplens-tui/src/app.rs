//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use esplens_api::{Client, ConfigScope};

use crate::action::{Action, ConfirmAction, Notification};
use crate::bridge;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::screens::login::LoginScreen;
use crate::theme;
use crate::tui::Tui;

/// Session and log-stream status as shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    SignedOut,
    SigningIn,
    /// Signed in, log stream handshake in flight.
    Connecting,
    /// Signed in with the log stream attached.
    Live,
    /// Signed in but the log stream has closed.
    StreamClosed,
}

/// Top-level application state and event loop.
pub struct App {
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Session status indicator.
    session_status: SessionStatus,
    /// Help overlay visibility.
    help_visible: bool,
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Shared API client. All background tasks clone this handle.
    client: Arc<Client>,
    /// Server name for the status bar.
    server: String,
    /// Where history image pairs are cached.
    image_cache: PathBuf,
    /// Cancellation token for the current log stream task.
    logs_cancel: CancellationToken,
    /// Stored credentials to submit on startup, if the profile has them.
    auto_login: Option<(String, SecretString)>,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    /// Create a new App with all screens. `username` pre-fills the sign-in
    /// form; `auto_login` submits stored credentials before the first frame.
    pub fn new(
        client: Arc<Client>,
        server: String,
        username: Option<String>,
        auto_login: Option<(String, SecretString)>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let mut screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();
        screens.insert(
            ScreenId::Login,
            Box::new(LoginScreen::new(server.clone(), username)),
        );

        Self {
            active_screen: ScreenId::Login,
            previous_screen: None,
            screens,
            running: true,
            session_status: SessionStatus::default(),
            help_visible: false,
            action_tx,
            action_rx,
            client,
            server,
            image_cache: esplens_config::cache_dir(),
            logs_cancel: CancellationToken::new(),
            auto_login,
            pending_confirm: None,
            notification: None,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        // Focus the initial screen
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        if let Some((username, password)) = self.auto_login.take() {
            self.action_tx
                .send(Action::SubmitLogin { username, password })?;
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        // Cancel the log stream and clean up
        self.logs_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Ctrl+C quits from anywhere, even mid-form
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        // A screen in text entry owns the keyboard
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            if screen.capturing_input() {
                return screen.handle_key_event(key);
            }
        }

        // Confirmation dialog captures all input
        if self.pending_confirm.is_some() {
            return match key.code {
                KeyCode::Char('y' | 'Y') => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        if self.help_visible {
            // In help mode, Esc or ? closes help
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            // Quit
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            // Help
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),

            // Screen navigation via number keys
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='4')) => {
                let n = c as u8 - b'0';
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            // Tab / Shift+Tab for screen cycling
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            // Esc — context-dependent back
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

            _ => {}
        }

        // Delegate to active screen component
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Handle mouse events (delegate to active screen).
    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.pending_confirm.is_some() || self.help_visible {
            return Ok(None);
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_mouse_event(mouse);
        }
        Ok(None)
    }

    /// Process a single action — update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Render | Action::Resize(..) => {}

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    self.previous_screen = Some(self.active_screen);
                    self.focus_screen(*target);
                    // Arriving at the config tab always means device scope
                    if *target == ScreenId::Config {
                        self.action_tx.send(Action::ShowConfig(ConfigScope::Device))?;
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            // ── Session ──────────────────────────────────────────────

            Action::SubmitLogin { username, password } => {
                self.session_status = SessionStatus::SigningIn;
                if let Some(screen) = self.screens.get_mut(&ScreenId::Login) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let username = username.clone();
                let password = password.clone();
                tokio::spawn(async move {
                    match client.login(&username, &password).await {
                        Ok(()) => {
                            let _ = tx.send(Action::SessionReady { username });
                        }
                        Err(e) => {
                            let _ = tx.send(Action::LoginFailed(e.to_string()));
                        }
                    }
                });
            }

            Action::SessionReady { username } => {
                info!(%username, "session established");
                self.previous_screen = None;
                self.focus_screen(ScreenId::Logs);
                self.spawn_log_stream();
                self.broadcast(action)?;
                self.action_tx.send(Action::RequestKeys)?;
                self.action_tx.send(Action::RequestHistory)?;
                self.action_tx.send(Action::Notify(Notification::success(format!(
                    "Signed in as {username}"
                ))))?;
            }

            Action::LoginFailed(msg) => {
                warn!(error = %msg, "sign-in failed");
                self.session_status = SessionStatus::SignedOut;
                if let Some(screen) = self.screens.get_mut(&ScreenId::Login) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::SessionExpired => {
                self.logs_cancel.cancel();
                self.session_status = SessionStatus::SignedOut;
                self.pending_confirm = None;
                self.previous_screen = None;
                self.focus_screen(ScreenId::Login);
                self.broadcast(action)?;
            }

            // ── Live log stream ──────────────────────────────────────

            Action::LogsConnected => {
                self.session_status = SessionStatus::Live;
                self.broadcast(action)?;
            }

            Action::LogsClosed(reason) => {
                if let Some(reason) = reason {
                    warn!(%reason, "log stream closed");
                }
                if self.session_status != SessionStatus::SignedOut {
                    self.session_status = SessionStatus::StreamClosed;
                }
                self.broadcast(action)?;
                self.action_tx
                    .send(Action::Notify(Notification::warning("Log stream closed")))?;
            }

            Action::ReconnectLogs => {
                self.spawn_log_stream();
                self.action_tx.send(Action::Notify(Notification::info(
                    "Reconnecting to log stream",
                )))?;
            }

            // ── Capture config ───────────────────────────────────────

            Action::ShowConfig(_) => {
                if self.active_screen != ScreenId::Config {
                    self.previous_screen = Some(self.active_screen);
                    self.focus_screen(ScreenId::Config);
                }
                if let Some(screen) = self.screens.get_mut(&ScreenId::Config) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::RequestConfig(scope) => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let scope = scope.clone();
                tokio::spawn(async move {
                    let (config, models) =
                        tokio::join!(client.config(&scope), client.available_models());
                    let result = config.and_then(|c| models.map(|m| (c, m)));
                    bridge::send_result(&tx, result, |result| Action::ConfigLoaded {
                        scope,
                        result,
                    });
                });
            }

            Action::SubmitConfig { scope, patch } => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let scope = scope.clone();
                let patch = patch.clone();
                tokio::spawn(async move {
                    let result = client.update_config(&scope, &patch).await;
                    bridge::send_result(&tx, result, |result| Action::ConfigSaved {
                        scope,
                        result,
                    });
                });
            }

            // ── API keys ─────────────────────────────────────────────

            Action::RequestKeys => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = client.api_keys().await;
                    bridge::send_result(&tx, result, Action::KeysLoaded);
                });
            }

            Action::RequestCreateKey(name) => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    let result = client.create_api_key(&name).await;
                    bridge::send_result(&tx, result, Action::KeyCreated);
                });
            }

            Action::KeyCreated(result) => {
                match result {
                    Ok(created) => {
                        self.action_tx.send(Action::Notify(Notification::success(format!(
                            "Created key {}",
                            created.prefix
                        ))))?;
                    }
                    Err(msg) => {
                        self.action_tx
                            .send(Action::Notify(Notification::error(msg.clone())))?;
                    }
                }
                self.broadcast(action)?;
            }

            // Revoking a key is destructive → confirmation dialog
            Action::RequestDeleteKey { prefix, name } => {
                self.action_tx
                    .send(Action::ShowConfirm(ConfirmAction::DeleteKey {
                        prefix: prefix.clone(),
                        name: name.clone(),
                    }))?;
            }

            Action::KeyDeleted { prefix, result } => {
                match result {
                    Ok(()) => {
                        self.action_tx.send(Action::Notify(Notification::success(format!(
                            "Revoked key {prefix}"
                        ))))?;
                    }
                    Err(msg) => {
                        self.action_tx
                            .send(Action::Notify(Notification::error(msg.clone())))?;
                    }
                }
                self.broadcast(action)?;
            }

            // ── Analysis history ─────────────────────────────────────

            Action::RequestHistory => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = client.analysis_history().await;
                    bridge::send_result(&tx, result, Action::HistoryLoaded);
                });
            }

            Action::RequestEntryImages { id, image1, image2 } => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let cache = self.image_cache.clone();
                let id = *id;
                let image1 = image1.clone();
                let image2 = image2.clone();
                tokio::spawn(async move {
                    bridge::fetch_entry_images(client, cache, id, image1, image2, tx).await;
                });
            }

            // ── Confirmation dialog ──────────────────────────────────

            Action::ShowConfirm(confirm) => {
                self.pending_confirm = Some(confirm.clone());
            }

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm);
                }
            }

            Action::ConfirmNo => {
                self.pending_confirm = None;
            }

            // ── Notifications ────────────────────────────────────────

            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }

            Action::DismissNotification => {
                self.notification = None;
            }

            Action::Tick => {
                // Auto-dismiss notifications after 3 seconds
                if let Some((_, created)) = &self.notification {
                    if created.elapsed() > Duration::from_secs(3) {
                        self.notification = None;
                    }
                }
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            // Fetch results and stream lines go to every screen so state
            // stays current on tabs the user is not looking at
            Action::LogLine { .. }
            | Action::ConfigLoaded { .. }
            | Action::ConfigSaved { .. }
            | Action::KeysLoaded(_)
            | Action::HistoryLoaded(_)
            | Action::EntryImagesLoaded { .. } => {
                self.broadcast(action)?;
            }

            // Everything else goes to the active screen only
            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Move focus to `target` without touching the GoBack stack.
    fn focus_screen(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Send an action through every screen's update.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Replace the log stream task with a fresh connection.
    fn spawn_log_stream(&mut self) {
        self.logs_cancel.cancel();
        self.logs_cancel = CancellationToken::new();
        self.session_status = SessionStatus::Connecting;

        let client = self.client.clone();
        let tx = self.action_tx.clone();
        let cancel = self.logs_cancel.clone();
        tokio::spawn(async move {
            bridge::run_log_stream(client, tx, cancel).await;
        });
    }

    /// Run a confirmed destructive action.
    fn execute_confirm(&self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteKey { prefix, .. } => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = client.delete_api_key(&prefix).await;
                    bridge::send_result(&tx, result, |result| Action::KeyDeleted {
                        prefix,
                        result,
                    });
                });
            }
        }
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // The sign-in form owns the whole frame — no tab bar or status bar
        if self.active_screen == ScreenId::Login {
            if let Some(screen) = self.screens.get(&ScreenId::Login) {
                screen.render(frame, area);
            }
            return;
        }

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        let content_area = layout[0];
        let tab_area = layout[1];
        let status_area = layout[2];

        // Render active screen
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }

        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        // Render overlays on top (order matters: last = topmost)
        if let Some((ref notif, _)) = self.notification {
            self.render_notification(frame, area, notif);
        }

        if let Some(ref confirm) = self.pending_confirm {
            self.render_confirm_dialog(frame, area, confirm);
        }

        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    /// Render the bottom tab bar showing the four screens.
    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    /// Render the bottom status bar with session status and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match &self.session_status {
            SessionStatus::SignedOut => {
                Span::styled("○ signed out", Style::default().fg(theme::SIGNAL_RED))
            }
            SessionStatus::SigningIn => {
                Span::styled("◐ signing in", Style::default().fg(theme::SAND))
            }
            SessionStatus::Connecting => {
                Span::styled("◌ connecting", Style::default().fg(theme::SAND))
            }
            SessionStatus::Live => {
                Span::styled("● live", Style::default().fg(theme::SPRING_GREEN))
            }
            SessionStatus::StreamClosed => {
                Span::styled("◌ stream closed", Style::default().fg(theme::SAND))
            }
        };

        let line = Line::from(vec![
            Span::raw(" "),
            indicator,
            Span::styled(format!(" │ {}", self.server), theme::key_hint()),
            Span::styled(" │ ? help  q quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }

    /// Render the help overlay centered on screen.
    #[allow(clippy::unused_self)]
    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let help_width = 60u16.min(area.width.saturating_sub(4));
        let help_height = 22u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;

        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        // Clear the background
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let help_text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "  Navigation",
                Style::default().fg(theme::TEAL),
            )]),
            Line::from(Span::styled("  ─────────", theme::key_hint())),
            Line::from(vec![
                Span::styled("  1-4       ", theme::key_hint_key()),
                Span::styled("Jump to screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Tab       ", theme::key_hint_key()),
                Span::styled("Next screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  j/k ↑/↓   ", theme::key_hint_key()),
                Span::styled("Move up/down", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Enter     ", theme::key_hint_key()),
                Span::styled("Select / expand", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Esc       ", theme::key_hint_key()),
                Span::styled("Back / close", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  g/G       ", theme::key_hint_key()),
                Span::styled("Top / bottom", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "  Screens",
                Style::default().fg(theme::TEAL),
            )]),
            Line::from(Span::styled("  ───────", theme::key_hint())),
            Line::from(vec![
                Span::styled("  Logs      ", theme::key_hint_key()),
                Span::styled("Space pause      ", theme::key_hint()),
                Span::styled("r ", theme::key_hint_key()),
                Span::styled("reconnect", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Config    ", theme::key_hint_key()),
                Span::styled("s save           ", theme::key_hint()),
                Span::styled("Space ", theme::key_hint_key()),
                Span::styled("toggle flash", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Keys      ", theme::key_hint_key()),
                Span::styled("n new key        ", theme::key_hint()),
                Span::styled("d ", theme::key_hint_key()),
                Span::styled("revoke", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  History   ", theme::key_hint_key()),
                Span::styled("Enter detail     ", theme::key_hint()),
                Span::styled("r ", theme::key_hint_key()),
                Span::styled("refresh", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  ?         ", theme::key_hint_key()),
                Span::styled("This help            ", theme::key_hint()),
                Span::styled("q ", theme::key_hint_key()),
                Span::styled("Quit", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "                         Esc or ? to close",
                theme::key_hint(),
            )),
        ];

        let paragraph = Paragraph::new(help_text);
        frame.render_widget(paragraph, inner);
    }

    /// Render a centered confirmation dialog.
    #[allow(clippy::unused_self)]
    fn render_confirm_dialog(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 5u16;

        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let dialog_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            dialog_area,
        );

        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::SAND));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let text = vec![
            Line::from(Span::styled(
                format!("  {confirm}"),
                Style::default().fg(theme::FOG),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  y ", theme::key_hint_key()),
                Span::styled("confirm    ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }

    /// Render a notification toast in the bottom-right corner.
    #[allow(clippy::unused_self)]
    fn render_notification(&self, frame: &mut Frame, area: Rect, notif: &Notification) {
        use crate::action::NotificationLevel;

        #[allow(clippy::cast_possible_truncation)]
        let msg_len = notif.message.len() as u16;
        let width = (msg_len + 6).clamp(20, 60);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SPRING_GREEN, "✓"),
            NotificationLevel::Error => (theme::SIGNAL_RED, "✗"),
            NotificationLevel::Warning => (theme::SAND, "!"),
            NotificationLevel::Info => (theme::TEAL, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(&notif.message, Style::default().fg(theme::FOG)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
