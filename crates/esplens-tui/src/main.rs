//! `esplens-tui` — Terminal dashboard for ESP32-CAM AI monitor servers.
//!
//! Built on [ratatui](https://ratatui.rs) against the same session API the
//! browser dashboard uses. Screens are navigable via number keys (1-4):
//! Logs, Config, Keys, and History.
//!
//! Logs are written to a file (default `/tmp/esplens-tui.log`) to avoid
//! corrupting the terminal UI. Background tasks carry the live log stream
//! and API requests, feeding results into the TUI action loop.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod bridge;
mod component;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use esplens_api::Client;
use esplens_config::Profile;

use crate::app::App;

/// Terminal dashboard for an ESP32-CAM AI monitor server.
#[derive(Parser, Debug)]
#[command(name = "esplens-tui", version, about)]
struct Cli {
    /// Server base URL (e.g., http://192.168.1.50:8000)
    #[arg(short = 's', long, env = "ESPLENS_SERVER")]
    server: Option<String>,

    /// Profile name from the esplens config file
    #[arg(short = 'p', long, env = "ESPLENS_PROFILE")]
    profile: Option<String>,

    /// Username for session login
    #[arg(short = 'u', long, env = "ESPLENS_USERNAME")]
    username: Option<String>,

    /// Log file path (defaults to /tmp/esplens-tui.log)
    #[arg(long, default_value = "/tmp/esplens-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("esplens_tui={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("esplens-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// The resolved server: a client handle plus what to show and pre-fill
/// on the sign-in form.
struct Target {
    client: Client,
    server: String,
    username: Option<String>,
    credentials: Option<(String, SecretString)>,
}

/// Resolve the server from CLI flags and the shared config file.
///
/// A `--server` flag works without any config file; otherwise the chosen
/// profile must exist and carry a server URL.
fn resolve_target(cli: &Cli) -> Result<Target> {
    let config = esplens_config::load_config_or_default();
    let profile_name = cli
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".to_string());

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if cli.server.is_some() => empty_profile(),
        None => {
            return Err(eyre!(
                "profile '{profile_name}' has no server configured; \
                 pass --server or run `esplens config init`"
            ));
        }
    };
    if let Some(ref server) = cli.server {
        profile.server = server.clone();
    }
    if let Some(ref username) = cli.username {
        profile.username = Some(username.clone());
    }

    let (url, transport) = esplens_config::server_target(&profile)?;
    let client = Client::new(url, &transport)?;
    let credentials = esplens_config::resolve_session_credentials(&profile, &profile_name).ok();

    Ok(Target {
        client,
        server: profile.server.clone(),
        username: profile.username.clone(),
        credentials,
    })
}

fn empty_profile() -> Profile {
    Profile {
        server: String::new(),
        username: None,
        password: None,
        api_key: None,
        api_key_env: None,
        ca_cert: None,
        insecure: None,
        timeout: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    let target = resolve_target(&cli)?;
    info!(server = %target.server, "starting esplens-tui");

    let mut app = App::new(
        Arc::new(target.client),
        target.server,
        target.username,
        target.credentials,
    );
    app.run().await?;

    Ok(())
}
