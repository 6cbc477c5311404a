//! Live log stream commands.

use esplens_api::{Client, LogEvent};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalOpts, LogsArgs, LogsCommand};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &Client,
    target: &Target,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LogsCommand::Watch => watch(client, global).await,
        LogsCommand::Send { message } => send(client, target, &message, global).await,
    }
}

/// Stream log lines to stdout until Ctrl-C or the server closes the
/// connection. A server-side close is an error exit so scripts notice;
/// reconnecting is always an explicit re-run.
async fn watch(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let cancel = CancellationToken::new();
    let mut channel = client.log_channel(cancel.clone())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
            }
            event = channel.recv() => match event {
                Some(LogEvent::Connected) => {
                    notice("--- Connected to Log Server ---", color);
                }
                Some(LogEvent::Line { received_at, message }) => {
                    println!("[{}] {message}", received_at.format("%H:%M:%S"));
                }
                Some(LogEvent::Closed { .. }) if cancel.is_cancelled() => {
                    return Ok(());
                }
                Some(LogEvent::Closed { reason }) => {
                    notice(
                        "--- Connection lost. Run `esplens logs watch` to reconnect. ---",
                        color,
                    );
                    return Err(CliError::StreamClosed { reason });
                }
                None => return Ok(()),
            }
        }
    }
}

fn notice(text: &str, color: bool) {
    if color {
        eprintln!("{}", text.dimmed());
    } else {
        eprintln!("{text}");
    }
}

async fn send(
    client: &Client,
    target: &Target,
    message: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api_key = target.api_key(global)?;
    client.send_device_log(&api_key, message).await?;
    if !global.quiet {
        eprintln!("✓ Log line sent");
    }
    Ok(())
}
