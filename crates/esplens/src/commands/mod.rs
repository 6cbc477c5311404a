//! Command dispatch.

pub mod analyze;
pub mod auth;
pub mod config_cmd;
pub mod device;
pub mod history;
pub mod keys;
pub mod logs;
pub mod util;

use esplens_api::Client;

use crate::cli::{Command, GlobalOpts, LogsCommand};
use crate::config::Target;
use crate::error::CliError;

/// True for commands that operate inside a logged-in session.
fn needs_session(command: &Command) -> bool {
    match command {
        Command::Device(_) | Command::Keys(_) | Command::History(_) => true,
        Command::Logs(args) => matches!(args.command, LogsCommand::Watch),
        _ => false,
    }
}

/// Run one command against the resolved target.
///
/// Session commands log in first and log out afterwards; each CLI run
/// is its own session.
pub async fn dispatch(
    command: Command,
    client: &Client,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = needs_session(&command);
    if session {
        util::establish_session(client, target).await?;
    }

    let result = run(command, client, target, global).await;

    if session {
        // Best-effort session teardown.
        let _ = client.logout().await;
    }
    result
}

async fn run(
    command: Command,
    client: &Client,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::Login(args) => auth::login(client, target, args, global).await,
        Command::Register(args) => auth::register(client, target, args, global).await,
        Command::Device(args) => device::handle(client, args, global).await,
        Command::Keys(args) => keys::handle(client, args, global).await,
        Command::History(args) => history::handle(client, args, global).await,
        Command::Logs(args) => logs::handle(client, target, args, global).await,
        Command::Analyze(args) => analyze::handle(client, target, args, global).await,
        Command::Config(_) | Command::Completions(_) => unreachable!("handled in main"),
    }
}
