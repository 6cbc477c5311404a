//! Shared helpers for command implementations.

use chrono::{DateTime, Local, Utc};
use dialoguer::Confirm;
use esplens_api::Client;

use crate::config::Target;
use crate::error::CliError;

/// Prompt for confirmation unless `--yes` was passed.
///
/// Returns `Ok(true)` to proceed, `Ok(false)` when declined.
pub fn confirm(prompt: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|err| CliError::Io(std::io::Error::other(err)))
}

/// Log in with the target's session credentials.
///
/// A rejected login becomes `LoginFailed` so the server's reason is
/// shown next to the profile that supplied the credentials.
pub async fn establish_session(client: &Client, target: &Target) -> Result<(), CliError> {
    let (username, password) = target.session_credentials()?;
    client
        .login(&username, &password)
        .await
        .map_err(|err| match err {
            esplens_api::Error::Api {
                status: 400,
                message,
            } => CliError::LoginFailed {
                profile: target.profile_name.clone(),
                message,
            },
            esplens_api::Error::AuthRequired { status } => CliError::LoginFailed {
                profile: target.profile_name.clone(),
                message: format!("rejected with HTTP {status}"),
            },
            other => other.into(),
        })
}

/// Format a server timestamp in the local timezone.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_confirm_honors_yes_flag() {
        // With --yes there is no prompt to answer.
        assert!(confirm("Delete everything?", true).unwrap());
    }
}
