//! Account commands: login verification and registration.

use dialoguer::Input;
use esplens_api::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config::Target;
use crate::error::CliError;

/// Verify credentials against the dashboard and optionally store a
/// freshly typed password in the system keyring.
pub async fn login(
    client: &Client,
    target: &Target,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let username = match target.profile.username.clone() {
        Some(name) => name,
        None => prompt("Username")?,
    };

    // Try the stored chain first; only prompt when nothing is stored.
    let mut probe = target.profile.clone();
    probe.username = Some(username.clone());
    let (password, prompted) =
        match esplens_config::resolve_session_credentials(&probe, &target.profile_name) {
            Ok((_, password)) => (password, false),
            Err(esplens_config::ConfigError::NoCredentials { .. }) => {
                let typed = rpassword::prompt_password("Password: ")?;
                (SecretString::from(typed), true)
            }
            Err(other) => return Err(other.into()),
        };

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
            other => other.into(),
        })?;
    let _ = client.logout().await;

    if prompted && !args.no_store {
        let entry = keyring::Entry::new("esplens", &format!("{}/password", target.profile_name))?;
        entry.set_password(password.expose_secret())?;
        if !global.quiet {
            eprintln!(
                "✓ Password stored in system keyring for profile '{}'",
                target.profile_name
            );
        }
    }

    if !global.quiet {
        eprintln!("✓ Logged in as {username}");
        if target.profile.username.is_none() {
            eprintln!("Hint: persist the username with `esplens config set username {username}`");
        }
    }
    Ok(())
}

/// Create a dashboard account. Field rejections from the server are
/// shown one message per line.
pub async fn register(
    client: &Client,
    target: &Target,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let username = match target.profile.username.clone() {
        Some(name) => name,
        None => prompt("Username")?,
    };
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = SecretString::from(rpassword::prompt_password("Password: ")?);
    let confirm = SecretString::from(rpassword::prompt_password("Confirm password: ")?);

    client.register(&username, &email, &password, &confirm).await?;

    if !global.quiet {
        eprintln!("✓ Account '{username}' created. Log in with: esplens login");
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|err| CliError::Io(std::io::Error::other(err)))
}
