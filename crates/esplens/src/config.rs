//! CLI-side profile resolution.
//!
//! Thin wrapper over `esplens_config` that layers `GlobalOpts` flag
//! overrides onto the loaded profile and hands out the API client.

use esplens_api::Client;
use esplens_config::{Config, Profile, load_config_or_default};
use secrecy::SecretString;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The resolved connection target: the profile after flag overrides,
/// plus the name its credentials are stored under.
pub struct Target {
    pub profile_name: String,
    pub profile: Profile,
}

/// Active profile name: `--profile` flag > config default > "default".
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".to_string())
}

/// Resolve the connection target from config + global flags.
///
/// A `--server` flag works without any config file; an explicitly
/// requested `--profile` must exist.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let config = load_config_or_default();
    let profile_name = active_profile_name(global, &config);

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                },
            });
        }
        None if global.server.is_some() => empty_profile(),
        None => return Err(CliError::NoConfig),
    };

    if let Some(ref server) = global.server {
        profile.server = server.clone();
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    debug!("using profile '{profile_name}' against {}", profile.server);
    Ok(Target {
        profile_name,
        profile,
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

impl Target {
    /// Build an API client for this target.
    pub fn client(&self) -> Result<Client, CliError> {
        let (url, transport) = esplens_config::server_target(&self.profile)?;
        Ok(Client::new(url, &transport)?)
    }

    /// Session credentials: env > keyring > plaintext profile value.
    pub fn session_credentials(&self) -> Result<(String, SecretString), CliError> {
        esplens_config::resolve_session_credentials(&self.profile, &self.profile_name).map_err(
            |err| match err {
                esplens_config::ConfigError::NoCredentials { profile } => {
                    CliError::NoCredentials { profile }
                }
                other => CliError::Config(other),
            },
        )
    }

    /// Device API key: `--api-key` flag > profile env var > keyring >
    /// plaintext profile value.
    pub fn api_key(&self, global: &GlobalOpts) -> Result<SecretString, CliError> {
        if let Some(ref key) = global.api_key {
            return Ok(SecretString::from(key.clone()));
        }
        esplens_config::resolve_api_key(&self.profile, &self.profile_name).map_err(|err| {
            match err {
                esplens_config::ConfigError::NoApiKey { profile } => {
                    CliError::NoApiKey { profile }
                }
                other => CliError::Config(other),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn bare_global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            server: None,
            username: None,
            api_key: None,
            output: crate::cli::OutputFormat::Table,
            color: crate::cli::ColorMode::Auto,
            verbose: 0,
            quiet: false,
            yes: false,
            insecure: false,
            timeout: None,
        }
    }

    #[test]
    fn test_flag_beats_config_default() {
        let config = Config {
            default_profile: Some("home".to_string()),
            ..Config::default()
        };

        let mut global = bare_global();
        global.profile = Some("lab".to_string());

        assert_eq!(active_profile_name(&global, &config), "lab");
        global.profile = None;
        assert_eq!(active_profile_name(&global, &config), "home");
    }

    #[test]
    fn test_server_flag_builds_target_without_config() {
        let mut global = bare_global();
        global.server = Some("http://192.168.1.50:8000".to_string());
        global.username = Some("admin".to_string());

        let target = resolve_target(&global).unwrap();
        assert_eq!(target.profile.server, "http://192.168.1.50:8000");
        assert_eq!(target.profile.username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_api_key_flag_wins() {
        use secrecy::ExposeSecret;

        let mut global = bare_global();
        global.server = Some("http://192.168.1.50:8000".to_string());
        global.api_key = Some("flag-key".to_string());

        let target = resolve_target(&global).unwrap();
        let key = target.api_key(&global).unwrap();
        assert_eq!(key.expose_secret(), "flag-key");
    }
}
