//! Config subcommand handlers.

use dialoguer::{Input, Select};
use esplens_config::{self as shared, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(err: impl std::fmt::Display) -> CliError {
    CliError::Io(std::io::Error::other(err.to_string()))
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

fn available_names(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = shared::config_path();
            eprintln!("✨ esplens — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Dashboard URL
            let server: String = Input::new()
                .with_prompt("Dashboard URL")
                .default("http://192.168.1.50:8000".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Session credentials
            let username: String = Input::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(prompt_err)?;

            let pass = rpassword::prompt_password("Password: ")?;
            if username.is_empty() || pass.is_empty() {
                return Err(CliError::InvalidValue {
                    field: "credentials",
                    reason: "username and password cannot be empty".to_string(),
                });
            }

            let store_choices = &[
                "Store password in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password_field = if store_selection == 0 {
                let entry =
                    keyring::Entry::new("esplens", &format!("{profile_name}/password"))?;
                entry.set_password(&pass)?;
                eprintln!("   ✓ Password stored in system keyring");
                None
            } else {
                Some(pass)
            };

            // 4. Device API key (optional; needed for analyze / logs send)
            let key = rpassword::prompt_password("Device API key (blank to skip): ")?;
            let api_key_field = if key.is_empty() {
                None
            } else {
                let key_choices = &[
                    "Store in system keyring (recommended)",
                    "Save to config file (plaintext)",
                ];
                let key_selection = Select::new()
                    .with_prompt("Where to store the API key?")
                    .items(key_choices)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)?;

                if key_selection == 0 {
                    let entry =
                        keyring::Entry::new("esplens", &format!("{profile_name}/api-key"))?;
                    entry.set_password(&key)?;
                    eprintln!("   ✓ API key stored in system keyring");
                    None
                } else {
                    Some(key)
                }
            };

            // 5. Merge into the existing config and make this profile
            //    the default
            let mut cfg = shared::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    server,
                    username: Some(username),
                    password: password_field,
                    api_key: api_key_field,
                    api_key_env: None,
                    ca_cert: None,
                    insecure: None,
                    timeout: None,
                },
            );
            cfg.default_profile = Some(profile_name.clone());

            // 6. Write config
            shared::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: esplens device show");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = shared::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = shared::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(empty_profile);

            match key.as_str() {
                "server" => profile.server = value,
                "username" => profile.username = Some(value),
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "insecure" => {
                    profile.insecure = Some(value.parse().map_err(|_| CliError::InvalidValue {
                        field: "insecure",
                        reason: "must be 'true' or 'false'".to_string(),
                    })?);
                }
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::InvalidValue {
                        field: "timeout",
                        reason: "must be a number (seconds)".to_string(),
                    })?);
                }
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                other => {
                    return Err(CliError::InvalidValue {
                        field: "key",
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: server, username, \
                             api_key, api_key_env, insecure, timeout, ca_cert"
                        ),
                    });
                }
            }

            shared::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = shared::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: esplens config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = shared::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                let available = available_names(&cfg);
                return Err(CliError::ProfileNotFound { name, available });
            }

            cfg.default_profile = Some(name.clone());
            shared::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword / SetKey ────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            store_secret(profile, global, "password", "Password: ").await
        }
        ConfigCommand::SetKey { profile } => {
            store_secret(profile, global, "api-key", "API key: ").await
        }
    }
}

/// Prompt for a secret and store it in the system keyring under
/// `{profile}/{slot}`.
async fn store_secret(
    profile: Option<String>,
    global: &GlobalOpts,
    slot: &str,
    prompt_label: &str,
) -> Result<(), CliError> {
    let cfg = shared::load_config_or_default();
    let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

    if !cfg.profiles.contains_key(&profile_name) {
        let available = available_names(&cfg);
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available,
        });
    }

    let secret = rpassword::prompt_password(prompt_label)?;
    if secret.is_empty() {
        return Err(CliError::InvalidValue {
            field: "secret",
            reason: "value cannot be empty".to_string(),
        });
    }

    let entry = keyring::Entry::new("esplens", &format!("{profile_name}/{slot}"))?;
    entry.set_password(&secret)?;

    eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
    Ok(())
}
