//! API key management commands.

use esplens_api::{ApiKey, Client, ConfigScope, CreatedApiKey};
use tabled::Tabled;

use crate::cli::{GlobalOpts, KeysArgs, KeysCommand};
use crate::commands::{device, util};
use crate::error::CliError;
use crate::output;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "PREFIX")]
    prefix: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

fn key_row(key: &ApiKey) -> KeyRow {
    KeyRow {
        prefix: key.prefix.clone(),
        name: key.name.clone(),
        created: util::format_timestamp(&key.created),
    }
}

// ── Detail view ──────────────────────────────────────────────────────

fn created_detail(created: &CreatedApiKey) -> String {
    let lines = vec![
        format!("Prefix:   {}", created.prefix),
        format!("Name:     {}", created.name),
        format!("Created:  {}", util::format_timestamp(&created.created)),
        String::new(),
        format!("Key:      {}", created.key),
        String::new(),
        "Store the key now; the server keeps only a hash and cannot show it again.".to_string(),
    ];
    lines.join("\n")
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(client: &Client, args: KeysArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        KeysCommand::List => list(client, global).await,
        KeysCommand::Create { name } => create(client, name.as_deref().unwrap_or(""), global).await,
        KeysCommand::Delete { prefix } => delete(client, &prefix, global).await,
        KeysCommand::Config { prefix, set } => {
            let scope = ConfigScope::Key(prefix);
            if set.is_empty() {
                device::show_config(client, &scope, global).await
            } else {
                device::apply_config(client, &scope, &set, global).await
            }
        }
    }
}

async fn list(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let keys = client.api_keys().await?;
    let out = output::render_list(&global.output, &keys, key_row, |k| k.prefix.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn create(client: &Client, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let created = client.create_api_key(name).await?;
    if !global.quiet {
        eprintln!("✓ API key '{}' created", created.name);
    }
    // Plain format emits the bare secret for scripting.
    let out = output::render_single(&global.output, &created, created_detail, |c| c.key.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn delete(client: &Client, prefix: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let prompt = format!("Revoke API key '{prefix}'? Devices using it will stop working");
    if !util::confirm(&prompt, global.yes)? {
        if !global.quiet {
            eprintln!("Aborted.");
        }
        return Ok(());
    }

    client.delete_api_key(prefix).await.map_err(|err| {
        if err.is_not_found() {
            CliError::NotFound {
                resource_type: "API key",
                identifier: prefix.to_string(),
                list_command: "keys list",
            }
        } else {
            err.into()
        }
    })?;

    if !global.quiet {
        eprintln!("✓ API key {prefix} revoked");
    }
    Ok(())
}
