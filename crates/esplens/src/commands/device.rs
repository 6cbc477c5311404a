//! Device configuration commands: show, set, models.
//!
//! The show/set implementations are parameterized over [`ConfigScope`]
//! and shared with `keys config`, which edits a per-key override.

use esplens_api::{Client, ConfigScope, DeviceConfig, DeviceConfigPatch, ModelInfo};
use tabled::Tabled;

use crate::cli::{ConfigSetArgs, DeviceArgs, DeviceCommand, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

fn model_row(model: &ModelInfo) -> ModelRow {
    ModelRow {
        name: model.name.clone(),
        description: model.description.clone(),
    }
}

// ── Detail view ──────────────────────────────────────────────────────

fn config_detail(config: &DeviceConfig) -> String {
    let context = if config.prompt_context.is_empty() {
        "-"
    } else {
        config.prompt_context.as_str()
    };
    let updated = config
        .updated_at
        .as_ref()
        .map_or_else(|| "-".to_string(), util::format_timestamp);

    let lines = vec![
        format!("Flash:    {}", if config.flash_enabled { "on" } else { "off" }),
        format!("Delay:    {}s", config.delay_seconds),
        format!("Model:    {}", config.default_model),
        format!("Context:  {context}"),
        format!("Updated:  {updated}"),
    ];
    lines.join("\n")
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(client: &Client, args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DeviceCommand::Show => show_config(client, &ConfigScope::Device, global).await,
        DeviceCommand::Set(set) => apply_config(client, &ConfigScope::Device, &set, global).await,
        DeviceCommand::Models => models(client, global).await,
    }
}

/// Show the capture configuration for `scope`.
pub async fn show_config(
    client: &Client,
    scope: &ConfigScope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = client.config(scope).await?;
    let out = output::render_single(&global.output, &config, config_detail, |c| {
        c.default_model.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Apply the given fields to the configuration for `scope` and print
/// the resulting state. Fields left unset keep their server value.
pub async fn apply_config(
    client: &Client,
    scope: &ConfigScope,
    set: &ConfigSetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if set.is_empty() {
        return Err(CliError::InvalidValue {
            field: "set",
            reason: "give at least one of --flash, --delay, --model, --context".to_string(),
        });
    }

    let patch = DeviceConfigPatch {
        flash_enabled: set.flash,
        delay_seconds: set.delay,
        default_model: set.model.clone(),
        prompt_context: set.context.clone(),
    };

    let config = client.update_config(scope, &patch).await?;
    if !global.quiet {
        eprintln!("✓ Updated {scope} configuration");
    }
    let out = output::render_single(&global.output, &config, config_detail, |c| {
        c.default_model.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn models(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let models = client.available_models().await?;
    let out = output::render_list(&global.output, &models, model_row, |m| m.name.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
