//! Clap derive structures for the `esplens` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// esplens -- command-line dashboard for the ESP32-CAM AI monitor
#[derive(Debug, Parser)]
#[command(
    name = "esplens",
    version,
    about = "Manage an ESP32-CAM AI monitor from the command line",
    long_about = "A CLI for the ESP32-CAM AI monitor dashboard.\n\n\
        Talks to the dashboard's session-authenticated API for configuration,\n\
        API keys, and analysis history, and to its device-side API (X-Api-Key)\n\
        for submitting image pairs and log lines.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard profile to use
    #[arg(long, short = 'p', env = "ESPLENS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Dashboard base URL (overrides profile)
    #[arg(long, short = 's', env = "ESPLENS_SERVER", global = true)]
    pub server: Option<String>,

    /// Username for session login (overrides profile)
    #[arg(long, short = 'u', env = "ESPLENS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Device API key for device-side commands
    #[arg(long, env = "ESPLENS_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ESPLENS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ESPLENS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "ESPLENS_TIMEOUT", value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify credentials and store the session password in the keyring
    Login(LoginArgs),

    /// Create a new dashboard account
    Register(RegisterArgs),

    /// View and update the device capture configuration
    #[command(alias = "dev", alias = "d")]
    Device(DeviceArgs),

    /// Manage device API keys
    #[command(alias = "key")]
    Keys(KeysArgs),

    /// Browse change-detection history
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Live device log stream
    Logs(LogsArgs),

    /// Submit an image pair for analysis (device API key)
    Analyze(AnalyzeArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Verify only; do not store the password in the system keyring
    #[arg(long)]
    pub no_store: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Email address for the new account
    #[arg(long)]
    pub email: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Show the device capture configuration
    Show,

    /// Update capture configuration fields (unset fields are preserved)
    Set(ConfigSetArgs),

    /// List the analysis models the server accepts
    Models,
}

/// Capture configuration fields for `set` commands. Shared between the
/// device-wide configuration and per-key overrides.
#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    /// Fire the flash LED during capture
    #[arg(long, value_name = "BOOL")]
    pub flash: Option<bool>,

    /// Seconds between capture cycles
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<u32>,

    /// Default analysis model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Extra context for the vision prompt
    #[arg(long, value_name = "TEXT")]
    pub context: Option<String>,
}

impl ConfigSetArgs {
    /// True when no field was given.
    pub fn is_empty(&self) -> bool {
        self.flash.is_none()
            && self.delay.is_none()
            && self.model.is_none()
            && self.context.is_none()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  KEYS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// List registered API keys
    #[command(alias = "ls")]
    List,

    /// Create a key; the full secret is shown exactly once
    Create {
        /// Key name (defaults to a generated device name when omitted)
        name: Option<String>,
    },

    /// Revoke a key permanently
    #[command(alias = "rm")]
    Delete {
        /// Key prefix, as shown by `keys list`
        prefix: String,
    },

    /// Show or update the capture configuration bound to one key
    Config {
        /// Key prefix, as shown by `keys list`
        prefix: String,

        #[command(flatten)]
        set: ConfigSetArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HISTORY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List analysis entries, newest first
    #[command(alias = "ls")]
    List {
        /// Max entries to show
        #[arg(long, short = 'l', default_value = "25")]
        limit: usize,
    },

    /// Download the before/after images of one entry
    Images {
        /// Entry ID, as shown by `history list`
        id: String,

        /// Directory to write the images into (default: current directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Stream live device logs to stdout until interrupted
    Watch,

    /// Send one log line on behalf of a device (device API key)
    Send {
        /// The log message
        message: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ANALYZE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Before image (JPEG or PNG)
    pub image1: PathBuf,

    /// After image (JPEG or PNG)
    pub image2: PathBuf,

    /// Analysis model (defaults to the key's configured model)
    #[arg(long)]
    pub model: Option<String>,

    /// Extra context for the vision prompt
    #[arg(long)]
    pub context: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Set a profile value (server, username, api_key, ...)
    Set {
        /// Config key to set
        key: String,
        /// Value to assign
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the session password in the system keyring
    SetPassword {
        /// Profile to store the password for (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Store the device API key in the system keyring
    SetKey {
        /// Profile to store the key for (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
