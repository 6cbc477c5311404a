//! CLI error type with exit codes and user-facing diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Failed to connect to {url}")]
    #[diagnostic(
        code(esplens::connection_failed),
        help("Check that the dashboard is running and the URL is correct. Try: curl -k {url}")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS error: {message}")]
    #[diagnostic(
        code(esplens::tls_error),
        help("For a self-signed certificate, pass --insecure or set a CA with `esplens config set ca_cert <path>`")
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(esplens::timeout),
        help("The server may be busy. Try increasing --timeout")
    )]
    Timeout,

    #[error("Log stream closed by the server")]
    #[diagnostic(
        code(esplens::stream_closed),
        help("Run `esplens logs watch` again to reconnect")
    )]
    StreamClosed { reason: Option<String> },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login failed for profile '{profile}': {message}")]
    #[diagnostic(
        code(esplens::login_failed),
        help("Check the username and stored password. Re-run `esplens login --profile {profile}` to update them")
    )]
    LoginFailed { profile: String, message: String },

    #[error("Not authorized (HTTP {status})")]
    #[diagnostic(
        code(esplens::session_expired),
        help("The session was rejected mid-run. Log in again with `esplens login`")
    )]
    SessionExpired { status: u16 },

    #[error("No credentials found for profile '{profile}'")]
    #[diagnostic(
        code(esplens::no_credentials),
        help("Run `esplens login --profile {profile}`, or set ESPLENS_USERNAME and ESPLENS_PASSWORD")
    )]
    NoCredentials { profile: String },

    #[error("No device API key found for profile '{profile}'")]
    #[diagnostic(
        code(esplens::no_api_key),
        help("Pass --api-key, set ESPLENS_API_KEY, or store one with `esplens config set-key`")
    )]
    NoApiKey { profile: String },

    // ── Not Found ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(esplens::not_found),
        help("List available {resource_type}s with: esplens {list_command}")
    )]
    NotFound {
        resource_type: &'static str,
        identifier: String,
        list_command: &'static str,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(esplens::invalid_value))]
    InvalidValue { field: &'static str, reason: String },

    #[error("The server rejected the request:\n{summary}")]
    #[diagnostic(code(esplens::rejected))]
    Rejected { summary: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No server configured")]
    #[diagnostic(
        code(esplens::no_config),
        help("Run `esplens config init` to set up a profile, or pass --server")
    )]
    NoConfig,

    #[error("Profile '{name}' not found (available: {available})")]
    #[diagnostic(
        code(esplens::profile_not_found),
        help("List profiles with: esplens config profiles")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Config error: {0}")]
    #[diagnostic(code(esplens::config))]
    Config(#[from] esplens_config::ConfigError),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(esplens::keyring),
        help("The system keyring may be locked or unavailable")
    )]
    Keyring(#[from] keyring::Error),

    // ── Generic ──────────────────────────────────────────────────────
    #[error("Server error (HTTP {status}): {message}")]
    #[diagnostic(code(esplens::api))]
    Api { status: u16, message: String },

    #[error("Unexpected response from the server: {message}")]
    #[diagnostic(code(esplens::unexpected_response))]
    UnexpectedResponse { message: String },

    #[error(transparent)]
    #[diagnostic(code(esplens::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } | Self::StreamClosed { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout => exit_code::TIMEOUT,
            Self::LoginFailed { .. }
            | Self::SessionExpired { .. }
            | Self::NoCredentials { .. }
            | Self::NoApiKey { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidValue { .. } => exit_code::USAGE,
            Self::Rejected { .. } => exit_code::VALIDATION,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<esplens_api::Error> for CliError {
    fn from(err: esplens_api::Error) -> Self {
        match err {
            esplens_api::Error::AuthRequired { status } => Self::SessionExpired { status },
            esplens_api::Error::Api { status, message } => Self::Api { status, message },
            esplens_api::Error::Validation { errors } => Self::Rejected {
                // The dashboard shows the messages only, one per line.
                summary: errors
                    .values()
                    .flat_map(|reasons| reasons.iter())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            esplens_api::Error::Transport(err) if err.is_timeout() => Self::Timeout,
            esplens_api::Error::Transport(err) => Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "the server".to_owned(), ToString::to_string),
                source: Box::new(err),
            },
            esplens_api::Error::InvalidUrl(err) => Self::InvalidValue {
                field: "server",
                reason: err.to_string(),
            },
            esplens_api::Error::Tls(message) => Self::TlsError { message },
            esplens_api::Error::Deserialization { message, .. } => {
                Self::UnexpectedResponse { message }
            }
            esplens_api::Error::WebSocket(message) => Self::StreamClosed {
                reason: Some(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = CliError::Timeout;
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err = CliError::NotFound {
            resource_type: "API key",
            identifier: "abc123".to_string(),
            list_command: "keys list",
        };
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);

        let err = CliError::SessionExpired { status: 403 };
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn test_field_errors_flatten_to_messages_only() {
        let mut errors = std::collections::BTreeMap::new();
        errors.insert(
            "username".to_string(),
            vec!["already taken".to_string()],
        );
        errors.insert(
            "password".to_string(),
            vec!["too short".to_string(), "too common".to_string()],
        );
        let err = CliError::from(esplens_api::Error::Validation { errors });
        let text = err.to_string();
        assert!(text.contains("already taken"));
        assert!(text.contains("too short"));
        assert!(!text.contains("username"));
        assert_eq!(err.exit_code(), exit_code::VALIDATION);
    }

    #[test]
    fn test_timeout_transport_maps_to_timeout() {
        // A plain Api error keeps its status for scripting.
        let err = CliError::from(esplens_api::Error::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(err.to_string().contains("500"));
    }
}
