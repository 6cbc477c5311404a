// Error types for the dashboard API client
//
// One enum covers the three failure families the dashboard distinguishes:
// transport problems (DNS, TLS, timeouts), terminal authorization failures
// (401/403, session gone), and validation/business errors carrying a server
// message. Helper predicates let callers branch without matching variants.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors returned by the dashboard API client.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authorization ──

    /// The server answered 401 or 403: the session is missing or expired.
    ///
    /// This is terminal for the current session. The response body is never
    /// inspected for this case; the only sensible reaction is to log in again.
    #[error("not authorized (HTTP {status}): log in again")]
    AuthRequired {
        /// 401 or 403.
        status: u16,
    },

    // ── Server-reported failures ──

    /// A non-2xx response carrying a server message (`detail` or `error`).
    #[error("server error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// A 4xx response with per-field messages, as serializers report them.
    #[error("validation failed: {}", join_field_errors(errors))]
    Validation {
        /// Field name to the list of messages for that field.
        errors: BTreeMap<String, Vec<String>>,
    },

    // ── Transport and decoding ──

    /// Connection-level failure: DNS, refused, timeout, TLS handshake.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A URL could not be built from the base URL and path.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS material could not be loaded or applied.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// A 2xx body did not match the expected shape.
    #[error("unexpected response body: {message}")]
    Deserialization {
        message: String,
        /// Raw body, kept for diagnostics.
        body: String,
    },

    // ── Log stream ──

    /// The WebSocket upgrade or transport failed.
    #[error("log stream error: {0}")]
    WebSocket(String),
}

impl Error {
    /// True for 401/403 responses. The caller should re-authenticate.
    #[must_use]
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }

    /// True when the server reported 404 for the addressed resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// True for connect/timeout failures where a retry might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// True specifically for request timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Per-field validation messages, if this is a validation error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

/// Flatten a field error map into one line, e.g.
/// `username: already taken; password: Passwords must match.`
fn join_field_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn auth_required_display_hides_body_details() {
        let err = Error::AuthRequired { status: 403 };
        assert_eq!(err.to_string(), "not authorized (HTTP 403): log in again");
        assert!(err.is_auth_required());
    }

    #[test]
    fn validation_display_flattens_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("username".to_owned(), vec!["already taken".to_owned()]);
        errors.insert(
            "password".to_owned(),
            vec!["Passwords must match.".to_owned()],
        );
        let err = Error::Validation { errors };
        assert_eq!(
            err.to_string(),
            "validation failed: password: Passwords must match.; username: already taken"
        );
    }

    #[test]
    fn not_found_predicate_only_matches_404() {
        let not_found = Error::Api {
            status: 404,
            message: "HTTP 404".to_owned(),
        };
        let conflict = Error::Api {
            status: 409,
            message: "conflict".to_owned(),
        };
        assert!(not_found.is_not_found());
        assert!(!conflict.is_not_found());
    }
}
