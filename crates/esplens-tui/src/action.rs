//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use esplens_api::{
    AnalysisEntry, ApiKey, ConfigScope, CreatedApiKey, DeviceConfig, DeviceConfigPatch, ModelInfo,
};
use secrecy::SecretString;
use uuid::Uuid;

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteKey { prefix: String, name: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteKey { prefix, name } => {
                write!(f, "Revoke key {prefix} ({name})? Devices using it stop reporting.")
            }
        }
    }
}

/// Downloaded before/after image pair for one history entry.
#[derive(Debug, Clone)]
pub struct EntryImages {
    pub before: PathBuf,
    pub after: PathBuf,
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    // ── Session ───────────────────────────────────────────────────
    SubmitLogin {
        username: String,
        password: SecretString,
    },
    SessionReady {
        username: String,
    },
    LoginFailed(String),
    /// The server rejected a request as unauthenticated. The session is
    /// gone; every in-flight surface returns to the sign-in form.
    SessionExpired,

    // ── Live Log Stream ───────────────────────────────────────────
    LogsConnected,
    LogLine {
        at: DateTime<Local>,
        message: String,
    },
    LogsClosed(Option<String>),
    ReconnectLogs,

    // ── Capture Config ────────────────────────────────────────────
    /// Point the config screen at a scope and load it.
    ShowConfig(ConfigScope),
    RequestConfig(ConfigScope),
    ConfigLoaded {
        scope: ConfigScope,
        result: Result<(DeviceConfig, Vec<ModelInfo>), String>,
    },
    SubmitConfig {
        scope: ConfigScope,
        patch: DeviceConfigPatch,
    },
    ConfigSaved {
        scope: ConfigScope,
        result: Result<DeviceConfig, String>,
    },

    // ── API Keys ──────────────────────────────────────────────────
    RequestKeys,
    KeysLoaded(Result<Vec<ApiKey>, String>),
    RequestCreateKey(String),
    KeyCreated(Result<CreatedApiKey, String>),
    RequestDeleteKey {
        prefix: String,
        name: String,
    },
    KeyDeleted {
        prefix: String,
        result: Result<(), String>,
    },

    // ── Analysis History ──────────────────────────────────────────
    RequestHistory,
    HistoryLoaded(Result<Vec<AnalysisEntry>, String>),
    RequestEntryImages {
        id: Uuid,
        image1: String,
        image2: String,
    },
    EntryImagesLoaded {
        id: Uuid,
        result: Result<EntryImages, String>,
    },

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
