//! Screen identifier enum and tab-bar ordering.

use std::fmt;

/// Identifies each primary TUI screen, navigable by number keys 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Logs, // 1
    Config,  // 2
    Keys,    // 3
    History, // 4
    /// Sign-in form — not in the tab bar, not navigable by number keys.
    Login,
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 4] = [Self::Logs, Self::Config, Self::Keys, Self::History];

    /// Numeric key (1-4) for this screen. Login has no number key.
    pub fn number(self) -> u8 {
        match self {
            Self::Logs => 1,
            Self::Config => 2,
            Self::Keys => 3,
            Self::History => 4,
            Self::Login => 0,
        }
    }

    /// Screen from a numeric key (1-4). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Logs),
            2 => Some(Self::Config),
            3 => Some(Self::Keys),
            4 => Some(Self::History),
            _ => None,
        }
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Logs => "Logs",
            Self::Config => "Config",
            Self::Keys => "Keys",
            Self::History => "History",
            Self::Login => "Login",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
