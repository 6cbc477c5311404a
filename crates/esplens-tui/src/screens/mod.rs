//! Screen implementations. Each screen is a top-level Component.

pub mod config;
pub mod history;
pub mod keys;
pub mod login;
pub mod logs;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar. Login lives outside the
/// tab order and is constructed by the app directly.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Logs, Box::new(logs::LogsScreen::new())),
        (ScreenId::Config, Box::new(config::ConfigScreen::new())),
        (ScreenId::Keys, Box::new(keys::KeysScreen::new())),
        (ScreenId::History, Box::new(history::HistoryScreen::new())),
    ]
}
