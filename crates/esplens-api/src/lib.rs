// esplens-api: async client for the ESP32-CAM AI monitor dashboard
//
// Session-cookie authentication with CSRF echo, device API keys, capture
// configuration, change-detection history, and the live log WebSocket
// stream. The CLI and TUI crates sit on top of this one.

pub mod auth;
pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod keys;
pub mod models;
pub mod transport;
pub mod vision;
pub mod websocket;

pub use client::Client;
pub use config::ConfigScope;
pub use error::Error;
pub use keys::DEFAULT_KEY_NAME;
pub use models::{
    AnalysisEntry, AnalysisUpload, ApiKey, CreatedApiKey, DeviceConfig, DeviceConfigPatch,
    ImageFile, ModelInfo,
};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{LogChannel, LogEvent};
