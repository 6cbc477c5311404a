// Capture configuration endpoints
//
// The same read/patch contract exists at two routes: device-wide under the
// vision API and per-key under the key management API. One implementation
// serves both; the scope picks the route.

use std::fmt;

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::{DeviceConfig, DeviceConfigPatch};

/// Which configuration resource an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    /// The account-wide device configuration.
    Device,
    /// The configuration bound to one API key, addressed by its prefix.
    Key(String),
}

impl ConfigScope {
    pub(crate) fn path(&self) -> String {
        match self {
            Self::Device => "/api/vision/config/".to_owned(),
            Self::Key(prefix) => format!("/api/auth/api-keys/{prefix}/config/"),
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Key(prefix) => write!(f, "key {prefix}"),
        }
    }
}

impl Client {
    /// Fetch the capture configuration for `scope`.
    ///
    /// `GET /api/vision/config/` or `GET /api/auth/api-keys/{prefix}/config/`
    pub async fn config(&self, scope: &ConfigScope) -> Result<DeviceConfig, Error> {
        let url = self.api_url(&scope.path())?;
        debug!("fetching {scope} configuration");
        self.get_json(url).await
    }

    /// Apply a partial update to the configuration for `scope` and return
    /// the resulting state. Unset patch fields keep their server value.
    ///
    /// `PATCH /api/vision/config/` or `PATCH /api/auth/api-keys/{prefix}/config/`
    pub async fn update_config(
        &self,
        scope: &ConfigScope,
        patch: &DeviceConfigPatch,
    ) -> Result<DeviceConfig, Error> {
        let url = self.api_url(&scope.path())?;
        debug!("updating {scope} configuration");
        self.patch_json(url, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_paths_match_routes() {
        assert_eq!(ConfigScope::Device.path(), "/api/vision/config/");
        assert_eq!(
            ConfigScope::Key("abc12345".to_owned()).path(),
            "/api/auth/api-keys/abc12345/config/"
        );
    }

    #[test]
    fn scope_display_names_the_target() {
        assert_eq!(ConfigScope::Device.to_string(), "device");
        assert_eq!(ConfigScope::Key("abc12345".to_owned()).to_string(), "key abc12345");
    }
}
