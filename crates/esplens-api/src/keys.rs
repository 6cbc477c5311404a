// API key management endpoints
//
// List, create, and revoke device keys. The create response is the only
// time the full secret appears; afterwards a key is addressed solely by
// its prefix.

use serde_json::json;
use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::{ApiKey, CreatedApiKey};

/// Name given to keys created with a blank name.
pub const DEFAULT_KEY_NAME: &str = "new-esp32-device";

impl Client {
    /// List the account's active keys. Secrets are never included.
    ///
    /// `GET /api/auth/api-keys/`
    pub async fn api_keys(&self) -> Result<Vec<ApiKey>, Error> {
        let url = self.api_url("/api/auth/api-keys/")?;
        debug!("listing API keys");
        self.get_json(url).await
    }

    /// Create a key and return its one-time secret. A blank or
    /// whitespace-only name falls back to [`DEFAULT_KEY_NAME`].
    ///
    /// `POST /api/auth/api-keys/`
    pub async fn create_api_key(&self, name: &str) -> Result<CreatedApiKey, Error> {
        let name = name.trim();
        let name = if name.is_empty() { DEFAULT_KEY_NAME } else { name };
        let url = self.api_url("/api/auth/api-keys/")?;
        debug!("creating API key {name:?}");
        self.post_json(url, &json!({ "name": name })).await
    }

    /// Revoke the key addressed by `prefix`. An unknown prefix yields a
    /// 404 [`Error::Api`].
    ///
    /// `DELETE /api/auth/api-keys/{prefix}/`
    pub async fn delete_api_key(&self, prefix: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("/api/auth/api-keys/{prefix}/"))?;
        debug!("deleting API key {prefix}");
        self.delete(url).await
    }
}
