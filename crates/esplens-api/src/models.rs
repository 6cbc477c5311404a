// Wire types for the dashboard API
//
// Shapes mirror the server's serializers. Timestamps arrive as ISO-8601
// with offsets; image references arrive as URL strings that may be
// server-relative or absolute depending on storage backend.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capture configuration, either device-wide or bound to one API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Fire the onboard flash LED during capture.
    pub flash_enabled: bool,
    /// Seconds between capture cycles.
    pub delay_seconds: u32,
    /// Model the analysis endpoint uses when the upload names none.
    pub default_model: String,
    /// Extra context prepended to the vision prompt. May be empty.
    #[serde(default)]
    pub prompt_context: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update for [`DeviceConfig`]. `None` fields are omitted from the
/// request body and keep their server-side value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_context: Option<String>,
}

impl DeviceConfigPatch {
    /// True when no field is set; sending such a patch is a no-op.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flash_enabled.is_none()
            && self.delay_seconds.is_none()
            && self.default_model.is_none()
            && self.prompt_context.is_none()
    }
}

/// One entry from the analysis model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
}

/// A registered device API key as the list endpoint reports it.
/// The secret itself is never included here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Short public identifier; also the path segment for per-key routes.
    pub prefix: String,
    pub name: String,
    pub created: DateTime<Utc>,
}

/// Response to key creation. `key` is the full secret and is shown exactly
/// once; the server stores only a hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub prefix: String,
    pub name: String,
    pub key: String,
    pub created: DateTime<Utc>,
}

/// One change-detection analysis from the history feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub id: Uuid,
    /// Before image, as a URL string.
    pub image1: String,
    /// After image, as a URL string.
    pub image2: String,
    #[serde(default)]
    pub model_used: String,
    /// Model output; `None` while analysis is pending or failed.
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An image file staged for upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A before/after image pair submitted for analysis.
#[derive(Debug, Clone)]
pub struct AnalysisUpload {
    pub image1: ImageFile,
    pub image2: ImageFile,
    /// Overrides the configured default model when set.
    pub model: Option<String>,
    /// Overrides the configured prompt context when set.
    pub prompt_context: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn patch_omits_unset_fields() {
        let patch = DeviceConfigPatch {
            flash_enabled: Some(false),
            ..DeviceConfigPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({"flash_enabled": false}));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let patch = DeviceConfigPatch::default();
        assert!(patch.is_empty());
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }

    #[test]
    fn analysis_entry_accepts_null_description() {
        let entry: AnalysisEntry = serde_json::from_value(serde_json::json!({
            "id": "8a6e0804-2bd0-4672-b79d-d97027f9071a",
            "image1": "/media/images/before.jpg",
            "image2": "/media/images/after.jpg",
            "model_used": "gpt-4o-mini",
            "description": null,
            "created_at": "2025-06-01T12:30:00Z"
        }))
        .unwrap();
        assert!(entry.description.is_none());
        assert_eq!(entry.model_used, "gpt-4o-mini");
    }

    #[test]
    fn device_config_round_trips() {
        let config: DeviceConfig = serde_json::from_value(serde_json::json!({
            "flash_enabled": true,
            "delay_seconds": 10,
            "default_model": "gpt-4o-mini",
            "prompt_context": "",
            "updated_at": "2025-06-01T12:30:00Z"
        }))
        .unwrap();
        assert!(config.flash_enabled);
        assert_eq!(config.delay_seconds, 10);
    }
}
