// Vision endpoints
//
// Analysis model catalog, change-detection history, and media retrieval
// for the session-authenticated dashboard side, plus the device-side
// submission endpoints that authenticate with `X-Api-Key` instead of a
// session. The server refuses session-authenticated analysis submissions,
// so the device-side methods are meant for a client that never logged in.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::client::{Client, check_status, read_json};
use crate::error::Error;
use crate::models::{AnalysisEntry, AnalysisUpload, ImageFile, ModelInfo};

const API_KEY_HEADER: &str = "X-Api-Key";

impl Client {
    /// The catalog of analysis models the server accepts.
    ///
    /// `GET /api/vision/models/`
    pub async fn available_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let url = self.api_url("/api/vision/models/")?;
        debug!("fetching model catalog");
        self.get_json(url).await
    }

    /// The account's change-detection history, newest first.
    ///
    /// `GET /api/vision/logs/`
    pub async fn analysis_history(&self) -> Result<Vec<AnalysisEntry>, Error> {
        let url = self.api_url("/api/vision/logs/")?;
        debug!("fetching analysis history");
        self.get_json(url).await
    }

    /// Fetch a history image through the authenticated session.
    ///
    /// `image_url` is taken from an [`AnalysisEntry`] and may be
    /// server-relative or absolute depending on the storage backend.
    pub async fn fetch_image(&self, image_url: &str) -> Result<Bytes, Error> {
        let url = self.resolve_media_url(image_url)?;
        self.get_bytes(url).await
    }

    fn resolve_media_url(&self, image_url: &str) -> Result<Url, Error> {
        if image_url.starts_with("http://") || image_url.starts_with("https://") {
            Url::parse(image_url).map_err(Error::InvalidUrl)
        } else {
            self.api_url(image_url)
        }
    }

    // ── Device-side endpoints ──

    /// Submit a before/after image pair for analysis on behalf of a device.
    ///
    /// `POST /api/vision/logs/` (multipart)
    ///
    /// Authenticates with the device key only; the server rejects
    /// session-authenticated submissions, so call this on a client that
    /// has not logged in.
    pub async fn submit_analysis(
        &self,
        api_key: &SecretString,
        upload: AnalysisUpload,
    ) -> Result<AnalysisEntry, Error> {
        let url = self.api_url("/api/vision/logs/")?;
        debug!("submitting analysis pair");
        let mut form = Form::new()
            .part("image1", image_part(upload.image1)?)
            .part("image2", image_part(upload.image2)?);
        if let Some(model) = upload.model {
            form = form.text("model", model);
        }
        if let Some(context) = upload.prompt_context {
            form = form.text("prompt_context", context);
        }
        let response = self
            .http()
            .post(url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    /// Forward one device status line into the account's live log stream.
    ///
    /// `POST /api/vision/log/`
    pub async fn send_device_log(
        &self,
        api_key: &SecretString,
        message: &str,
    ) -> Result<(), Error> {
        let url = self.api_url("/api/vision/log/")?;
        debug!("sending device log line");
        let response = self
            .http()
            .post(url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(response).await?;
        Ok(())
    }
}

fn image_part(image: ImageFile) -> Result<Part, Error> {
    let mime = match std::path::Path::new(&image.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    };
    Part::bytes(image.bytes.to_vec())
        .file_name(image.file_name)
        .mime_str(mime)
        .map_err(Error::Transport)
}
