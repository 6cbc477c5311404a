// Dashboard HTTP client
//
// Session-cookie authentication against the monitor dashboard. Cookies live
// in a shared jar; the CSRF token is read from that jar once after login and
// echoed back in `X-CSRFToken` on every mutating request. If the server
// rotates the token mid-session the next mutation fails with 403 and the
// caller logs in again; the client never re-reads the jar behind its back.
//
// Endpoint methods live in sibling modules (`auth`, `config`, `keys`,
// `vision`) as inherent impls on [`Client`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// Async client for the monitor dashboard API.
///
/// Cheap to share behind an `Arc`; all interior state is synchronized.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    cookie_jar: Arc<Jar>,
    /// Captured once per login, reused until the session ends.
    csrf_token: RwLock<Option<String>>,
}

impl Client {
    /// Create a client for the dashboard at `base_url`.
    ///
    /// A cookie jar is installed if the transport config carries none; the
    /// session depends on it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let cookie_jar = transport
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let config = TransportConfig {
            cookie_jar: Some(Arc::clone(&cookie_jar)),
            ..transport.clone()
        };
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
            csrf_token: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve a server path against the base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// WebSocket URL for the live log stream (`/ws/logs/`).
    ///
    /// Scheme follows the base URL: `http` becomes `ws`, `https` becomes
    /// `wss`.
    pub fn ws_url(&self) -> Result<Url, Error> {
        let mut url = self.api_url("/ws/logs/")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocket(format!("cannot derive stream URL from {url}")))?;
        Ok(url)
    }

    /// The current `Cookie` header value for the base URL, if any cookies
    /// are stored. Used to authenticate the WebSocket upgrade.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.cookie_jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(ToOwned::to_owned))
    }

    /// The CSRF token captured at login, if any.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token
            .read()
            .expect("CSRF lock poisoned")
            .clone()
    }

    /// Pull the CSRF cookie out of the jar and keep it for the session.
    /// Called after priming and after login, when the server sets or
    /// rotates the cookie.
    pub(crate) fn refresh_csrf_from_jar(&self) {
        let token = self
            .cookie_header()
            .as_deref()
            .and_then(|header| crate::cookies::cookie_value(header, CSRF_COOKIE));
        if let Some(token) = token {
            debug!("captured CSRF token from cookie jar");
            *self.csrf_token.write().expect("CSRF lock poisoned") = Some(token);
        }
    }

    pub(crate) fn clear_csrf(&self) {
        *self.csrf_token.write().expect("CSRF lock poisoned") = None;
    }

    /// Attach `X-CSRFToken` when a token is held. Mutating requests without
    /// the header are rejected by the server.
    fn apply_csrf(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.csrf_token() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }

    // ── Request helpers ──

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await.map_err(Error::Transport)?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Bytes, Error> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await.map_err(Error::Transport)?;
        let response = check_status(response).await?;
        response.bytes().await.map_err(Error::Transport)
    }

    pub(crate) async fn post_json<T, B>(&self, url: Url, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("POST {url}");
        let builder = self.apply_csrf(self.http.post(url).json(body));
        let response = builder.send().await.map_err(Error::Transport)?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    /// POST where only the status matters; the response body is dropped.
    pub(crate) async fn post_unit<B>(&self, url: Url, body: &B) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        debug!("POST {url}");
        let builder = self.apply_csrf(self.http.post(url).json(body));
        let response = builder.send().await.map_err(Error::Transport)?;
        check_status(response).await?;
        Ok(())
    }

    /// POST with an empty body, e.g. logout.
    pub(crate) async fn post_empty(&self, url: Url) -> Result<(), Error> {
        debug!("POST {url}");
        let builder = self.apply_csrf(self.http.post(url));
        let response = builder.send().await.map_err(Error::Transport)?;
        check_status(response).await?;
        Ok(())
    }

    pub(crate) async fn patch_json<T, B>(&self, url: Url, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("PATCH {url}");
        let builder = self.apply_csrf(self.http.patch(url).json(body));
        let response = builder.send().await.map_err(Error::Transport)?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");
        let builder = self.apply_csrf(self.http.delete(url));
        let response = builder.send().await.map_err(Error::Transport)?;
        check_status(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

// ── Response triage ──

/// Sort a response into the error taxonomy.
///
/// 401/403 map to [`Error::AuthRequired`] without reading the body; nothing
/// in the payload changes what the caller must do. Other non-2xx statuses
/// get their body parsed for a server message.
pub(crate) async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::AuthRequired {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(parse_error_body(status.as_u16(), &body));
    }
    Ok(response)
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let body = response.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Interpret a non-2xx body.
///
/// The server reports failures three ways: `{"detail": "..."}` (DRF),
/// `{"error": "..."}` (custom views), and `{"field": ["msg", ...]}`
/// (serializer validation). Anything else falls back to the raw status.
fn parse_error_body(status: u16, body: &str) -> Error {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = map.get("detail").and_then(Value::as_str) {
            return Error::Api {
                status,
                message: detail.to_owned(),
            };
        }
        if let Some(message) = map.get("error").and_then(Value::as_str) {
            return Error::Api {
                status,
                message: message.to_owned(),
            };
        }
        let mut errors = BTreeMap::new();
        for (field, value) in &map {
            match value {
                Value::Array(items) => {
                    let messages: Vec<String> = items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToOwned::to_owned)
                        .collect();
                    if !messages.is_empty() {
                        errors.insert(field.clone(), messages);
                    }
                }
                Value::String(message) => {
                    errors.insert(field.clone(), vec![message.clone()]);
                }
                _ => {}
            }
        }
        if !errors.is_empty() {
            return Error::Validation { errors };
        }
    }
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", preview(body))
    };
    Error::Api { status, message }
}

/// First line of a body, truncated; enough for an error message.
fn preview(body: &str) -> &str {
    let line = body.lines().next().unwrap_or_default();
    match line.char_indices().nth(200) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn detail_key_wins_over_field_map() {
        let err = parse_error_body(400, r#"{"detail": "Bad request.", "name": ["x"]}"#);
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad request.");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn error_key_is_surfaced_verbatim() {
        let err = parse_error_body(400, r#"{"error": "The username or password is incorrect."}"#);
        match err {
            Error::Api { message, .. } => {
                assert_eq!(message, "The username or password is incorrect.");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn field_map_becomes_validation_error() {
        let err = parse_error_body(400, r#"{"username": ["already taken"]}"#);
        let errors = err.field_errors().cloned().unwrap();
        assert_eq!(errors["username"], vec!["already taken"]);
    }

    #[test]
    fn non_json_body_falls_back_to_status() {
        let err = parse_error_body(502, "<html>Bad Gateway</html>");
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("502"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_reports_bare_status() {
        let err = parse_error_body(404, "");
        match err {
            Error::Api { message, .. } => assert_eq!(message, "HTTP 404"),
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn ws_url_follows_base_scheme() {
        let transport = TransportConfig::default();
        let client = Client::new(Url::parse("http://monitor.local:8000").unwrap(), &transport)
            .unwrap();
        assert_eq!(client.ws_url().unwrap().as_str(), "ws://monitor.local:8000/ws/logs/");

        let secure = Client::new(Url::parse("https://monitor.local").unwrap(), &transport)
            .unwrap();
        assert_eq!(secure.ws_url().unwrap().as_str(), "wss://monitor.local/ws/logs/");
    }
}
