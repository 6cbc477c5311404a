// Session authentication endpoints
//
// Login and registration first GET the HTML login page so the server seeds
// the `csrftoken` cookie, mirroring how a browser arrives at these forms.
// The token captured after login is the one reused for the whole session.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::Client;
use crate::error::Error;

impl Client {
    /// Establish a session for `username`.
    ///
    /// `POST /api/auth/login/`
    ///
    /// Bad credentials surface as [`Error::Api`] with the server's message.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.prime_session().await?;
        let url = self.api_url("/api/auth/login/")?;
        debug!("logging in as {username}");
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        self.post_unit(url, &body).await?;
        // The server rotates the CSRF cookie when the session is created;
        // capture the rotated value for the rest of the session.
        self.refresh_csrf_from_jar();
        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `POST /api/auth/logout/`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("/api/auth/logout/")?;
        debug!("logging out");
        self.post_empty(url).await?;
        self.clear_csrf();
        Ok(())
    }

    /// Create a new account. Does not log in.
    ///
    /// `POST /api/auth/register/`
    ///
    /// Serializer rejections (taken username, mismatched passwords) surface
    /// as [`Error::Validation`] with per-field messages.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<(), Error> {
        self.prime_session().await?;
        let url = self.api_url("/api/auth/register/")?;
        debug!("registering account {username}");
        let body = json!({
            "username": username,
            "email": email,
            "password": password.expose_secret(),
            "confirmPassword": confirm_password.expose_secret(),
        });
        self.post_unit(url, &body).await
    }

    /// GET the login page so the server sets the `csrftoken` cookie, then
    /// capture it. The page body itself is irrelevant.
    async fn prime_session(&self) -> Result<(), Error> {
        let url = self.api_url("/auth/login/")?;
        debug!("priming CSRF cookie via {url}");
        self.http().get(url).send().await.map_err(Error::Transport)?;
        self.refresh_csrf_from_jar();
        Ok(())
    }
}
