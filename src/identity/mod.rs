//! HTTP client for the identity server.
//!
//! Two endpoints are used, both authenticated with the static API key as a
//! bearer token:
//!
//! - `POST /api/citizens/change-password` completes an account activation.
//! - `POST /api/citizens/login` checks citizen credentials.
//!
//! The server answers with a [`MessageResponse`]. A non-2xx status becomes
//! [`IdentityError::Rejected`] carrying the server's message, anything that
//! prevents getting a response at all becomes [`IdentityError::Transport`].
//! Calls are never retried.

use crate::APP_USER_AGENT;
use anyhow::Result;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

pub const CHANGE_PASSWORD_PATH: &str = "/api/citizens/change-password";
pub const LOGIN_PATH: &str = "/api/citizens/login";

/// `message` value the identity server uses to accept a login.
pub const AUTHORIZED: &str = "authorized";

const MODE_ACTIVATION_CODE: &str = "activationCode";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: Url,
    pub api_key: SecretString,
}

impl IdentityConfig {
    #[must_use]
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self { base_url, api_key }
    }
}

/// Response envelope of the identity server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a change-password request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword<'a> {
    mode: &'static str,
    value: &'a str,
    old_password: &'a str,
    new_password: &'a str,
}

impl<'a> ChangePassword<'a> {
    /// Change the password of the account identified by an activation code.
    #[must_use]
    pub fn activation_code(code: &'a str, old_password: &'a str, new_password: &'a str) -> Self {
        Self {
            mode: MODE_ACTIVATION_CODE,
            value: code,
            old_password,
            new_password,
        }
    }
}

/// Login credentials, forwarded to the identity server untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoginPayload(pub serde_json::Value);

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// `true` only when the identity server said `authorized`.
#[must_use]
pub fn is_authorized(response: &MessageResponse) -> bool {
    response.message.as_deref() == Some(AUTHORIZED)
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    config: IdentityConfig,
}

impl IdentityClient {
    /// Build a client for the identity server.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Join an API path onto the configured base URL, keeping any path prefix.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Complete an account activation.
    ///
    /// # Errors
    /// Returns `IdentityError::Rejected` on a non-2xx answer and
    /// `IdentityError::Transport` when no answer could be obtained.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        request: &ChangePassword<'_>,
    ) -> Result<MessageResponse, IdentityError> {
        self.post(CHANGE_PASSWORD_PATH, request).await
    }

    /// Forward a login to the identity server.
    ///
    /// # Errors
    /// Same as [`IdentityClient::change_password`].
    #[instrument(skip_all)]
    pub async fn login(&self, payload: &LoginPayload) -> Result<MessageResponse, IdentityError> {
        self.post(LOGIN_PATH, payload).await
    }

    /// Login proxy: any failure collapses to `false`.
    pub async fn authenticate(&self, payload: &LoginPayload) -> bool {
        match self.login(payload).await {
            Ok(response) => is_authorized(&response),
            Err(e) => {
                debug!("Login not authorized: {e}");

                false
            }
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<MessageResponse, IdentityError> {
        let url = self.endpoint_url(path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Error calling {url}: {e}");

                IdentityError::Transport(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<MessageResponse>(&text).ok();

        if status.is_success() {
            debug!("{url} - {status}, {text}");

            return Ok(parsed.unwrap_or_default());
        }

        error!("{url} - {status}, {text}");

        let message = parsed
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.to_string());

        Err(IdentityError::Rejected { status, message })
    }
}
