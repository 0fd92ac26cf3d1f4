//! Client for the panel's REST and WebSocket APIs.
//!
//! The panel exposes two REST surfaces. The *client* API is scoped to the
//! resources of the user who owns the API key; the *application* API is the
//! administrative surface. An [`ApiClient`] is bound to one of them.
//!
//! Requests never fail because of an HTTP status. Every completed request
//! returns an [`ApiResponse`] and callers inspect `status` and the body's
//! `errors` array themselves. Only failures to complete a request at all
//! (connection refused, timeout, unreadable body) are reported as [`Error`].

use std::{fmt, time::Duration};

use panel_config::ConfigurationSnapshot;
use reqwest::{
    Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;

pub mod errors;
pub use errors::Error;

mod response;
pub use response::{ApiResponse, safe_stringify};

pub mod retry;
pub use retry::{backoff_delay, with_retry, with_timeout};

pub mod token;
pub use token::{TokenClaims, is_jwt_format};

pub mod websocket;
pub use websocket::{
    AuthOutcome, EventKind, PanelEvent, SessionMessage, WebSocketApiClient, WebSocketCredentials,
    WebSocketSession,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Media type the panel expects in the `Accept` header.
pub const PANEL_MEDIA_TYPE: &str = "Application/vnd.pterodactyl.v1+json";

/// Longest request or response body printed in verbose mode.
const VERBOSE_BODY_LIMIT: usize = 1000;

/// Which REST surface a client is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiScope {
    /// User-scoped surface under `/api/client`.
    Client,
    /// Administrative surface under `/api/application`.
    Application,
}

impl fmt::Display for ApiScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiScope::Client => f.write_str("Client"),
            ApiScope::Application => f.write_str("Application"),
        }
    }
}

/// HTTP client bound to one API scope and credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    scope: ApiScope,
    timeout: Duration,
    verbose: bool,
}

impl ApiClient {
    /// Build a client for `scope` against `base_url`.
    ///
    /// Every request carries the bearer credential, the panel media type and a
    /// JSON content type, and is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the key cannot be used as a
    /// header value and [`Error::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(
        scope: ApiScope,
        base_url: &Url,
        api_key: &SecretString,
        timeout: Duration,
        verbose: bool,
    ) -> Result<Self, Error> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .map_err(|_| Error::InvalidCredential)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(PANEL_MEDIA_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            scope,
            timeout,
            verbose,
        })
    }

    /// Client bound to the user-scope credential.
    pub fn client_api(config: &ConfigurationSnapshot) -> Result<Self, Error> {
        Self::new(
            ApiScope::Client,
            config.panel_url(),
            config.client_api_key(),
            config.request_timeout(),
            config.verbose(),
        )
    }

    /// Client bound to the admin-scope credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] when no admin credential is set.
    /// Callers skip admin-scope work in that case.
    pub fn application_api(config: &ConfigurationSnapshot) -> Result<Self, Error> {
        let api_key = config.application_api_key().ok_or(Error::NotConfigured {
            scope: ApiScope::Application,
        })?;

        Self::new(
            ApiScope::Application,
            config.panel_url(),
            api_key,
            config.request_timeout(),
            config.verbose(),
        )
    }

    pub fn scope(&self) -> ApiScope {
        self.scope
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for a panel path such as `/api/client/account`.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request and normalize the response.
    ///
    /// Non-2xx statuses are returned as ordinary responses.
    #[instrument(skip(self, body), fields(scope = %self.scope))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        if self.verbose {
            debug!(method = %method, path = path, "Sending request");
            if let Some(body) = body {
                debug!(body = %safe_stringify(body, VERBOSE_BODY_LIMIT), "Request body");
            }
        }

        let mut builder = self.http.request(method.clone(), self.url_for(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(method = %method, path = path, "Request timed out");
                return Err(Error::Timeout {
                    timeout: self.timeout,
                });
            }
            Err(e) => {
                if self.verbose {
                    error!(method = %method, path = path, error = %e, "Request error");
                }
                return Err(Error::Transport(e));
            }
        };

        let response = ApiResponse::from_reqwest(response).await?;

        if self.verbose {
            debug!(
                status = response.status,
                status_text = %response.status_text,
                "Received response"
            );
            if !response.data.is_null() {
                debug!(
                    body = %safe_stringify(&response.data, VERBOSE_BODY_LIMIT),
                    "Response body"
                );
            }
        }

        Ok(response)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, Error> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, Error> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, Error> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(Method::DELETE, path, None).await
    }

    /// Check that the API answers at `path`.
    ///
    /// Client errors (4xx) still count as reachable; server errors and
    /// transport failures do not.
    pub async fn test_connection(&self, path: &str) -> bool {
        match self.get(path).await {
            Ok(response) => response.status < 500,
            Err(e) => {
                error!(scope = %self.scope, path = path, error = %e, "Failed to connect to API");
                false
            }
        }
    }
}
