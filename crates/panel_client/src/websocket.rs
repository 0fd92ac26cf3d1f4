//! WebSocket console access for a single server.
//!
//! Access is a two-step flow. A short-lived token and the socket URL are
//! fetched from the client API, then the token is presented both as an
//! `Authorization` header on the upgrade request and as an in-band
//! `{"event":"auth","args":[token]}` message. The daemon answers with named
//! events (`auth success`, `token expiring`, `jwt error`, `status`, ...).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{
            HeaderValue,
            header::{AUTHORIZATION, ORIGIN},
        },
    },
};
use tracing::{debug, info, instrument, warn};

use crate::{ApiClient, Error, retry::with_timeout};

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;

/// Token and socket URL returned by `/api/client/servers/{server}/websocket`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebSocketCredentials {
    pub token: String,
    pub socket: String,
}

/// Classification of the events a daemon sends over the console socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AuthSuccess,
    TokenExpiring,
    TokenExpired,
    JwtError,
    AuthError,
    DaemonError,
    Status,
    Stats,
    ConsoleOutput,
    Other,
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "auth success" => EventKind::AuthSuccess,
            "token expiring" => EventKind::TokenExpiring,
            "token expired" => EventKind::TokenExpired,
            "jwt error" => EventKind::JwtError,
            "auth error" => EventKind::AuthError,
            "daemon error" => EventKind::DaemonError,
            "status" => EventKind::Status,
            "stats" => EventKind::Stats,
            "console output" => EventKind::ConsoleOutput,
            _ => EventKind::Other,
        }
    }

    /// Events that only reach an authenticated socket.
    ///
    /// `daemon error` is included: the daemon sends it after accepting the
    /// token when the server itself is unhealthy.
    pub fn confirms_authentication(self) -> bool {
        matches!(
            self,
            EventKind::AuthSuccess
                | EventKind::TokenExpiring
                | EventKind::DaemonError
                | EventKind::Status
                | EventKind::Stats
                | EventKind::ConsoleOutput
        )
    }

    pub fn rejects_authentication(self) -> bool {
        matches!(
            self,
            EventKind::JwtError | EventKind::AuthError | EventKind::TokenExpired
        )
    }
}

/// A named event received from the daemon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelEvent {
    pub event: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl PanelEvent {
    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }
}

#[derive(Serialize)]
struct OutboundEvent<'a> {
    event: &'a str,
    args: Vec<Value>,
}

/// Result of the in-band authentication exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// The daemon sent an event only an authenticated socket receives.
    Authenticated(PanelEvent),
    /// The daemon refused the token.
    Rejected(PanelEvent),
    /// The socket closed before any decisive event, with the close code if one
    /// was sent.
    Closed(Option<u16>),
}

/// What the session produced next: an event, or the end of the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    Event(PanelEvent),
    Closed(Option<u16>),
}

/// An open console socket.
pub struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    token: String,
}

impl WebSocketSession {
    /// Send a named event with arguments.
    pub async fn send_event(&mut self, event: &str, args: Vec<Value>) -> Result<(), Error> {
        let frame = serde_json::to_string(&OutboundEvent { event, args })?;
        self.stream.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    /// Wait for the next event, skipping control frames and messages that are
    /// not JSON events.
    pub async fn next_message(&mut self) -> Result<SessionMessage, Error> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Ok(SessionMessage::Closed(None));
            };

            match message? {
                Message::Text(text) => match PanelEvent::parse(text.as_str()) {
                    Ok(event) => {
                        debug!(event = %event.event, "Received WebSocket event");
                        return Ok(SessionMessage::Event(event));
                    }
                    Err(e) => warn!(error = %e, "Ignoring unparseable WebSocket message"),
                },
                Message::Close(frame) => {
                    let code = frame.map(|f| u16::from(f.code));
                    debug!(code = ?code, "WebSocket closed by server");
                    return Ok(SessionMessage::Closed(code));
                }
                _ => {}
            }
        }
    }

    /// Send the `auth` event and wait up to `timeout` for a decisive reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when no decisive event arrives in time and
    /// [`Error::WebSocket`] on protocol failures.
    pub async fn authenticate(&mut self, timeout: Duration) -> Result<AuthOutcome, Error> {
        let token = self.token.clone();
        self.send_event("auth", vec![Value::String(token)]).await?;
        with_timeout(self.await_auth_outcome(), timeout).await?
    }

    async fn await_auth_outcome(&mut self) -> Result<AuthOutcome, Error> {
        loop {
            match self.next_message().await? {
                SessionMessage::Event(event) if event.kind().confirms_authentication() => {
                    return Ok(AuthOutcome::Authenticated(event));
                }
                SessionMessage::Event(event) if event.kind().rejects_authentication() => {
                    return Ok(AuthOutcome::Rejected(event));
                }
                SessionMessage::Event(_) => {}
                SessionMessage::Closed(code) => return Ok(AuthOutcome::Closed(code)),
            }
        }
    }

    /// Close the socket with a normal closure. Errors from a peer that already
    /// went away are ignored.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close did not complete cleanly");
        }
    }
}

/// Client API wrapper with the WebSocket token operations.
#[derive(Debug, Clone)]
pub struct WebSocketApiClient {
    api: ApiClient,
}

impl WebSocketApiClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// The underlying client API wrapper.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetch a fresh token and socket URL for `server_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenFetch`] if the endpoint does not answer with
    /// HTTP 200, and [`Error::InvalidResponse`] if the body lacks `data`.
    #[instrument(skip(self))]
    pub async fn get_websocket_credentials(
        &self,
        server_id: &str,
    ) -> Result<WebSocketCredentials, Error> {
        let response = self
            .api
            .get(&format!("/api/client/servers/{server_id}/websocket"))
            .await?;

        if response.status != 200 {
            return Err(Error::TokenFetch {
                status: response.status,
                status_text: response.status_text,
            });
        }

        let data = response
            .data
            .get("data")
            .cloned()
            .ok_or_else(|| Error::InvalidResponse("websocket response has no data".to_string()))?;

        Ok(serde_json::from_value(data)?)
    }

    /// Fetch only the token for `server_id`.
    pub async fn get_websocket_token(&self, server_id: &str) -> Result<String, Error> {
        Ok(self.get_websocket_credentials(server_id).await?.token)
    }

    /// Open the console socket described by `credentials`.
    ///
    /// The upgrade request carries the token as a bearer credential and
    /// `origin` as its `Origin` header; the daemon rejects upgrades whose
    /// origin does not match the panel.
    #[instrument(skip(self, credentials), fields(socket = %credentials.socket))]
    pub async fn connect(
        &self,
        credentials: &WebSocketCredentials,
        origin: &str,
        timeout: Duration,
    ) -> Result<WebSocketSession, Error> {
        let mut request = credentials.socket.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", credentials.token))
                .map_err(|_| Error::InvalidToken("token is not a valid header value".to_string()))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(origin)
                .map_err(|_| Error::InvalidResponse(format!("invalid origin '{origin}'")))?,
        );

        let (stream, response) = with_timeout(connect_async(request), timeout).await??;
        info!(status = response.status().as_u16(), "WebSocket connection established");

        Ok(WebSocketSession {
            stream,
            token: credentials.token.clone(),
        })
    }

    /// Connect with `credentials`, authenticate, and close the socket.
    ///
    /// The socket is closed whatever the authentication outcome, including a
    /// timeout.
    pub async fn open_and_authenticate(
        &self,
        credentials: &WebSocketCredentials,
        origin: &str,
        connect_timeout: Duration,
        auth_timeout: Duration,
    ) -> Result<AuthOutcome, Error> {
        let mut session = self.connect(credentials, origin, connect_timeout).await?;
        let outcome = session.authenticate(auth_timeout).await;
        session.close().await;
        outcome
    }
}
