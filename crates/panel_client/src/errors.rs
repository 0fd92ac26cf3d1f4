//! Error types for panel client operations.
//!
//! HTTP error statuses are *not* errors: every completed request yields an
//! [`ApiResponse`](crate::ApiResponse) whatever its status. The variants here
//! cover failures to complete a request at all, missing configuration, and the
//! WebSocket token/handshake flow.

use std::time::Duration;

use crate::ApiScope;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur while talking to the panel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The credential for the requested API scope is not configured.
    ///
    /// Callers treat this as "skip the admin-scope scenarios", not as a fatal
    /// error for the run.
    #[error("{scope} API key not configured")]
    NotConfigured { scope: ApiScope },

    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidCredential,

    /// The WebSocket credentials endpoint did not answer with HTTP 200.
    #[error("Failed to get WebSocket token: {status} {status_text}")]
    TokenFetch { status: u16, status_text: String },

    /// A bounded operation did not finish in time.
    #[error("Operation timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// The request could not be sent or its body could not be read.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to deserialize response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The response completed but did not have the documented shape.
    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),

    /// The token is not a three-part JWT with a JSON payload.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
