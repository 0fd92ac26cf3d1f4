//! Inspection of the short-lived WebSocket tokens issued by the panel.
//!
//! The harness never verifies token signatures; it only reads the payload to
//! check the claims the panel is documented to include.

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use regex::Regex;
use serde::Deserialize;

use crate::Error;

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

static JWT_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$")
        .expect("JWT format pattern is valid")
});

/// Whether `token` has the three-segment base64url shape of a JWT.
pub fn is_jwt_format(token: &str) -> bool {
    JWT_FORMAT.is_match(token)
}

/// Claims carried by a WebSocket token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    pub server_uuid: String,
    pub user_id: u64,
    pub permissions: Vec<String>,
}

impl TokenClaims {
    /// Decode the payload segment of `token` without verifying the signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] when the token does not have three
    /// segments or the payload is not base64url, and
    /// [`Error::Deserialization`] when the payload lacks a required claim.
    pub fn decode(token: &str) -> Result<Self, Error> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(Error::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::InvalidToken(format!("payload is not base64url: {e}")))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Seconds from `now` (Unix seconds) until the token expires. Negative
    /// once expired.
    pub fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.exp - now
    }

    /// Validity window as issued, in seconds.
    pub fn lifetime(&self) -> i64 {
        self.exp - self.iat
    }
}
