//! Console WebSocket scenarios.

use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use panel_client::{AuthOutcome, TokenClaims, WebSocketCredentials, is_jwt_format};
use tracing::{info, warn};

use super::no_server;
use crate::{Outcome, TestContext};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const AUTH_TIMEOUT: Duration = Duration::from_secs(15);

/// Acceptable seconds until a fresh token expires: 8 to 12 minutes.
const EXPIRY_WINDOW_SECS: RangeInclusive<i64> = 480..=720;

/// Normal closure; the daemon may end the session this way once it has
/// accepted the token.
const NORMAL_CLOSURE: u16 = 1000;

pub async fn token_format(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let credentials = ctx.websocket().get_websocket_credentials(&server).await?;

    ensure!(
        is_jwt_format(&credentials.token),
        "websocket token is not a JWT"
    );
    ensure!(
        credentials.socket.starts_with("ws://") || credentials.socket.starts_with("wss://"),
        "socket URL {} is not a WebSocket URL",
        credentials.socket
    );

    Ok(Outcome::Passed)
}

/// Fetch fresh credentials, or skip when the panel will not hand them out.
async fn fresh_credentials(
    ctx: &TestContext,
    server: &str,
) -> std::result::Result<WebSocketCredentials, Outcome> {
    ctx.websocket()
        .get_websocket_credentials(server)
        .await
        .map_err(|e| {
            warn!(server = server, error = %e, "Could not get WebSocket credentials");
            Outcome::Skipped(format!("could not get WebSocket credentials: {e}"))
        })
}

pub async fn connect_with_valid_token(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let credentials = match fresh_credentials(ctx, &server).await {
        Ok(credentials) => credentials,
        Err(outcome) => return Ok(outcome),
    };

    let session = ctx
        .websocket()
        .connect(&credentials, &ctx.origin(), CONNECT_TIMEOUT)
        .await?;
    session.close().await;

    Ok(Outcome::Passed)
}

pub async fn in_band_authentication(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let credentials = match fresh_credentials(ctx, &server).await {
        Ok(credentials) => credentials,
        Err(outcome) => return Ok(outcome),
    };

    let outcome = ctx
        .websocket()
        .open_and_authenticate(&credentials, &ctx.origin(), CONNECT_TIMEOUT, AUTH_TIMEOUT)
        .await?;

    match outcome {
        AuthOutcome::Authenticated(event) => {
            info!(event = %event.event, "WebSocket authenticated");
            Ok(Outcome::Passed)
        }
        AuthOutcome::Closed(Some(NORMAL_CLOSURE)) => Ok(Outcome::Passed),
        AuthOutcome::Rejected(event) => bail!("daemon rejected the token with '{}'", event.event),
        AuthOutcome::Closed(code) => bail!("socket closed before authentication (code {code:?})"),
    }
}

pub async fn token_expiry_window(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let token = ctx.websocket().get_websocket_token(&server).await?;
    let claims = TokenClaims::decode(&token)?;

    let remaining = claims.seconds_until_expiry(chrono::Utc::now().timestamp());
    ensure!(
        EXPIRY_WINDOW_SECS.contains(&remaining),
        "token expires in {remaining}s, expected between {} and {}",
        EXPIRY_WINDOW_SECS.start(),
        EXPIRY_WINDOW_SECS.end()
    );
    info!(seconds = remaining, "Token expiry within window");

    Ok(Outcome::Passed)
}
