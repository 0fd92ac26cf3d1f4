//! Environment configuration for the panel API test harness.
//!
//! The configuration is resolved exactly once at process start into an
//! immutable [`ConfigurationSnapshot`]. API clients, the cleanup registry and
//! the scenario runner all receive the snapshot by reference; none of them
//! read the process environment again.
//!
//! Variables may also be supplied through a `.env.test` file in the working
//! directory or its parent. Values already present in the environment take
//! precedence over the file.

use std::{env, fmt, path::Path, time::Duration};

use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

mod errors;
pub use errors::ConfigurationError;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Panel base URL.
pub const PANEL_URL_VAR: &str = "PTERODACTYL_URL";
/// User-scope (client) API key.
pub const CLIENT_API_KEY_VAR: &str = "CLIENT_API_KEY";
/// Admin-scope (application) API key.
pub const APPLICATION_API_KEY_VAR: &str = "APPLICATION_API_KEY";
pub const SAFE_MODE_VAR: &str = "SAFE_MODE";
pub const DEMO_MODE_VAR: &str = "DEMO_MODE";
pub const SKIP_DESTRUCTIVE_VAR: &str = "SKIP_DESTRUCTIVE";
pub const TEST_SERVER_ID_VAR: &str = "TEST_SERVER_ID";
pub const TEST_USER_ID_VAR: &str = "TEST_USER_ID";
pub const TEST_USER_EMAIL_VAR: &str = "TEST_USER_EMAIL";
/// Per-request timeout in milliseconds.
pub const TEST_TIMEOUT_VAR: &str = "TEST_TIMEOUT";
pub const RETRY_ATTEMPTS_VAR: &str = "RETRY_ATTEMPTS";
pub const VERBOSE_VAR: &str = "VERBOSE";

/// Required prefix of user-scope credentials.
pub const CLIENT_KEY_PREFIX: &str = "ptlc_";
/// Required prefix of admin-scope credentials.
pub const APPLICATION_KEY_PREFIX: &str = "ptla_";

/// Name of the optional environment file.
pub const ENV_FILE_NAME: &str = ".env.test";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Overall mode of a test run, derived from the run-mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    /// Read-only verification; nothing is created and nothing is cleaned up.
    Safe,
    /// Read-only scenarios plus non-destructive checks.
    Partial,
    /// Every scenario, including ones that create and delete resources.
    Full,
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestMode::Safe => "SAFE",
            TestMode::Partial => "PARTIAL",
            TestMode::Full => "FULL",
        };
        f.write_str(label)
    }
}

/// Scenario categories that may be switched off by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCategory {
    /// Scenarios that create, modify or delete remote state.
    Destructive,
    /// Scenarios that need the admin-scope credential.
    Application,
    /// Scenarios that open a WebSocket connection.
    WebSocket,
}

/// Immutable configuration resolved once at process start.
///
/// Credentials are kept as [`SecretString`] so they never appear in `Debug`
/// output or log lines.
#[derive(Debug)]
pub struct ConfigurationSnapshot {
    panel_url: Url,
    client_api_key: SecretString,
    application_api_key: Option<SecretString>,
    safe_mode: bool,
    skip_destructive: bool,
    test_server_id: Option<String>,
    test_user_id: Option<String>,
    test_user_email: Option<String>,
    request_timeout: Duration,
    retry_attempts: u32,
    verbose: bool,
}

impl ConfigurationSnapshot {
    /// Resolve the configuration from `.env.test` files and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when a required variable is missing or
    /// malformed, or when an environment file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigurationError> {
        load_env_files()?;
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    ///
    /// Empty and whitespace-only values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let flag = |name: &str| read(name).is_some_and(|value| is_truthy(&value));

        let panel_url = read(PANEL_URL_VAR);
        let client_api_key = read(CLIENT_API_KEY_VAR);

        let missing: Vec<String> = [
            (PANEL_URL_VAR, panel_url.is_none()),
            (CLIENT_API_KEY_VAR, client_api_key.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(panel_url), Some(client_api_key)) = (panel_url, client_api_key) else {
            return Err(ConfigurationError::MissingVariables { names: missing });
        };

        let panel_url = parse_panel_url(&panel_url)?;
        require_prefix(CLIENT_API_KEY_VAR, &client_api_key, CLIENT_KEY_PREFIX)?;

        let application_api_key = read(APPLICATION_API_KEY_VAR);
        if let Some(key) = &application_api_key {
            require_prefix(APPLICATION_API_KEY_VAR, key, APPLICATION_KEY_PREFIX)?;
        }

        let demo_mode = flag(DEMO_MODE_VAR);
        let timeout_ms = parse_number(TEST_TIMEOUT_VAR, read(TEST_TIMEOUT_VAR), DEFAULT_TIMEOUT_MS)?;
        let retry_attempts = parse_number(
            RETRY_ATTEMPTS_VAR,
            read(RETRY_ATTEMPTS_VAR),
            DEFAULT_RETRY_ATTEMPTS,
        )?;

        Ok(Self {
            panel_url,
            client_api_key: SecretString::from(client_api_key),
            application_api_key: application_api_key.map(SecretString::from),
            safe_mode: flag(SAFE_MODE_VAR) || demo_mode,
            skip_destructive: flag(SKIP_DESTRUCTIVE_VAR) || demo_mode,
            test_server_id: read(TEST_SERVER_ID_VAR),
            test_user_id: read(TEST_USER_ID_VAR),
            test_user_email: read(TEST_USER_EMAIL_VAR),
            request_timeout: Duration::from_millis(timeout_ms),
            retry_attempts,
            verbose: flag(VERBOSE_VAR),
        })
    }

    pub fn panel_url(&self) -> &Url {
        &self.panel_url
    }

    pub fn client_api_key(&self) -> &SecretString {
        &self.client_api_key
    }

    pub fn application_api_key(&self) -> Option<&SecretString> {
        self.application_api_key.as_ref()
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn skip_destructive(&self) -> bool {
        self.skip_destructive
    }

    pub fn test_server_id(&self) -> Option<&str> {
        self.test_server_id.as_deref()
    }

    pub fn test_user_id(&self) -> Option<&str> {
        self.test_user_id.as_deref()
    }

    pub fn test_user_email(&self) -> Option<&str> {
        self.test_user_email.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Attempts given to retried operations such as the preflight connection checks.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The run mode implied by the flags. Safe mode wins over skip-destructive.
    pub fn test_mode(&self) -> TestMode {
        if self.safe_mode {
            TestMode::Safe
        } else if self.skip_destructive {
            TestMode::Partial
        } else {
            TestMode::Full
        }
    }

    /// Whether scenarios of the given category must be skipped in this run.
    pub fn should_skip(&self, category: TestCategory) -> bool {
        match category {
            TestCategory::Destructive => self.safe_mode || self.skip_destructive,
            TestCategory::Application => self.application_api_key.is_none(),
            TestCategory::WebSocket => self.safe_mode,
        }
    }

    /// Log the non-secret parts of the snapshot.
    pub fn log_summary(&self) {
        info!(
            panel_url = %self.panel_url,
            mode = %self.test_mode(),
            application_api = self.application_api_key.is_some(),
            test_server_id = self.test_server_id.as_deref().unwrap_or("<discover>"),
            timeout_ms = self.request_timeout.as_millis() as u64,
            retry_attempts = self.retry_attempts,
            verbose = self.verbose,
            "Loaded test configuration"
        );
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_panel_url(value: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|e| ConfigurationError::InvalidPanelUrl {
        variable: PANEL_URL_VAR.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigurationError::UnsupportedScheme {
            variable: PANEL_URL_VAR.to_string(),
            scheme: other.to_string(),
        }),
    }
}

fn require_prefix(variable: &str, value: &str, prefix: &str) -> Result<(), ConfigurationError> {
    if value.starts_with(prefix) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidCredentialPrefix {
            variable: variable.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

fn parse_number<T>(variable: &str, value: Option<String>, default: T) -> Result<T, ConfigurationError>
where
    T: std::str::FromStr,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigurationError::InvalidNumber {
            variable: variable.to_string(),
            value: raw,
        }),
    }
}

/// Load `.env.test` from the working directory and its parent, if present.
fn load_env_files() -> Result<(), ConfigurationError> {
    let Ok(cwd) = env::current_dir() else {
        return Ok(());
    };

    for dir in [cwd.as_path(), cwd.parent().unwrap_or(Path::new(".."))] {
        let path = dir.join(ENV_FILE_NAME);
        match dotenvy::from_path(&path) {
            Ok(()) => debug!(path = %path.display(), "Loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigurationError::EnvFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(())
}
