//! Test utilities shared by the scenario suite and the cleanup tools.
//!
//! Everything the harness creates on a panel is named with a `test-` prefix
//! (see [`generate_test_id`]) so that leftovers from aborted runs can be
//! recognised and swept later.

use std::{
    future::Future,
    sync::LazyLock,
    time::Duration,
};

use chrono::Utc;
use regex::Regex;
use serde_json::{Value, json};
use uuid::Uuid;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Prefix of every identifier generated by the harness.
pub const TEST_ID_PREFIX: &str = "test-";

/// Description given to every client API key the harness creates.
pub const TEST_KEY_DESCRIPTION: &str = "API Test Key - Auto Generated";

/// IP allow-list given to harness-created API keys.
pub const TEST_KEY_ALLOWED_IPS: &[&str] = &["127.0.0.1"];

static TEST_ID_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^test-\d{13,}-[a-z0-9]{9}$").expect("test id pattern is valid")
});

/// Generate a unique identifier for a test resource.
///
/// Format: `test-{unix millis}-{9 lowercase alphanumerics}`.
///
/// ```
/// let id = test_utils::generate_test_id();
/// assert!(test_utils::is_test_id(&id));
/// ```
pub fn generate_test_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random_suffix = &Uuid::new_v4().simple().to_string()[..9];
    format!("{TEST_ID_PREFIX}{millis}-{random_suffix}")
}

/// Whether `name` was produced by [`generate_test_id`].
pub fn is_test_id(name: &str) -> bool {
    TEST_ID_FORMAT.is_match(name)
}

/// Whether `email` has a generated test id as its local part.
pub fn is_test_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| is_test_id(local) && !domain.is_empty())
}

/// Poll `condition` every `interval` until it returns true or `timeout`
/// elapses. Returns whether the condition was met.
pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = tokio::time::Instant::now();
    while started.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Body for `POST /api/client/account/api-keys`.
pub fn api_key_payload() -> Value {
    json!({
        "description": TEST_KEY_DESCRIPTION,
        "allowed_ips": TEST_KEY_ALLOWED_IPS,
    })
}

/// Body for `POST /api/application/users`. Username and email both carry
/// `test_id`.
pub fn user_payload(test_id: &str) -> Value {
    json!({
        "username": test_id,
        "email": format!("{test_id}@example.com"),
        "first_name": "API",
        "last_name": "Test",
        "password": "TempTestPassword123!",
    })
}

/// A user body the panel must reject with 422.
pub fn invalid_user_payload() -> Value {
    json!({
        "username": "",
        "email": "not-an-email",
    })
}

/// Body for `POST /api/client/servers/{server}/databases`.
pub fn database_payload() -> Value {
    json!({
        "database": format!("test_db_{}", Utc::now().timestamp_millis()),
        "remote": "%",
    })
}
