//! Sweep of resources left behind by aborted runs.
//!
//! A run that is killed hard (no signal delivered, machine lost) leaves its
//! tracked resources on the panel. They are found again through the harness
//! naming conventions: API keys carry [`TEST_KEY_DESCRIPTION`], and users
//! have a generated test id as both username and email local part.

use anyhow::{Context, Result, bail};
use panel_client::{ApiClient, ApiResponse};
use panel_config::ConfigurationSnapshot;
use response_validator::{Envelope, Resource, validate_list};
use serde_json::Value;
use test_utils::{TEST_KEY_DESCRIPTION, is_test_email, is_test_id};
use tracing::{debug, info, warn};

use crate::{CleanupRegistry, CleanupSummary, TrackedResource};

#[cfg(test)]
#[path = "orphans_tests.rs"]
mod tests;

/// Upper bound on pages fetched from a paginated listing.
const MAX_PAGES: u64 = 100;

/// What a sweep found, and what deleting it achieved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub api_keys: Vec<String>,
    pub users: Vec<u64>,
    pub cleanup: CleanupSummary,
}

impl SweepReport {
    pub fn found(&self) -> usize {
        self.api_keys.len() + self.users.len()
    }
}

/// Finds and deletes orphaned harness resources.
pub struct OrphanSweeper {
    client: ApiClient,
    application: Option<ApiClient>,
}

impl OrphanSweeper {
    pub fn new(client: ApiClient, application: Option<ApiClient>) -> Self {
        Self {
            client,
            application,
        }
    }

    /// Build a sweeper from `config`.
    ///
    /// # Errors
    ///
    /// Fails in safe mode, where nothing may be deleted, and when the clients
    /// cannot be built.
    pub fn from_config(config: &ConfigurationSnapshot) -> Result<Self> {
        if config.safe_mode() {
            bail!("Refusing to sweep orphaned resources in safe mode");
        }

        let client =
            ApiClient::client_api(config).context("Failed to create client API wrapper")?;
        let application = ApiClient::application_api(config).ok();
        Ok(Self::new(client, application))
    }

    /// Whether an API key list item was created by the harness.
    pub fn is_orphaned_api_key(key: &Resource) -> bool {
        key.str_attr("description") == Some(TEST_KEY_DESCRIPTION)
    }

    /// Whether a user list item was created by the harness.
    pub fn is_orphaned_user(user: &Resource) -> bool {
        user.str_attr("username").is_some_and(is_test_id)
            && user.str_attr("email").is_some_and(is_test_email)
    }

    /// Identifiers of harness-created API keys on the client account.
    pub async fn find_orphaned_api_keys(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get("/api/client/account/api-keys")
            .await
            .context("Failed to list API keys")?;
        let items = list_items(&response).context("Unexpected API key listing")?;

        Ok(items
            .iter()
            .filter(|key| Self::is_orphaned_api_key(key))
            .filter_map(|key| key.str_attr("identifier").map(str::to_string))
            .collect())
    }

    /// Ids of harness-created users. Empty without an admin client.
    pub async fn find_orphaned_users(&self) -> Result<Vec<u64>> {
        let Some(application) = &self.application else {
            info!("Application API not configured, skipping orphaned users");
            return Ok(Vec::new());
        };

        let mut users = Vec::new();
        let mut page = 1u64;

        loop {
            debug!(page = page, "Fetching page {} of users", page);
            let response = application
                .get(&format!("/api/application/users?page={page}"))
                .await
                .context("Failed to list users")?;
            let items = list_items(&response).context("Unexpected user listing")?;

            users.extend(
                items
                    .iter()
                    .filter(|user| Self::is_orphaned_user(user))
                    .filter_map(|user| user.u64_attr("id")),
            );

            let total_pages = response
                .pointer("/meta/pagination/total_pages")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            if items.is_empty() || page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(users)
    }

    /// Find orphans and delete them through a throwaway registry.
    ///
    /// With `dry_run` set nothing is deleted and the report's cleanup counts
    /// are zero.
    pub async fn sweep(&self, dry_run: bool) -> Result<SweepReport> {
        let api_keys = self.find_orphaned_api_keys().await?;
        let users = self.find_orphaned_users().await?;

        info!(
            api_keys = api_keys.len(),
            users = users.len(),
            "Found orphaned test resources"
        );

        let mut report = SweepReport {
            api_keys,
            users,
            cleanup: CleanupSummary::default(),
        };
        if dry_run || report.found() == 0 {
            return Ok(report);
        }

        let registry = CleanupRegistry::new(self.client.clone(), self.application.clone(), false);
        for identifier in &report.api_keys {
            registry.track(TrackedResource::ApiKey {
                identifier: identifier.clone(),
            });
        }
        for id in &report.users {
            registry.track(TrackedResource::User { id: *id });
        }

        report.cleanup = registry.drain_all().await;
        if !report.cleanup.is_clean() {
            warn!(
                failed = report.cleanup.failed,
                "Some orphaned resources could not be deleted"
            );
        }
        Ok(report)
    }
}

fn list_items(response: &ApiResponse) -> Result<Vec<Resource>> {
    let violations = validate_list(response);
    if let Some(first) = violations.first() {
        bail!("{first}");
    }
    match Envelope::parse(&response.data) {
        Envelope::List { items, .. } => Ok(items),
        _ => bail!("list items are not resources"),
    }
}
