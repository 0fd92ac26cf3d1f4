//! Registry of resources created by a test run.

use std::{
    collections::HashMap,
    fmt,
    ops::AddAssign,
    sync::{Mutex, PoisonError},
};

use panel_client::{ApiClient, ApiResponse, Error as ClientError};
use panel_config::ConfigurationSnapshot;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// Kinds of resource the harness can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    File,
    Backup,
    Schedule,
    Database,
    Server,
    User,
    ApiKey,
}

impl ResourceKind {
    /// Drain order: resources that live on a server go before the server,
    /// servers before the users that own them, API keys last.
    pub const DRAIN_ORDER: [ResourceKind; 7] = [
        ResourceKind::File,
        ResourceKind::Backup,
        ResourceKind::Schedule,
        ResourceKind::Database,
        ResourceKind::Server,
        ResourceKind::User,
        ResourceKind::ApiKey,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Backup => "backup",
            ResourceKind::Schedule => "schedule",
            ResourceKind::Database => "database",
            ResourceKind::Server => "server",
            ResourceKind::User => "user",
            ResourceKind::ApiKey => "api key",
        }
    }

    /// Whether deletion needs the admin-scope client.
    pub fn requires_admin(self) -> bool {
        matches!(self, ResourceKind::Server | ResourceKind::User)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resource created by a scenario that must be deleted at teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedResource {
    ApiKey { identifier: String },
    User { id: u64 },
    Server { id: u64 },
    Database { server: String, id: String },
    Schedule { server: String, id: u64 },
    Backup { server: String, uuid: String },
    File { server: String, path: String },
}

/// The request that deletes a tracked resource.
#[derive(Debug, Clone, PartialEq)]
enum DeletionCall {
    Delete(String),
    Post(String, Value),
}

impl TrackedResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            TrackedResource::ApiKey { .. } => ResourceKind::ApiKey,
            TrackedResource::User { .. } => ResourceKind::User,
            TrackedResource::Server { .. } => ResourceKind::Server,
            TrackedResource::Database { .. } => ResourceKind::Database,
            TrackedResource::Schedule { .. } => ResourceKind::Schedule,
            TrackedResource::Backup { .. } => ResourceKind::Backup,
            TrackedResource::File { .. } => ResourceKind::File,
        }
    }

    fn deletion_call(&self) -> DeletionCall {
        match self {
            TrackedResource::ApiKey { identifier } => {
                DeletionCall::Delete(format!("/api/client/account/api-keys/{identifier}"))
            }
            TrackedResource::User { id } => {
                DeletionCall::Delete(format!("/api/application/users/{id}"))
            }
            TrackedResource::Server { id } => {
                DeletionCall::Delete(format!("/api/application/servers/{id}"))
            }
            TrackedResource::Database { server, id } => {
                DeletionCall::Delete(format!("/api/client/servers/{server}/databases/{id}"))
            }
            TrackedResource::Schedule { server, id } => {
                DeletionCall::Delete(format!("/api/client/servers/{server}/schedules/{id}"))
            }
            TrackedResource::Backup { server, uuid } => {
                DeletionCall::Delete(format!("/api/client/servers/{server}/backups/{uuid}"))
            }
            TrackedResource::File { server, path } => DeletionCall::Post(
                format!("/api/client/servers/{server}/files/delete"),
                json!({ "root": "/", "files": [path] }),
            ),
        }
    }
}

impl fmt::Display for TrackedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedResource::ApiKey { identifier } => write!(f, "API key {identifier}"),
            TrackedResource::User { id } => write!(f, "user {id}"),
            TrackedResource::Server { id } => write!(f, "server {id}"),
            TrackedResource::Database { server, id } => {
                write!(f, "database {id} on server {server}")
            }
            TrackedResource::Schedule { server, id } => {
                write!(f, "schedule {id} on server {server}")
            }
            TrackedResource::Backup { server, uuid } => {
                write!(f, "backup {uuid} on server {server}")
            }
            TrackedResource::File { server, path } => write!(f, "file {path} on server {server}"),
        }
    }
}

/// Counts from one drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSummary {
    pub attempted: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl CleanupSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl AddAssign for CleanupSummary {
    fn add_assign(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}

/// Resources awaiting deletion, grouped by kind.
///
/// Shared behind an `Arc` between the runner and the signal handler task.
/// The lists are only locked to push or take entries, never across a
/// request.
#[derive(Debug)]
pub struct CleanupRegistry {
    client: ApiClient,
    application: Option<ApiClient>,
    safe_mode: bool,
    pending: Mutex<HashMap<ResourceKind, Vec<TrackedResource>>>,
}

impl CleanupRegistry {
    pub fn new(client: ApiClient, application: Option<ApiClient>, safe_mode: bool) -> Self {
        Self {
            client,
            application,
            safe_mode,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Build the registry's clients from `config`.
    ///
    /// A missing admin credential is not an error; user and server entries
    /// then fail at drain time.
    pub fn from_config(config: &ConfigurationSnapshot) -> Result<Self, ClientError> {
        let client = ApiClient::client_api(config)?;
        let application = match ApiClient::application_api(config) {
            Ok(application) => Some(application),
            Err(ClientError::NotConfigured { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(Self::new(client, application, config.safe_mode()))
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Record a resource for deletion at teardown.
    pub fn track(&self, resource: TrackedResource) {
        debug!(resource = %resource, "Tracking resource for cleanup");
        let kind = resource.kind();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(resource);
    }

    /// Number of entries of `kind` still awaiting deletion.
    pub fn pending(&self, kind: ResourceKind) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .all(Vec::is_empty)
    }

    /// Delete every entry of `kind` and clear its list.
    ///
    /// Each entry is attempted exactly once; failures are logged and counted,
    /// never returned. In safe mode nothing is sent and the entries are
    /// discarded.
    pub async fn drain(&self, kind: ResourceKind) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        let entries = std::mem::take(
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(kind)
                .or_default(),
        );
        if self.safe_mode {
            if !entries.is_empty() {
                debug!(
                    kind = %kind,
                    discarded = entries.len(),
                    "Safe mode, discarding tracked resources"
                );
            }
            return summary;
        }

        for resource in entries {
            summary.attempted += 1;
            if self.delete(&resource).await {
                summary.deleted += 1;
            } else {
                summary.failed += 1;
            }
        }

        if summary.attempted > 0 {
            info!(
                kind = %kind,
                attempted = summary.attempted,
                deleted = summary.deleted,
                failed = summary.failed,
                "Drained tracked resources"
            );
        }

        summary
    }

    /// Drain every kind in [`ResourceKind::DRAIN_ORDER`].
    pub async fn drain_all(&self) -> CleanupSummary {
        if self.safe_mode {
            info!("Safe mode enabled, skipping cleanup");
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            return CleanupSummary::default();
        }

        info!("Starting cleanup of tracked resources");
        let mut total = CleanupSummary::default();
        for kind in ResourceKind::DRAIN_ORDER {
            total += self.drain(kind).await;
        }

        info!(
            attempted = total.attempted,
            deleted = total.deleted,
            failed = total.failed,
            "Cleanup completed"
        );
        total
    }

    /// Best-effort deletion of one resource. Only HTTP 204 counts as success.
    async fn delete(&self, resource: &TrackedResource) -> bool {
        let client = if resource.kind().requires_admin() {
            match &self.application {
                Some(application) => application,
                None => {
                    warn!(
                        resource = %resource,
                        "Application API not configured, cannot delete resource"
                    );
                    return false;
                }
            }
        } else {
            &self.client
        };

        let result: Result<ApiResponse, ClientError> = match resource.deletion_call() {
            DeletionCall::Delete(path) => client.delete(&path).await,
            DeletionCall::Post(path, body) => client.post(&path, &body).await,
        };

        match result {
            Ok(response) if response.status == 204 => {
                info!(resource = %resource, "Deleted resource");
                true
            }
            Ok(response) => {
                warn!(
                    resource = %resource,
                    status = response.status,
                    "Failed to delete resource"
                );
                false
            }
            Err(e) => {
                error!(resource = %resource, error = %e, "Error deleting resource");
                false
            }
        }
    }
}
