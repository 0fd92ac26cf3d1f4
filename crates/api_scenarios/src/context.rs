//! Shared state handed to every scenario.

use std::sync::{Arc, Mutex, PoisonError};

use panel_client::{ApiClient, Error as ClientError, WebSocketApiClient};
use panel_config::{ConfigurationSnapshot, TestCategory};
use test_cleanup::{CleanupRegistry, TrackedResource};
use tracing::{debug, info};

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Clients, configuration and cleanup registry for one run.
///
/// The server identifier discovered by the server listing is kept here so
/// later scenarios can use it when `TEST_SERVER_ID` is not configured.
pub struct TestContext {
    config: Arc<ConfigurationSnapshot>,
    client: ApiClient,
    application: Option<ApiClient>,
    websocket: WebSocketApiClient,
    registry: Arc<CleanupRegistry>,
    discovered_server: Mutex<Option<String>>,
}

impl TestContext {
    /// Build the clients for `config`.
    ///
    /// A missing admin credential leaves the application client unset.
    ///
    /// # Errors
    ///
    /// Returns the client construction error for anything other than a
    /// missing admin credential.
    pub fn new(
        config: Arc<ConfigurationSnapshot>,
        registry: Arc<CleanupRegistry>,
    ) -> Result<Self, ClientError> {
        let client = ApiClient::client_api(&config)?;
        let application = match ApiClient::application_api(&config) {
            Ok(application) => Some(application),
            Err(ClientError::NotConfigured { scope }) => {
                info!(scope = %scope, "Admin credential not configured");
                None
            }
            Err(e) => return Err(e),
        };
        let websocket = WebSocketApiClient::new(client.clone());

        Ok(Self {
            config,
            client,
            application,
            websocket,
            registry,
            discovered_server: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ConfigurationSnapshot {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn application(&self) -> Option<&ApiClient> {
        self.application.as_ref()
    }

    pub fn websocket(&self) -> &WebSocketApiClient {
        &self.websocket
    }

    pub fn registry(&self) -> &Arc<CleanupRegistry> {
        &self.registry
    }

    pub fn should_skip(&self, category: TestCategory) -> bool {
        self.config.should_skip(category)
    }

    /// Hand a created resource to the cleanup registry.
    pub fn track(&self, resource: TrackedResource) {
        self.registry.track(resource);
    }

    /// Server to run server-scoped scenarios against: the configured one,
    /// otherwise the first one the listing returned.
    pub fn server_id(&self) -> Option<String> {
        if let Some(configured) = self.config.test_server_id() {
            return Some(configured.to_string());
        }
        self.discovered_server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remember `identifier` unless a server is already known.
    pub fn record_server(&self, identifier: &str) {
        let mut discovered = self
            .discovered_server
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if discovered.is_none() {
            debug!(server = identifier, "Recorded server for later scenarios");
            *discovered = Some(identifier.to_string());
        }
    }

    /// Value for the `Origin` header of console connections.
    pub fn origin(&self) -> String {
        self.config
            .panel_url()
            .as_str()
            .trim_end_matches('/')
            .to_string()
    }
}
