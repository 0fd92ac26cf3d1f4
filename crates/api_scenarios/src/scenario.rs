//! The scenario catalogue and the outcome of running one scenario.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use panel_config::TestCategory;

use crate::TestContext;
use crate::scenarios::{application, client, websocket};

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;

/// Scenario groups selectable with `--group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ScenarioGroup {
    Client,
    Application,
    #[value(name = "websocket")]
    WebSocket,
}

impl fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioGroup::Client => f.write_str("client"),
            ScenarioGroup::Application => f.write_str("application"),
            ScenarioGroup::WebSocket => f.write_str("websocket"),
        }
    }
}

/// How a scenario ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Skipped(String),
    Failed(String),
}

impl Outcome {
    /// Short label used in log lines and the report.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASS",
            Outcome::Skipped(_) => "SKIP",
            Outcome::Failed(_) => "FAIL",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Skip or failure reason.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Skipped(reason) | Outcome::Failed(reason) => Some(reason),
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Every scenario the suite knows, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    // Client API
    AccountDetails,
    ListApiKeys,
    CreateApiKey,
    TwoFactorQrCode,
    ListServers,
    ServerDetails,
    ServerResources,
    WebSocketCredentials,
    ListFiles,
    FileUploadUrl,
    ListDatabases,
    CreateDatabase,
    ListAllocations,
    ListSubusers,
    ListBackups,
    ListSchedules,
    ClientUnknownEndpoint,
    InvalidServerIdentifier,

    // Application API
    ListUsers,
    CreateUser,
    UserDetails,
    ApplicationListServers,
    ApplicationServerDetails,
    ApplicationServerDatabases,
    ListNodes,
    NodeDetails,
    NodeConfiguration,
    ListLocations,
    ListNests,
    NestEggs,
    ApplicationUnknownEndpoint,
    UnknownUser,
    InvalidUserPayload,

    // WebSocket
    TokenFormat,
    ConnectWithValidToken,
    InBandAuthentication,
    TokenExpiryWindow,
}

impl Scenario {
    pub const ALL: [Scenario; 37] = [
        Scenario::AccountDetails,
        Scenario::ListApiKeys,
        Scenario::CreateApiKey,
        Scenario::TwoFactorQrCode,
        Scenario::ListServers,
        Scenario::ServerDetails,
        Scenario::ServerResources,
        Scenario::WebSocketCredentials,
        Scenario::ListFiles,
        Scenario::FileUploadUrl,
        Scenario::ListDatabases,
        Scenario::CreateDatabase,
        Scenario::ListAllocations,
        Scenario::ListSubusers,
        Scenario::ListBackups,
        Scenario::ListSchedules,
        Scenario::ClientUnknownEndpoint,
        Scenario::InvalidServerIdentifier,
        Scenario::ListUsers,
        Scenario::CreateUser,
        Scenario::UserDetails,
        Scenario::ApplicationListServers,
        Scenario::ApplicationServerDetails,
        Scenario::ApplicationServerDatabases,
        Scenario::ListNodes,
        Scenario::NodeDetails,
        Scenario::NodeConfiguration,
        Scenario::ListLocations,
        Scenario::ListNests,
        Scenario::NestEggs,
        Scenario::ApplicationUnknownEndpoint,
        Scenario::UnknownUser,
        Scenario::InvalidUserPayload,
        Scenario::TokenFormat,
        Scenario::ConnectWithValidToken,
        Scenario::InBandAuthentication,
        Scenario::TokenExpiryWindow,
    ];

    /// Scenarios belonging to any of `groups`, in run order. An empty slice
    /// selects everything.
    pub fn selected(groups: &[ScenarioGroup]) -> Vec<Scenario> {
        Self::ALL
            .into_iter()
            .filter(|scenario| groups.is_empty() || groups.contains(&scenario.group()))
            .collect()
    }

    pub fn group(self) -> ScenarioGroup {
        use Scenario::*;
        match self {
            AccountDetails | ListApiKeys | CreateApiKey | TwoFactorQrCode | ListServers
            | ServerDetails | ServerResources | WebSocketCredentials | ListFiles
            | FileUploadUrl | ListDatabases | CreateDatabase | ListAllocations | ListSubusers
            | ListBackups | ListSchedules | ClientUnknownEndpoint | InvalidServerIdentifier => {
                ScenarioGroup::Client
            }
            ListUsers | CreateUser | UserDetails | ApplicationListServers
            | ApplicationServerDetails | ApplicationServerDatabases | ListNodes | NodeDetails
            | NodeConfiguration | ListLocations | ListNests | NestEggs
            | ApplicationUnknownEndpoint | UnknownUser | InvalidUserPayload => {
                ScenarioGroup::Application
            }
            TokenFormat | ConnectWithValidToken | InBandAuthentication | TokenExpiryWindow => {
                ScenarioGroup::WebSocket
            }
        }
    }

    /// Stable name used in logs and reports, `group/scenario`.
    pub fn name(self) -> &'static str {
        use Scenario::*;
        match self {
            AccountDetails => "client/account-details",
            ListApiKeys => "client/list-api-keys",
            CreateApiKey => "client/create-api-key",
            TwoFactorQrCode => "client/two-factor-qr-code",
            ListServers => "client/list-servers",
            ServerDetails => "client/server-details",
            ServerResources => "client/server-resources",
            WebSocketCredentials => "client/websocket-credentials",
            ListFiles => "client/list-files",
            FileUploadUrl => "client/file-upload-url",
            ListDatabases => "client/list-databases",
            CreateDatabase => "client/create-database",
            ListAllocations => "client/list-allocations",
            ListSubusers => "client/list-subusers",
            ListBackups => "client/list-backups",
            ListSchedules => "client/list-schedules",
            ClientUnknownEndpoint => "client/unknown-endpoint",
            InvalidServerIdentifier => "client/invalid-server-identifier",
            ListUsers => "application/list-users",
            CreateUser => "application/create-user",
            UserDetails => "application/user-details",
            ApplicationListServers => "application/list-servers",
            ApplicationServerDetails => "application/server-details",
            ApplicationServerDatabases => "application/server-databases",
            ListNodes => "application/list-nodes",
            NodeDetails => "application/node-details",
            NodeConfiguration => "application/node-configuration",
            ListLocations => "application/list-locations",
            ListNests => "application/list-nests",
            NestEggs => "application/nest-eggs",
            ApplicationUnknownEndpoint => "application/unknown-endpoint",
            UnknownUser => "application/unknown-user",
            InvalidUserPayload => "application/invalid-user-payload",
            TokenFormat => "websocket/token-format",
            ConnectWithValidToken => "websocket/connect-with-valid-token",
            InBandAuthentication => "websocket/in-band-authentication",
            TokenExpiryWindow => "websocket/token-expiry-window",
        }
    }

    /// Whether the scenario creates or mutates remote state.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            Scenario::CreateApiKey
                | Scenario::CreateDatabase
                | Scenario::CreateUser
                | Scenario::InvalidUserPayload
        )
    }

    /// Why the scenario cannot run under this configuration, if it cannot.
    pub fn skip_reason(self, ctx: &TestContext) -> Option<&'static str> {
        match self.group() {
            ScenarioGroup::Application if ctx.should_skip(TestCategory::Application) => {
                return Some("application API not configured");
            }
            ScenarioGroup::WebSocket if ctx.should_skip(TestCategory::WebSocket) => {
                return Some("WebSocket scenarios disabled in safe mode");
            }
            _ => {}
        }
        if self.is_destructive() && ctx.should_skip(TestCategory::Destructive) {
            return Some("destructive scenarios disabled");
        }
        None
    }

    /// Run the scenario body. Errors are failures; the runner turns them into
    /// [`Outcome::Failed`].
    pub async fn run(self, ctx: &TestContext) -> anyhow::Result<Outcome> {
        if let Some(reason) = self.skip_reason(ctx) {
            return Ok(Outcome::Skipped(reason.to_string()));
        }

        use Scenario::*;
        match self {
            AccountDetails => client::account_details(ctx).await,
            ListApiKeys => client::list_api_keys(ctx).await,
            CreateApiKey => client::create_api_key(ctx).await,
            TwoFactorQrCode => client::two_factor_qr_code(ctx).await,
            ListServers => client::list_servers(ctx).await,
            ServerDetails => client::server_details(ctx).await,
            ServerResources => client::server_resources(ctx).await,
            WebSocketCredentials => client::websocket_credentials(ctx).await,
            ListFiles => client::list_files(ctx).await,
            FileUploadUrl => client::file_upload_url(ctx).await,
            ListDatabases => client::list_databases(ctx).await,
            CreateDatabase => client::create_database(ctx).await,
            ListAllocations => client::list_allocations(ctx).await,
            ListSubusers => client::list_subusers(ctx).await,
            ListBackups => client::list_backups(ctx).await,
            ListSchedules => client::list_schedules(ctx).await,
            ClientUnknownEndpoint => client::unknown_endpoint(ctx).await,
            InvalidServerIdentifier => client::invalid_server_identifier(ctx).await,
            ListUsers => application::list_users(ctx).await,
            CreateUser => application::create_user(ctx).await,
            UserDetails => application::user_details(ctx).await,
            ApplicationListServers => application::list_servers(ctx).await,
            ApplicationServerDetails => application::server_details(ctx).await,
            ApplicationServerDatabases => application::server_databases(ctx).await,
            ListNodes => application::list_nodes(ctx).await,
            NodeDetails => application::node_details(ctx).await,
            NodeConfiguration => application::node_configuration(ctx).await,
            ListLocations => application::list_locations(ctx).await,
            ListNests => application::list_nests(ctx).await,
            NestEggs => application::nest_eggs(ctx).await,
            ApplicationUnknownEndpoint => application::unknown_endpoint(ctx).await,
            UnknownUser => application::unknown_user(ctx).await,
            InvalidUserPayload => application::invalid_user_payload(ctx).await,
            TokenFormat => websocket::token_format(ctx).await,
            ConnectWithValidToken => websocket::connect_with_valid_token(ctx).await,
            InBandAuthentication => websocket::in_band_authentication(ctx).await,
            TokenExpiryWindow => websocket::token_expiry_window(ctx).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
