//! Client API scenarios, run with the user-scope credential.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use panel_client::{ApiClient, is_jwt_format};
use response_validator::{expect_successful_response, expect_valid_schema, schemas};
use test_cleanup::TrackedResource;
use test_utils::{api_key_payload, database_payload, wait_for};
use tracing::{info, warn};

use super::{
    expect_error_body, expect_item_schema, first_raw_item, list_items, no_server,
    require_attributes, require_bool, single_resource, skipped,
};
use crate::{Outcome, TestContext};

/// How long a newly created key may take to appear in the key listing.
const KEY_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(10);
const KEY_VISIBILITY_INTERVAL: Duration = Duration::from_millis(500);

pub async fn account_details(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx.client().get("/api/client/account").await?;

    expect_successful_response(&response)?;
    expect_valid_schema(&response, schemas::client_user())?;
    let account = single_resource(&response)?;
    require_attributes(&account, &["email", "username"])?;
    require_bool(&account, "admin")?;
    if let Some(expected) = ctx.config().test_user_email() {
        ensure!(
            account.str_attr("email") == Some(expected),
            "account email is {:?}, expected {expected}",
            account.get("email")
        );
    }

    Ok(Outcome::Passed)
}

pub async fn list_api_keys(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx.client().get("/api/client/account/api-keys").await?;

    list_items(&response)?;
    if let Some(key) = first_raw_item(&response) {
        expect_item_schema(key, schemas::api_key())?;
    }

    Ok(Outcome::Passed)
}

pub async fn create_api_key(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx
        .client()
        .post("/api/client/account/api-keys", &api_key_payload())
        .await?;

    let key = single_resource(&response)?;
    let identifier = key
        .str_attr("identifier")
        .context("created key has no identifier")?
        .to_string();
    ctx.track(TrackedResource::ApiKey {
        identifier: identifier.clone(),
    });

    ensure!(
        key.meta
            .as_ref()
            .and_then(|meta| meta.get("secret_token"))
            .is_some_and(|token| token.is_string()),
        "created key has no meta.secret_token"
    );

    let client = ctx.client();
    let wanted = identifier.as_str();
    let listed = wait_for(
        move || async move { api_key_listed(client, wanted).await },
        KEY_VISIBILITY_TIMEOUT,
        KEY_VISIBILITY_INTERVAL,
    )
    .await;
    ensure!(listed, "created key {identifier} never appeared in the key listing");

    info!(identifier = %identifier, "Created API key");
    Ok(Outcome::Passed)
}

async fn api_key_listed(client: &ApiClient, identifier: &str) -> bool {
    let Ok(response) = client.get("/api/client/account/api-keys").await else {
        return false;
    };
    list_items(&response).is_ok_and(|keys| {
        keys.iter()
            .any(|key| key.str_attr("identifier") == Some(identifier))
    })
}

/// 400 means two-factor authentication is already enabled on the account.
pub async fn two_factor_qr_code(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx.client().get("/api/client/account/two-factor").await?;

    ensure!(
        matches!(response.status, 200 | 400),
        "expected 200 or 400, got {}",
        response.status
    );
    if response.status == 200 {
        let image = response
            .pointer("/data/image_url_data")
            .and_then(|v| v.as_str())
            .context("two-factor response has no data.image_url_data")?;
        ensure!(
            image.starts_with("otpauth://totp"),
            "image_url_data is not a TOTP URI"
        );
    }

    Ok(Outcome::Passed)
}

pub async fn list_servers(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx.client().get("/api/client").await?;

    let servers = list_items(&response)?;
    let Some(first) = servers.first() else {
        warn!("No servers listed; server scenarios will be skipped");
        return Ok(Outcome::Passed);
    };
    if let Some(raw) = first_raw_item(&response) {
        expect_item_schema(raw, schemas::client_server())?;
    }
    let identifier = first
        .str_attr("identifier")
        .context("listed server has no identifier")?;
    ctx.record_server(identifier);

    Ok(Outcome::Passed)
}

pub async fn server_details(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}"))
        .await?;

    if response.status == 404 {
        return skipped(format!("server {server} not found or not accessible"));
    }
    expect_valid_schema(&response, schemas::client_server())?;
    let details = single_resource(&response)?;
    require_attributes(&details, &["uuid", "name"])?;
    ensure!(
        details.str_attr("identifier") == Some(server.as_str()),
        "server details returned identifier {:?}, expected {server}",
        details.str_attr("identifier")
    );

    Ok(Outcome::Passed)
}

pub async fn server_resources(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/resources"))
        .await?;

    let stats = single_resource(&response)?;
    require_attributes(&stats, &["current_state", "resources"])?;
    for field in ["memory_bytes", "cpu_absolute"] {
        ensure!(
            response
                .pointer(&format!("/attributes/resources/{field}"))
                .is_some(),
            "resources.{field} is missing"
        );
    }

    Ok(Outcome::Passed)
}

pub async fn websocket_credentials(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/websocket"))
        .await?;

    expect_successful_response(&response)?;
    let token = response
        .pointer("/data/token")
        .and_then(|v| v.as_str())
        .context("websocket response has no data.token")?;
    ensure!(
        response.pointer("/data/socket").is_some_and(|v| v.is_string()),
        "websocket response has no data.socket"
    );
    ensure!(is_jwt_format(token), "websocket token is not a JWT");

    Ok(Outcome::Passed)
}

pub async fn list_files(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/files/list?directory=%2F"))
        .await?;

    let files = list_items(&response)?;
    if let Some(file) = files.first() {
        require_attributes(file, &["name", "mode", "size", "is_file", "is_symlink"])?;
    }

    Ok(Outcome::Passed)
}

pub async fn file_upload_url(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/files/upload"))
        .await?;

    let upload = single_resource(&response)?;
    let url = upload
        .str_attr("url")
        .context("upload response has no attributes.url")?;
    ensure!(
        url.starts_with("http://") || url.starts_with("https://"),
        "upload URL {url} is not HTTP(S)"
    );

    Ok(Outcome::Passed)
}

pub async fn list_databases(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/databases"))
        .await?;

    let databases = list_items(&response)?;
    if let Some(database) = databases.first() {
        require_attributes(
            database,
            &["id", "name", "username", "connections_from", "max_connections"],
        )?;
    }

    Ok(Outcome::Passed)
}

/// Panels without a database host refuse creation; any 4xx is a skip.
pub async fn create_database(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .post(
            &format!("/api/client/servers/{server}/databases"),
            &database_payload(),
        )
        .await?;

    if (400..500).contains(&response.status) {
        return skipped(format!(
            "database creation refused with status {}",
            response.status
        ));
    }

    let database = single_resource(&response)?;
    let id = database
        .str_attr("id")
        .context("created database has no id")?
        .to_string();
    info!(server = %server, database = %id, "Created database");
    ctx.track(TrackedResource::Database { server, id });

    Ok(Outcome::Passed)
}

pub async fn list_allocations(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/network/allocations"))
        .await?;

    let allocations = list_items(&response)?;
    if let Some(allocation) = allocations.first() {
        require_attributes(allocation, &["id", "ip", "port", "is_default"])?;
        require_bool(allocation, "is_default")?;
    }

    Ok(Outcome::Passed)
}

pub async fn list_subusers(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/users"))
        .await?;

    let subusers = list_items(&response)?;
    if let Some(subuser) = subusers.first() {
        require_attributes(subuser, &["uuid", "username", "email", "permissions"])?;
        ensure!(
            subuser.get("permissions").is_some_and(|p| p.is_array()),
            "subuser permissions is not an array"
        );
    }

    Ok(Outcome::Passed)
}

pub async fn list_backups(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/backups"))
        .await?;

    let backups = list_items(&response)?;
    if let Some(backup) = backups.first() {
        require_attributes(
            backup,
            &["uuid", "name", "completed_at", "is_successful", "is_locked"],
        )?;
        require_bool(backup, "is_locked")?;
    }

    Ok(Outcome::Passed)
}

pub async fn list_schedules(ctx: &TestContext) -> Result<Outcome> {
    let Some(server) = ctx.server_id() else {
        return no_server();
    };
    let response = ctx
        .client()
        .get(&format!("/api/client/servers/{server}/schedules"))
        .await?;

    let schedules = list_items(&response)?;
    if let Some(schedule) = schedules.first() {
        require_attributes(
            schedule,
            &["id", "name", "cron", "is_active", "only_when_online"],
        )?;
        require_bool(schedule, "is_active")?;
    }

    Ok(Outcome::Passed)
}

pub async fn unknown_endpoint(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx.client().get("/api/client/nonexistent").await?;
    expect_error_body(&response, &[404])?;
    Ok(Outcome::Passed)
}

pub async fn invalid_server_identifier(ctx: &TestContext) -> Result<Outcome> {
    let response = ctx
        .client()
        .get("/api/client/servers/invalid-server-id")
        .await?;
    expect_error_body(&response, &[404, 422])?;
    Ok(Outcome::Passed)
}
