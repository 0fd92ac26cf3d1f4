//! Application API scenarios, run with the admin-scope credential.
//!
//! Detail scenarios pick the first item of the matching listing and skip
//! when the listing is empty.

use anyhow::{Context, Result, ensure};
use panel_client::ApiClient;
use response_validator::{expect_successful_response, expect_valid_schema, schemas};
use test_cleanup::TrackedResource;
use test_utils::{generate_test_id, user_payload};
use tracing::info;

use super::{
    expect_error_body, expect_item_schema, first_listed_id, first_raw_item, list_items,
    require_attributes, require_bool, single_resource, skipped,
};
use crate::{Outcome, TestContext};

/// User id no panel is expected to have.
const UNKNOWN_USER_ID: u64 = 999_999;

fn admin(ctx: &TestContext) -> Result<&ApiClient> {
    ctx.application()
        .context("application API client is not configured")
}

/// Fetch `{path}/{id}` for the first listed item and check the id round-trips.
async fn details_of_first(api: &ApiClient, path: &str, what: &str) -> Result<Outcome> {
    let Some(id) = first_listed_id(api, path).await? else {
        return skipped(format!("no {what} available"));
    };
    let response = api.get(&format!("{path}/{id}")).await?;

    let resource = single_resource(&response)?;
    ensure!(
        resource.u64_attr("id") == Some(id),
        "{what} details returned id {:?}, expected {id}",
        resource.get("id")
    );

    Ok(Outcome::Passed)
}

pub async fn list_users(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/users").await?;

    let users = list_items(&response)?;
    if let Some(user) = users.first() {
        require_attributes(
            user,
            &[
                "id",
                "uuid",
                "username",
                "email",
                "first_name",
                "last_name",
                "root_admin",
            ],
        )?;
        require_bool(user, "root_admin")?;
    }
    if let Some(raw) = first_raw_item(&response) {
        expect_item_schema(raw, schemas::application_user())?;
    }

    Ok(Outcome::Passed)
}

pub async fn create_user(ctx: &TestContext) -> Result<Outcome> {
    let test_id = generate_test_id();
    let payload = user_payload(&test_id);
    let response = admin(ctx)?
        .post("/api/application/users", &payload)
        .await?;

    let user = single_resource(&response)?;
    let id = user.u64_attr("id").context("created user has no id")?;
    ctx.track(TrackedResource::User { id });

    ensure!(
        user.str_attr("username") == Some(test_id.as_str()),
        "created user has username {:?}, expected {test_id}",
        user.str_attr("username")
    );
    ensure!(
        user.get("email") == payload.get("email"),
        "created user has email {:?}, expected {:?}",
        user.get("email"),
        payload.get("email")
    );

    info!(user_id = id, username = %test_id, "Created user");
    Ok(Outcome::Passed)
}

pub async fn user_details(ctx: &TestContext) -> Result<Outcome> {
    let api = admin(ctx)?;
    let id = match ctx.config().test_user_id() {
        Some(configured) => configured
            .parse::<u64>()
            .with_context(|| format!("TEST_USER_ID '{configured}' is not a numeric user id"))?,
        None => match first_listed_id(api, "/api/application/users").await? {
            Some(id) => id,
            None => return skipped("no users available"),
        },
    };
    let response = api.get(&format!("/api/application/users/{id}")).await?;

    expect_valid_schema(&response, schemas::application_user())?;
    let user = single_resource(&response)?;
    ensure!(
        user.u64_attr("id") == Some(id),
        "user details returned id {:?}, expected {id}",
        user.get("id")
    );

    Ok(Outcome::Passed)
}

pub async fn list_servers(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/servers").await?;

    let servers = list_items(&response)?;
    if let Some(server) = servers.first() {
        require_attributes(
            server,
            &["id", "uuid", "identifier", "name", "description", "status", "user"],
        )?;
        ensure!(
            server.u64_attr("user").is_some(),
            "server.user is not a number"
        );
    }
    if let Some(raw) = first_raw_item(&response) {
        expect_item_schema(raw, schemas::application_server())?;
    }

    Ok(Outcome::Passed)
}

pub async fn server_details(ctx: &TestContext) -> Result<Outcome> {
    details_of_first(admin(ctx)?, "/api/application/servers", "servers").await
}

pub async fn server_databases(ctx: &TestContext) -> Result<Outcome> {
    let api = admin(ctx)?;
    let Some(server) = first_listed_id(api, "/api/application/servers").await? else {
        return skipped("no servers available");
    };
    let response = api
        .get(&format!("/api/application/servers/{server}/databases"))
        .await?;

    let databases = list_items(&response)?;
    if let Some(database) = databases.first() {
        require_attributes(
            database,
            &[
                "id",
                "server",
                "host",
                "database",
                "username",
                "remote",
                "max_connections",
            ],
        )?;
    }

    Ok(Outcome::Passed)
}

pub async fn list_nodes(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/nodes").await?;

    let nodes = list_items(&response)?;
    if let Some(node) = nodes.first() {
        require_attributes(
            node,
            &[
                "id",
                "uuid",
                "public",
                "name",
                "description",
                "location_id",
                "fqdn",
                "scheme",
                "behind_proxy",
                "maintenance_mode",
            ],
        )?;
        for flag in ["public", "behind_proxy", "maintenance_mode"] {
            require_bool(node, flag)?;
        }
    }

    Ok(Outcome::Passed)
}

pub async fn node_details(ctx: &TestContext) -> Result<Outcome> {
    details_of_first(admin(ctx)?, "/api/application/nodes", "nodes").await
}

/// The configuration endpoint returns the daemon's config file, not an
/// envelope.
pub async fn node_configuration(ctx: &TestContext) -> Result<Outcome> {
    let api = admin(ctx)?;
    let Some(node) = first_listed_id(api, "/api/application/nodes").await? else {
        return skipped("no nodes available");
    };
    let response = api
        .get(&format!("/api/application/nodes/{node}/configuration"))
        .await?;

    expect_successful_response(&response)?;
    let missing: Vec<&str> = [
        "debug",
        "uuid",
        "token_id",
        "token",
        "api",
        "system",
        "allowed_mounts",
        "remote",
    ]
    .into_iter()
    .filter(|key| response.data.get(key).is_none())
    .collect();
    ensure!(
        missing.is_empty(),
        "node configuration is missing: {}",
        missing.join(", ")
    );
    ensure!(
        response.data.get("debug").is_some_and(|v| v.is_boolean()),
        "node configuration debug is not a boolean"
    );

    Ok(Outcome::Passed)
}

pub async fn list_locations(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/locations").await?;

    let locations = list_items(&response)?;
    if let Some(location) = locations.first() {
        require_attributes(
            location,
            &["id", "short", "long", "updated_at", "created_at"],
        )?;
    }

    Ok(Outcome::Passed)
}

pub async fn list_nests(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/nests").await?;

    let nests = list_items(&response)?;
    if let Some(nest) = nests.first() {
        require_attributes(
            nest,
            &[
                "id",
                "uuid",
                "author",
                "name",
                "description",
                "created_at",
                "updated_at",
            ],
        )?;
    }

    Ok(Outcome::Passed)
}

pub async fn nest_eggs(ctx: &TestContext) -> Result<Outcome> {
    let api = admin(ctx)?;
    let Some(nest) = first_listed_id(api, "/api/application/nests").await? else {
        return skipped("no nests available");
    };
    let response = api
        .get(&format!("/api/application/nests/{nest}/eggs"))
        .await?;

    let eggs = list_items(&response)?;
    if let Some(egg) = eggs.first() {
        require_attributes(
            egg,
            &[
                "id",
                "uuid",
                "name",
                "nest",
                "author",
                "description",
                "docker_images",
            ],
        )?;
        ensure!(
            egg.get("docker_images").is_some_and(|v| v.is_object()),
            "egg docker_images is not an object"
        );
    }

    Ok(Outcome::Passed)
}

pub async fn unknown_endpoint(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?.get("/api/application/nonexistent").await?;
    expect_error_body(&response, &[404])?;
    Ok(Outcome::Passed)
}

pub async fn unknown_user(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?
        .get(&format!("/api/application/users/{UNKNOWN_USER_ID}"))
        .await?;
    expect_error_body(&response, &[404])?;
    Ok(Outcome::Passed)
}

pub async fn invalid_user_payload(ctx: &TestContext) -> Result<Outcome> {
    let response = admin(ctx)?
        .post("/api/application/users", &test_utils::invalid_user_payload())
        .await?;
    expect_error_body(&response, &[422])?;
    Ok(Outcome::Passed)
}
