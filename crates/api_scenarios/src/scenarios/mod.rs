//! Scenario bodies, one module per API surface.
//!
//! Each body returns `Ok(Outcome::Passed)` when every check holds,
//! `Ok(Outcome::Skipped(..))` when a prerequisite (a server, a listed item)
//! is missing, and an error describing the first check that failed.

use anyhow::{Context, Result, ensure};
use panel_client::{ApiClient, ApiResponse, safe_stringify};
use response_validator::{
    Envelope, Resource, SchemaDescriptor, ValidationFailure, expect_successful_response,
    expect_valid_list_response, validate_value,
};
use serde_json::Value;

use crate::Outcome;

pub mod application;
pub mod client;
pub mod websocket;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

fn skipped(reason: impl Into<String>) -> Result<Outcome> {
    Ok(Outcome::Skipped(reason.into()))
}

fn no_server() -> Result<Outcome> {
    skipped("no test server available")
}

/// Items of a successful list response.
fn list_items(response: &ApiResponse) -> Result<Vec<Resource>> {
    expect_valid_list_response(response)?;
    match Envelope::parse(&response.data) {
        Envelope::List { items, .. } => Ok(items),
        _ => anyhow::bail!(
            "list items are not resources: {}",
            safe_stringify(&response.data, 200)
        ),
    }
}

/// The resource of a successful single-resource response.
fn single_resource(response: &ApiResponse) -> Result<Resource> {
    expect_successful_response(response)?;
    match Envelope::parse(&response.data) {
        Envelope::Resource(resource) => Ok(resource),
        _ => anyhow::bail!(
            "response is not a single resource: {}",
            safe_stringify(&response.data, 200)
        ),
    }
}

/// Raw JSON of the first list item, for schema checks.
fn first_raw_item(response: &ApiResponse) -> Option<&Value> {
    response.pointer("/data/0")
}

fn expect_item_schema(item: &Value, descriptor: &SchemaDescriptor) -> Result<()> {
    let violations = validate_value(item, descriptor);
    if violations.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::Schema {
        schema: descriptor.name().to_string(),
        violations,
    }
    .into())
}

fn require_attributes(resource: &Resource, names: &[&str]) -> Result<()> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| resource.get(name).is_none())
        .collect();
    ensure!(
        missing.is_empty(),
        "{} is missing attributes: {}",
        resource.object,
        missing.join(", ")
    );
    Ok(())
}

fn require_bool(resource: &Resource, name: &str) -> Result<()> {
    ensure!(
        resource.bool_attr(name).is_some(),
        "{}.{name} is not a boolean",
        resource.object
    );
    Ok(())
}

/// Expect one of `statuses` with an `errors` array in the body.
fn expect_error_body(response: &ApiResponse, statuses: &[u16]) -> Result<()> {
    ensure!(
        statuses.contains(&response.status),
        "expected status {statuses:?}, got {}",
        response.status
    );
    let envelope = Envelope::parse(&response.data);
    ensure!(
        envelope.as_errors().is_some(),
        "error response has no errors array: {}",
        safe_stringify(&response.data, 200)
    );
    Ok(())
}

/// Numeric id of the first item listed at `path`, `None` for an empty list.
async fn first_listed_id(api: &ApiClient, path: &str) -> Result<Option<u64>> {
    let response = api.get(path).await?;
    let items = list_items(&response).with_context(|| format!("listing {path}"))?;
    match items.first() {
        Some(item) => item
            .u64_attr("id")
            .map(Some)
            .with_context(|| format!("first item of {path} has no numeric id")),
        None => Ok(None),
    }
}
