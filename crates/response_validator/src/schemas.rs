//! Expected shapes of the resources the scenarios read.
//!
//! The envelope `object` tags are the values the panel actually returns:
//! `user`, `server` and `api_key`.

use std::sync::LazyLock;

use crate::{SchemaDescriptor, ValueType};

#[cfg(test)]
#[path = "schemas_tests.rs"]
mod tests;

static CLIENT_USER: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("client user")
        .literal("object", "user")
        .nested(
            "attributes",
            SchemaDescriptor::new("attributes")
                .typed("id", ValueType::Number)
                .typed("admin", ValueType::Boolean)
                .typed("username", ValueType::String)
                .typed("email", ValueType::String)
                .typed("first_name", ValueType::String)
                .typed("last_name", ValueType::String)
                .typed("language", ValueType::String),
        )
});

static APPLICATION_USER: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("application user")
        .literal("object", "user")
        .nested(
            "attributes",
            SchemaDescriptor::new("attributes")
                .typed("id", ValueType::Number)
                .typed("root_admin", ValueType::Boolean)
                .typed("username", ValueType::String)
                .typed("email", ValueType::String)
                .typed("first_name", ValueType::String)
                .typed("last_name", ValueType::String)
                .typed("language", ValueType::String),
        )
});

static CLIENT_SERVER: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("client server")
        .literal("object", "server")
        .nested(
            "attributes",
            SchemaDescriptor::new("attributes")
                .typed("server_owner", ValueType::Boolean)
                .typed("identifier", ValueType::String)
                .typed("uuid", ValueType::String)
                .typed("name", ValueType::String)
                .one_of("description", &[ValueType::String, ValueType::Null])
                .one_of("status", &[ValueType::String, ValueType::Null])
                .typed("is_suspended", ValueType::Boolean)
                .typed("is_installing", ValueType::Boolean)
                .typed("is_transferring", ValueType::Boolean),
        )
});

static APPLICATION_SERVER: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("application server")
        .literal("object", "server")
        .nested(
            "attributes",
            SchemaDescriptor::new("attributes")
                .typed("id", ValueType::Number)
                .one_of("external_id", &[ValueType::String, ValueType::Null])
                .typed("uuid", ValueType::String)
                .typed("identifier", ValueType::String)
                .typed("name", ValueType::String)
                .one_of("description", &[ValueType::String, ValueType::Null])
                .one_of("status", &[ValueType::String, ValueType::Null])
                .typed("suspended", ValueType::Boolean)
                .typed("limits", ValueType::Object)
                .typed("feature_limits", ValueType::Object)
                .typed("user", ValueType::Number)
                .typed("node", ValueType::Number)
                .typed("allocation", ValueType::Number)
                .typed("nest", ValueType::Number)
                .typed("egg", ValueType::Number)
                .typed("container", ValueType::Object)
                .typed("created_at", ValueType::String)
                .one_of("updated_at", &[ValueType::String, ValueType::Null]),
        )
});

static LIST: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("list")
        .literal("object", "list")
        .typed("data", ValueType::Array)
});

static API_KEY: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new("api key")
        .literal("object", "api_key")
        .nested(
            "attributes",
            SchemaDescriptor::new("attributes")
                .typed("identifier", ValueType::String)
                .one_of("description", &[ValueType::String, ValueType::Null])
                .typed("allowed_ips", ValueType::Array)
                .one_of("last_used_at", &[ValueType::String, ValueType::Null])
                .typed("created_at", ValueType::String),
        )
});

/// `GET /api/client/account`.
pub fn client_user() -> &'static SchemaDescriptor {
    &CLIENT_USER
}

/// `GET /api/application/users/{id}` and list items.
pub fn application_user() -> &'static SchemaDescriptor {
    &APPLICATION_USER
}

/// `GET /api/client/servers/{server}` and list items.
pub fn client_server() -> &'static SchemaDescriptor {
    &CLIENT_SERVER
}

pub fn application_server() -> &'static SchemaDescriptor {
    &APPLICATION_SERVER
}

pub fn list() -> &'static SchemaDescriptor {
    &LIST
}

/// A client API key, without the `meta.secret_token` returned on creation.
pub fn api_key() -> &'static SchemaDescriptor {
    &API_KEY
}
