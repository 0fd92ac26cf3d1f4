use super::*;
use crate::{Violation, validate_value};
use serde_json::json;

#[test]
fn test_client_user_accepts_account_body() {
    let body = json!({
        "object": "user",
        "attributes": {
            "id": 1,
            "admin": true,
            "username": "admin",
            "email": "admin@example.com",
            "first_name": "Admin",
            "last_name": "User",
            "language": "en"
        }
    });

    assert!(validate_value(&body, client_user()).is_empty());
}

#[test]
fn test_application_user_uses_root_admin() {
    let body = json!({
        "object": "user",
        "attributes": {
            "id": 1,
            "admin": true,
            "username": "admin",
            "email": "admin@example.com",
            "first_name": "Admin",
            "last_name": "User",
            "language": "en"
        }
    });

    let violations = validate_value(&body, application_user());

    assert_eq!(
        violations,
        vec![Violation::Missing {
            path: "attributes.root_admin".to_string()
        }]
    );
}

#[test]
fn test_application_server_accepts_null_external_id() {
    let body = json!({
        "object": "server",
        "attributes": {
            "id": 3,
            "external_id": null,
            "uuid": "1a7ce997-259b-452e-8b4e-cecc464142ca",
            "identifier": "1a7ce997",
            "name": "Survival",
            "description": "",
            "status": null,
            "suspended": false,
            "limits": { "memory": 1024 },
            "feature_limits": { "databases": 2 },
            "user": 1,
            "node": 1,
            "allocation": 1,
            "nest": 1,
            "egg": 1,
            "container": { "startup_command": "java -jar server.jar" },
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": "2024-01-01T00:00:00+00:00"
        }
    });

    assert!(validate_value(&body, application_server()).is_empty());
}

#[test]
fn test_client_server_rejects_wrong_object_tag() {
    let body = json!({
        "object": "string",
        "attributes": {
            "server_owner": true,
            "identifier": "1a7ce997",
            "uuid": "1a7ce997-259b-452e-8b4e-cecc464142ca",
            "name": "Survival",
            "description": "",
            "status": null,
            "is_suspended": false,
            "is_installing": false,
            "is_transferring": false
        }
    });

    let violations = validate_value(&body, client_server());

    assert_eq!(violations.len(), 1);
    assert!(matches!(&violations[0], Violation::LiteralMismatch { path, .. } if path == "object"));
}

#[test]
fn test_api_key_and_list() {
    let key = json!({
        "object": "api_key",
        "attributes": {
            "identifier": "wWyHT3Zs7a4Fyngz",
            "description": "API Test Key - Auto Generated",
            "allowed_ips": ["127.0.0.1"],
            "last_used_at": null,
            "created_at": "2024-01-01T00:00:00+00:00"
        }
    });

    assert!(validate_value(&key, api_key()).is_empty());
    assert!(validate_value(&json!({ "object": "list", "data": [key] }), list()).is_empty());
}
