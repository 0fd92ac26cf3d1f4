//! Unit tests for the panel_client crate.

use super::*;
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(base_url: &str, application_key: Option<&str>) -> ConfigurationSnapshot {
    let mut vars = HashMap::from([
        ("PTERODACTYL_URL".to_string(), base_url.to_string()),
        ("CLIENT_API_KEY".to_string(), "ptlc_testkey".to_string()),
    ]);
    if let Some(key) = application_key {
        vars.insert("APPLICATION_API_KEY".to_string(), key.to_string());
    }
    ConfigurationSnapshot::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

#[tokio::test]
async fn test_requests_carry_panel_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/client/account"))
        .and(header("authorization", "Bearer ptlc_testkey"))
        .and(header("accept", PANEL_MEDIA_TYPE))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "user",
            "attributes": { "id": 1, "username": "admin" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();
    let response = client.get("/api/client/account").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.pointer("/attributes/username"), Some(&json!("admin")));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/client/nonexistent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "code": "NotFoundHttpException", "status": "404", "detail": "Not found." }]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();
    let response = client.get("/api/client/nonexistent").await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.errors().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn test_server_error_is_returned_not_raised() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();
    let response = client.get("/api/client").await.unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.data, json!("maintenance"));
}

#[tokio::test]
async fn test_empty_body_becomes_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/client/account/api-keys/abc123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();
    let response = client.delete("/api/client/account/api-keys/abc123").await.unwrap();

    assert_eq!(response.status, 204);
    assert!(response.data.is_null());
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;
    let body = json!({ "description": "key", "allowed_ips": ["127.0.0.1"] });

    Mock::given(method("POST"))
        .and(path("/api/client/account/api-keys"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "object": "api_key",
            "attributes": { "identifier": "abc" },
            "meta": { "secret_token": "secret" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();
    let response = client.post("/api/client/account/api-keys", &body).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.pointer("/meta/secret_token"), Some(&json!("secret")));
}

#[tokio::test]
async fn test_put_and_patch_use_their_methods() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/client/account/email"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/application/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "user" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri(), Some("ptla_admin"));
    let client = ApiClient::client_api(&config).unwrap();
    let admin = ApiClient::application_api(&config).unwrap();

    let put = client
        .put("/api/client/account/email", &json!({ "email": "a@b.c" }))
        .await
        .unwrap();
    let patch = admin
        .patch("/api/application/users/5", &json!({ "first_name": "x" }))
        .await
        .unwrap();

    assert_eq!(put.status, 204);
    assert_eq!(patch.status, 200);
}

#[tokio::test]
async fn test_application_client_uses_admin_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/application/users"))
        .and(header("authorization", "Bearer ptla_admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri(), Some("ptla_admin"));
    let admin = ApiClient::application_api(&config).unwrap();

    assert_eq!(admin.scope(), ApiScope::Application);
    let response = admin.get("/api/application/users").await.unwrap();
    assert_eq!(response.status, 200);
}

#[test]
fn test_application_client_requires_admin_key() {
    let config = config_for("https://panel.example.com", None);

    let result = ApiClient::application_api(&config);

    assert!(matches!(
        result,
        Err(Error::NotConfigured {
            scope: ApiScope::Application
        })
    ));
}

#[test]
fn test_url_for_joins_paths() {
    let config = config_for("https://panel.example.com/", None);
    let client = ApiClient::client_api(&config).unwrap();

    assert_eq!(
        client.url_for("/api/client"),
        "https://panel.example.com/api/client"
    );
    assert_eq!(
        client.url_for("api/client"),
        "https://panel.example.com/api/client"
    );
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    // Nothing listens on port 9 (discard) on a test host.
    let config = config_for("http://127.0.0.1:9", None);
    let client = ApiClient::client_api(&config).unwrap();

    let result = client.get("/api/client").await;

    assert!(matches!(
        result,
        Err(Error::Transport(_)) | Err(Error::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_connection_accepts_client_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/client/account"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "errors": [] })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();

    assert!(client.test_connection("/api/client/account").await);
}

#[tokio::test]
async fn test_connection_rejects_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = ApiClient::client_api(&config_for(&mock_server.uri(), None)).unwrap();

    assert!(!client.test_connection("/api/client/account").await);
}

#[tokio::test]
async fn test_verbose_mode_does_not_change_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": [] })))
        .mount(&mock_server)
        .await;

    let base = url::Url::parse(&mock_server.uri()).unwrap();
    let key = SecretString::from("ptlc_testkey".to_string());
    let quiet = ApiClient::new(ApiScope::Client, &base, &key, Duration::from_secs(5), false).unwrap();
    let verbose = ApiClient::new(ApiScope::Client, &base, &key, Duration::from_secs(5), true).unwrap();

    let a = quiet.get("/api/client").await.unwrap();
    let b = verbose.get("/api/client").await.unwrap();

    assert_eq!(a.status, b.status);
    assert_eq!(a.data, b.data);
}

#[test]
fn test_api_scope_display() {
    assert_eq!(ApiScope::Client.to_string(), "Client");
    assert_eq!(ApiScope::Application.to_string(), "Application");
}
