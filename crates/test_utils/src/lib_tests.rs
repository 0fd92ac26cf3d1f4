//! Tests for test utilities.

use super::*;
use std::{
    cell::Cell,
    rc::Rc,
};

#[test]
fn test_generate_test_id_format() {
    let id = generate_test_id();

    assert!(id.starts_with(TEST_ID_PREFIX));
    assert!(is_test_id(&id), "{id} does not match the naming convention");
    let suffix = id.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 9);
}

#[test]
fn test_generate_test_id_is_unique() {
    let a = generate_test_id();
    let b = generate_test_id();

    assert_ne!(a, b);
}

#[test]
fn test_is_test_id_rejects_other_names() {
    assert!(!is_test_id("admin"));
    assert!(!is_test_id("test-user"));
    assert!(!is_test_id("api-test-user-1700000000000"));
    assert!(!is_test_id("test-1700000000000-ABCDEFGHI"));
    assert!(!is_test_id("test-1700000000000-abc"));
    assert!(is_test_id("test-1700000000000-a1b2c3d4e"));
}

#[test]
fn test_is_test_email() {
    assert!(is_test_email("test-1700000000000-a1b2c3d4e@example.com"));
    assert!(!is_test_email("admin@example.com"));
    assert!(!is_test_email("test-1700000000000-a1b2c3d4e@"));
    assert!(!is_test_email("test-1700000000000-a1b2c3d4e"));
}

#[test]
fn test_api_key_payload() {
    let payload = api_key_payload();

    assert_eq!(payload["description"], TEST_KEY_DESCRIPTION);
    assert_eq!(payload["allowed_ips"], json!(["127.0.0.1"]));
}

#[test]
fn test_user_payload_follows_naming_convention() {
    let id = generate_test_id();
    let payload = user_payload(&id);

    let username = payload["username"].as_str().unwrap();
    let email = payload["email"].as_str().unwrap();
    assert!(is_test_id(username));
    assert!(is_test_email(email));
}

#[test]
fn test_database_payload() {
    let payload = database_payload();

    assert!(payload["database"].as_str().unwrap().starts_with("test_db_"));
    assert_eq!(payload["remote"], "%");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_returns_once_condition_holds() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);

    let met = wait_for(
        move || {
            let counter = Rc::clone(&counter);
            async move {
                counter.set(counter.get() + 1);
                counter.get() >= 3
            }
        },
        Duration::from_secs(30),
        Duration::from_secs(1),
    )
    .await;

    assert!(met);
    assert_eq!(calls.get(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_gives_up_after_timeout() {
    let started = tokio::time::Instant::now();

    let met = wait_for(|| async { false }, Duration::from_secs(5), Duration::from_secs(1)).await;

    assert!(!met);
    assert!(started.elapsed() >= Duration::from_secs(5));
}
