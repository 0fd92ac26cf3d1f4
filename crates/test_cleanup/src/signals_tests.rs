use super::*;
use panel_client::{ApiClient, ApiScope};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{ResourceKind, TrackedResource};

fn registry(server: &MockServer, safe_mode: bool) -> CleanupRegistry {
    let client = ApiClient::new(
        ApiScope::Client,
        &Url::parse(&server.uri()).unwrap(),
        &SecretString::from("ptlc_test".to_string()),
        Duration::from_secs(5),
        false,
    )
    .unwrap();
    CleanupRegistry::new(client, None, safe_mode)
}

#[test]
fn test_exit_codes() {
    assert_eq!(ShutdownSignal::Interrupt.exit_code(), 130);
    assert_eq!(ShutdownSignal::Terminate.exit_code(), 143);
}

#[tokio::test]
async fn test_handle_shutdown_drains_registry() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/client/account/api-keys/key1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let registry = registry(&server, false);
    registry.track(TrackedResource::ApiKey {
        identifier: "key1".to_string(),
    });

    let code = handle_shutdown(&registry, ShutdownSignal::Terminate).await;

    assert_eq!(code, 143);
    assert_eq!(registry.pending(ResourceKind::ApiKey), 0);
}

#[tokio::test]
async fn test_handle_shutdown_in_safe_mode_deletes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let registry = registry(&server, true);
    registry.track(TrackedResource::ApiKey {
        identifier: "key1".to_string(),
    });

    let code = handle_shutdown(&registry, ShutdownSignal::Interrupt).await;

    assert_eq!(code, 130);
}

#[tokio::test]
async fn test_notice_starts_clear() {
    let (_sender, notice) = ShutdownNotice::channel();

    assert_eq!(notice.requested(), None);
}

#[tokio::test]
async fn test_request_shutdown_raises_notice_before_draining() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/client/account/api-keys/key1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let registry = registry(&server, false);
    registry.track(TrackedResource::ApiKey {
        identifier: "key1".to_string(),
    });
    let (sender, notice) = ShutdownNotice::channel();

    let code = request_shutdown(&registry, ShutdownSignal::Interrupt, &sender, async {
        assert_eq!(notice.requested(), Some(ShutdownSignal::Interrupt));
        assert_eq!(registry.pending(ResourceKind::ApiKey), 1);
    })
    .await;

    assert_eq!(code, 130);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_request_shutdown_skips_entries_the_runner_drained() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/client/account/api-keys/key1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let registry = registry(&server, false);
    registry.track(TrackedResource::ApiKey {
        identifier: "key1".to_string(),
    });
    let (sender, _notice) = ShutdownNotice::channel();

    // The runner tears down while the signal task is waiting.
    let code = request_shutdown(&registry, ShutdownSignal::Terminate, &sender, async {
        registry.drain_all().await;
    })
    .await;

    assert_eq!(code, 143);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_request_shutdown_drains_after_grace_period() {
    let client = ApiClient::new(
        ApiScope::Client,
        &Url::parse("http://127.0.0.1:9").unwrap(),
        &SecretString::from("ptlc_test".to_string()),
        Duration::from_secs(5),
        false,
    )
    .unwrap();
    let registry = CleanupRegistry::new(client, None, true);
    registry.track(TrackedResource::ApiKey {
        identifier: "key1".to_string(),
    });
    let (sender, notice) = ShutdownNotice::channel();
    let started = tokio::time::Instant::now();

    let code = request_shutdown(
        &registry,
        ShutdownSignal::Terminate,
        &sender,
        std::future::pending::<()>(),
    )
    .await;

    assert_eq!(code, 143);
    assert!(started.elapsed() >= SHUTDOWN_GRACE);
    assert_eq!(notice.requested(), Some(ShutdownSignal::Terminate));
    assert!(registry.is_empty());
}
