use super::*;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

#[test]
fn test_backoff_delay_doubles() {
    assert_eq!(backoff_delay(1), Duration::from_secs(2));
    assert_eq!(backoff_delay(2), Duration::from_secs(4));
    assert_eq!(backoff_delay(3), Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_with_retry_succeeds_after_two_failures() {
    let calls = Arc::new(Mutex::new(Vec::new()));

    let result = with_retry(
        || {
            let calls = Arc::clone(&calls);
            async move {
                let mut calls = calls.lock().unwrap();
                calls.push(Instant::now());
                if calls.len() < 3 {
                    Err(format!("failure {}", calls.len()))
                } else {
                    Ok("done")
                }
            }
        },
        3,
    )
    .await;

    assert_eq!(result, Ok("done"));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);

    let first_gap = calls[1] - calls[0];
    let second_gap = calls[2] - calls[1];
    assert!(first_gap >= Duration::from_secs(2) && first_gap < Duration::from_secs(3));
    assert!(second_gap >= Duration::from_secs(4) && second_gap < Duration::from_secs(5));
    assert!(second_gap > first_gap);
}

#[tokio::test(start_paused = true)]
async fn test_with_retry_returns_last_error_when_exhausted() {
    let mut count = 0;

    let result: Result<(), String> = with_retry(
        || {
            count += 1;
            let attempt = count;
            async move { Err(format!("failure {attempt}")) }
        },
        3,
    )
    .await;

    assert_eq!(result, Err("failure 3".to_string()));
    assert_eq!(count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_with_retry_does_not_retry_on_success() {
    let mut count = 0;
    let start = Instant::now();

    let result: Result<u32, String> = with_retry(
        || {
            count += 1;
            async { Ok(42) }
        },
        5,
    )
    .await;

    assert_eq!(result, Ok(42));
    assert_eq!(count, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_with_retry_zero_attempts_runs_once() {
    let mut count = 0;

    let result: Result<(), &str> = with_retry(
        || {
            count += 1;
            async { Err("nope") }
        },
        0,
    )
    .await;

    assert_eq!(result, Err("nope"));
    assert_eq!(count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_with_timeout_returns_output_when_fast() {
    let result = with_timeout(async { 7 }, Duration::from_secs(1)).await;

    assert_eq!(result.unwrap(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_with_timeout_fails_when_timer_wins() {
    let slow = tokio::time::sleep(Duration::from_secs(10));

    let result = with_timeout(slow, Duration::from_secs(2)).await;

    match result {
        Err(Error::Timeout { timeout }) => assert_eq!(timeout, Duration::from_secs(2)),
        other => panic!("expected timeout, got {other:?}"),
    }
}
