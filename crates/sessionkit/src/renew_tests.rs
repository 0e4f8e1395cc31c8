// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::persist::Credentials;
use crate::test_support::{make_token, MockApi, RefreshScript};

fn seeded_cell() -> Arc<CredentialCell> {
    let cell = Arc::new(CredentialCell::default());
    cell.set(Credentials {
        access_token: make_token(Duration::from_secs(60), false),
        refresh_token: "refresh-old".to_owned(),
        remember_me: false,
    });
    cell
}

#[tokio::test]
async fn successful_renewal_replaces_credentials() {
    let api = Arc::new(MockApi::new(RefreshScript::Succeed {
        delay: Duration::ZERO,
        expires_in: Duration::from_secs(900),
    }));
    let creds = seeded_cell();
    let coord = RenewCoordinator::new(Arc::clone(&api), Arc::clone(&creds));

    let pair = coord.renew().await.unwrap();
    assert_eq!(api.refresh_call_count(), 1);
    assert_eq!(creds.refresh_token().as_deref(), Some(pair.refresh_token.as_str()));
    assert_ne!(pair.refresh_token, "refresh-old");
}

#[tokio::test]
async fn concurrent_renewals_share_one_rotation() {
    let api = Arc::new(MockApi::new(RefreshScript::Succeed {
        delay: Duration::from_millis(100),
        expires_in: Duration::from_secs(900),
    }));
    let coord = Arc::new(RenewCoordinator::new(Arc::clone(&api), seeded_cell()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let coord = Arc::clone(&coord);
        handles.push(tokio::spawn(async move { coord.renew().await }));
    }
    let mut pairs = Vec::new();
    for handle in handles {
        pairs.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(api.refresh_call_count(), 1, "waiters must not issue their own rotation");
    assert!(pairs.windows(2).all(|w| w[0].refresh_token == w[1].refresh_token));
}

#[tokio::test]
async fn renewals_after_completion_rotate_again() {
    let api = Arc::new(MockApi::new(RefreshScript::Succeed {
        delay: Duration::ZERO,
        expires_in: Duration::from_secs(900),
    }));
    let coord = RenewCoordinator::new(Arc::clone(&api), seeded_cell());

    let first = coord.renew().await.unwrap();
    let second = coord.renew().await.unwrap();
    assert_eq!(api.refresh_call_count(), 2);
    assert_ne!(first.refresh_token, second.refresh_token);
}

#[tokio::test]
async fn rejection_reaches_every_waiter() {
    let api = Arc::new(MockApi::new(RefreshScript::Reject));
    let coord = Arc::new(RenewCoordinator::new(Arc::clone(&api), seeded_cell()));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let coord = Arc::clone(&coord);
        handles.push(tokio::spawn(async move { coord.renew().await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Err(RenewError::Rejected));
    }
    assert_eq!(api.refresh_call_count(), 1);
}

#[tokio::test]
async fn missing_refresh_token_rejects_without_calling_out() {
    let api = Arc::new(MockApi::new(RefreshScript::Reject));
    let coord = RenewCoordinator::new(Arc::clone(&api), Arc::new(CredentialCell::default()));

    assert_eq!(coord.renew().await, Err(RenewError::Rejected));
    assert_eq!(api.refresh_call_count(), 0);
}

#[tokio::test]
async fn transport_failures_retry_then_succeed() {
    let api = Arc::new(MockApi::new(RefreshScript::FlakyThenSucceed {
        failures: 2,
        expires_in: Duration::from_secs(900),
    }));
    let creds = seeded_cell();
    let coord = RenewCoordinator::new(Arc::clone(&api), Arc::clone(&creds))
        .with_retry(3, Duration::from_millis(5));

    assert!(coord.renew().await.is_ok());
    assert_eq!(api.refresh_call_count(), 3);
}

#[tokio::test]
async fn transport_exhaustion_leaves_credentials_intact() {
    let api = Arc::new(MockApi::new(RefreshScript::FlakyThenSucceed {
        failures: 10,
        expires_in: Duration::from_secs(900),
    }));
    let creds = seeded_cell();
    let coord = RenewCoordinator::new(Arc::clone(&api), Arc::clone(&creds))
        .with_retry(2, Duration::from_millis(1));

    match coord.renew().await {
        Err(RenewError::Transport(_)) => {}
        other => panic!("expected transport failure, got {other:?}"),
    }
    // 1 initial attempt + 2 retries.
    assert_eq!(api.refresh_call_count(), 3);
    assert_eq!(creds.refresh_token().as_deref(), Some("refresh-old"));
}

#[tokio::test]
async fn cancelled_caller_does_not_wedge_later_renewals() {
    let api = Arc::new(MockApi::new(RefreshScript::Succeed {
        delay: Duration::from_millis(200),
        expires_in: Duration::from_secs(900),
    }));
    let coord = Arc::new(RenewCoordinator::new(Arc::clone(&api), seeded_cell()));

    // A caller that gives up mid-rotation, as a timeout or select! would.
    let abandoned = {
        let coord = Arc::clone(&coord);
        tokio::spawn(async move { coord.renew().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    abandoned.abort();
    assert!(abandoned.await.is_err());

    // The rotation it started still completes and publishes; a fresh call
    // afterwards must not block forever on a dead in-flight slot.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let result = tokio::time::timeout(Duration::from_secs(2), coord.renew())
        .await
        .unwrap_or_else(|_| panic!("renew() blocked after the first caller was dropped"));
    assert!(result.is_ok());
    assert_eq!(api.refresh_call_count(), 2);
}

#[tokio::test]
async fn caller_dropped_mid_flight_still_updates_credentials() {
    let api = Arc::new(MockApi::new(RefreshScript::Succeed {
        delay: Duration::from_millis(50),
        expires_in: Duration::from_secs(900),
    }));
    let creds = seeded_cell();
    let coord = Arc::new(RenewCoordinator::new(Arc::clone(&api), Arc::clone(&creds)));

    let abandoned = {
        let coord = Arc::clone(&coord);
        tokio::spawn(async move { coord.renew().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    abandoned.abort();

    // The detached rotation finishes on its own and rotates the stored pair.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.refresh_call_count(), 1);
    assert_ne!(creds.refresh_token().as_deref(), Some("refresh-old"));
}

#[tokio::test]
async fn rejection_is_not_retried() {
    let api = Arc::new(MockApi::new(RefreshScript::Reject));
    let coord = RenewCoordinator::new(Arc::clone(&api), seeded_cell())
        .with_retry(5, Duration::from_millis(1));

    assert_eq!(coord.renew().await, Err(RenewError::Rejected));
    assert_eq!(api.refresh_call_count(), 1);
}
