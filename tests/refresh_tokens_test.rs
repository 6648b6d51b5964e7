// ABOUTME: Integration tests for the refresh token store and rotation protocol
// ABOUTME: Validates single-use consumption, lazy expiry, revocation and session listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use tally_server::errors::ErrorCode;
use uuid::Uuid;

#[tokio::test]
async fn test_issue_refresh_token() {
    let database = common::test_db().await;
    let user_id = Uuid::new_v4();
    let ttl = Duration::days(7);

    let record = database.issue_refresh_token(user_id, ttl).await.unwrap();

    assert!(record.token.starts_with("rt_"));
    assert_eq!(record.user_id, user_id);
    assert!(record.expires_at > Utc::now() + Duration::days(6));

    // The opaque value never encodes the owner id
    assert!(!record.token.contains(&user_id.to_string()));

    let stored = database.get_refresh_token(&record.token).await.unwrap();
    assert_eq!(stored.unwrap().user_id, user_id);
}

#[tokio::test]
async fn test_rotation_is_single_use() {
    let database = common::test_db().await;
    let user_id = Uuid::new_v4();
    let ttl = Duration::days(7);

    let original = database.issue_refresh_token(user_id, ttl).await.unwrap();

    let rotated = database
        .rotate_refresh_token(&original.token, ttl)
        .await
        .unwrap();
    assert_ne!(rotated.token, original.token);
    assert_eq!(rotated.user_id, user_id);

    // The consumed value is gone
    assert!(database
        .get_refresh_token(&original.token)
        .await
        .unwrap()
        .is_none());

    // Reusing the stale value always fails
    let err = database
        .rotate_refresh_token(&original.token, ttl)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefreshTokenNotFound);

    // The replacement still works
    database
        .rotate_refresh_token(&rotated.token, ttl)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_token_is_deleted_on_rotation() {
    let database = common::test_db().await;
    let user_id = Uuid::new_v4();

    // Negative ttl produces an already-lapsed record
    let record = database
        .issue_refresh_token(user_id, Duration::seconds(-10))
        .await
        .unwrap();

    let err = database
        .rotate_refresh_token(&record.token, Duration::days(7))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefreshTokenExpired);

    // The lapsed record was discarded, so a retry observes plain absence
    assert!(database
        .get_refresh_token(&record.token)
        .await
        .unwrap()
        .is_none());
    let err = database
        .rotate_refresh_token(&record.token, Duration::days(7))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefreshTokenNotFound);
}

#[tokio::test]
async fn test_concurrent_rotation_has_exactly_one_winner() {
    let database = common::test_db().await;
    let user_id = Uuid::new_v4();
    let ttl = Duration::days(7);

    let record = database.issue_refresh_token(user_id, ttl).await.unwrap();

    let (first, second) = tokio::join!(
        database.rotate_refresh_token(&record.token, ttl),
        database.rotate_refresh_token(&record.token, ttl),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one rotation must win, never both, never zero");

    let loser = if first.is_ok() { second } else { first };
    assert_eq!(loser.unwrap_err().code, ErrorCode::RefreshTokenNotFound);
}

#[tokio::test]
async fn test_revocation_is_idempotent() {
    let database = common::test_db().await;
    let user_id = Uuid::new_v4();
    let ttl = Duration::days(7);

    let record = database.issue_refresh_token(user_id, ttl).await.unwrap();

    database.revoke_refresh_token(&record.token).await.unwrap();
    assert!(database
        .get_refresh_token(&record.token)
        .await
        .unwrap()
        .is_none());

    // Revoking again, or revoking something that never existed, is a no-op
    database.revoke_refresh_token(&record.token).await.unwrap();
    database.revoke_refresh_token("rt_never_issued").await.unwrap();
}

#[tokio::test]
async fn test_revoke_all_for_one_user() {
    let database = common::test_db().await;
    let ttl = Duration::days(7);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for _ in 0..3 {
        database.issue_refresh_token(alice, ttl).await.unwrap();
    }
    let bob_token = database.issue_refresh_token(bob, ttl).await.unwrap();

    let revoked = database.revoke_user_refresh_tokens(alice).await.unwrap();
    assert_eq!(revoked, 3);

    // Bob's session survives
    assert!(database
        .get_refresh_token(&bob_token.token)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_revoke_everything() {
    let database = common::test_db().await;
    let ttl = Duration::days(7);

    for _ in 0..4 {
        database
            .issue_refresh_token(Uuid::new_v4(), ttl)
            .await
            .unwrap();
    }

    let revoked = database.revoke_all_refresh_tokens().await.unwrap();
    assert_eq!(revoked, 4);
    assert!(database.list_active_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_active_session_listing() {
    let database = common::test_db().await;
    let ttl = Duration::days(7);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let alice_first = database.issue_refresh_token(alice, ttl).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    database.issue_refresh_token(alice, ttl).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    database.issue_refresh_token(bob, ttl).await.unwrap();

    // An expired session for a third user must not appear
    database
        .issue_refresh_token(Uuid::new_v4(), Duration::seconds(-10))
        .await
        .unwrap();

    let sessions = database.list_active_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);

    // Most recent activity first: bob's token was issued last
    assert_eq!(sessions[0].user_id, bob);
    assert_eq!(sessions[1].user_id, alice);

    // One row per user, keyed by the earliest live issued-at
    let drift = sessions[1].logged_in_since - alice_first.issued_at;
    assert!(
        drift.num_milliseconds().abs() < 5,
        "logged_in_since should be the earliest issued-at, drift: {drift}"
    );
}
