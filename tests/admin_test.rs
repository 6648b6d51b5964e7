// ABOUTME: Integration tests for admin session control and account administration
// ABOUTME: Validates the admin gate, self-protection rules, cascading deletion and global logout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;
use tally_server::errors::ErrorCode;
use tally_server::middleware::AuthMiddleware;
use uuid::Uuid;

#[tokio::test]
async fn test_admin_gate() {
    let database = common::test_db().await;
    let middleware = AuthMiddleware::new(common::test_auth_manager(), Arc::clone(&database));

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    let user = common::insert_user(&database, "user@x.com", "user-pass-11", false).await;

    middleware.require_admin(admin.id).await.unwrap();

    let err = middleware.require_admin(user.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    // A valid token for a deleted account gets the same rejection
    let err = middleware.require_admin(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_set_admin_flag() {
    let database = common::test_db().await;
    let service = common::admin_service(&database);

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    let user = common::insert_user(&database, "user@x.com", "user-pass-11", false).await;

    service.set_admin(admin.id, user.id, true).await.unwrap();
    let promoted = database.get_user(user.id).await.unwrap().unwrap();
    assert!(promoted.is_admin);

    service.set_admin(admin.id, user.id, false).await.unwrap();
    let demoted = database.get_user(user.id).await.unwrap().unwrap();
    assert!(!demoted.is_admin);

    let err = service
        .set_admin(admin.id, Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_self_demotion_is_always_forbidden() {
    let database = common::test_db().await;
    let service = common::admin_service(&database);

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    let plain = common::insert_user(&database, "plain@x.com", "plain-pass-1", false).await;

    let err = service.set_admin(admin.id, admin.id, false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SelfDemotionForbidden);

    // The rule does not depend on the caller's current admin state
    let err = service.set_admin(plain.id, plain.id, false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SelfDemotionForbidden);

    // Re-granting your own flag is not a demotion and passes the self check
    service.set_admin(admin.id, admin.id, true).await.unwrap();
}

#[tokio::test]
async fn test_delete_user_cascades_children_first() {
    let database = common::test_db().await;
    let service = common::admin_service(&database);

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    let victim = common::insert_user(&database, "victim@x.com", "victim-pass", false).await;

    database
        .issue_refresh_token(victim.id, Duration::days(7))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO transactions (id, user_id, amount, kind, description, date) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(victim.id.to_string())
    .bind(42.5_f64)
    .bind("expense")
    .bind("groceries")
    .bind(Utc::now())
    .execute(database.pool())
    .await
    .unwrap();

    service.delete_user(admin.id, victim.id).await.unwrap();

    assert!(database.get_user(victim.id).await.unwrap().is_none());
    assert_eq!(database.count_user_transactions(victim.id).await.unwrap(), 0);
    assert!(database
        .list_active_sessions()
        .await
        .unwrap()
        .iter()
        .all(|s| s.user_id != victim.id));

    // Deleting a user that never existed is a distinct failure
    let err = service.delete_user(admin.id, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_self_deletion_is_forbidden() {
    let database = common::test_db().await;
    let service = common::admin_service(&database);

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;

    let err = service.delete_user(admin.id, admin.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SelfDeletionForbidden);
    assert!(database.get_user(admin.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_global_logout() {
    let database = common::test_db().await;
    let service = common::admin_service(&database);

    let admin = common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    for _ in 0..3 {
        database
            .issue_refresh_token(Uuid::new_v4(), Duration::days(7))
            .await
            .unwrap();
    }

    let revoked = service.logout_all_users(admin.id).await.unwrap();
    assert_eq!(revoked, 3);
    assert!(database.list_active_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_listing_joins_profiles() {
    let database = common::test_db().await;
    let admin_service = common::admin_service(&database);
    let auth_service = common::auth_service(&database);

    common::insert_user(&database, "admin@x.com", "admin-pass-1", true).await;
    auth_service
        .register(common::register_request("alice@x.com"))
        .await
        .unwrap();
    auth_service
        .register(common::register_request("bob@x.com"))
        .await
        .unwrap();

    let sessions = admin_service.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);

    let emails: Vec<&str> = sessions.iter().map(|s| s.email.as_str()).collect();
    assert!(emails.contains(&"alice@x.com"));
    assert!(emails.contains(&"bob@x.com"));
    // Profile fields ride along with each session row
    assert!(sessions.iter().all(|s| s.first_name == "Test"));
}
