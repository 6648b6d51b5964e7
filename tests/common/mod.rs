// ABOUTME: Shared helpers for integration tests
// ABOUTME: In-memory database construction and pre-wired service instances
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

#![allow(dead_code)]

use std::sync::Arc;

use tally_server::auth::AuthManager;
use tally_server::database::{create_test_db, Database};
use tally_server::models::User;
use tally_server::routes::{AdminService, AuthService, RegisterRequest};

/// Access token lifetime used by tests, in minutes
pub const TEST_ACCESS_TOKEN_MINUTES: i64 = 15;
/// Refresh token lifetime used by tests, in days
pub const TEST_REFRESH_TOKEN_DAYS: i64 = 7;
/// Low bcrypt cost keeps directly-inserted fixtures fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Create an isolated in-memory database
pub async fn test_db() -> Arc<Database> {
    Arc::new(create_test_db().await.expect("Failed to create test database"))
}

/// Create an auth manager with a fixed test secret
pub fn test_auth_manager() -> Arc<AuthManager> {
    Arc::new(AuthManager::new(
        b"integration-test-signing-secret",
        TEST_ACCESS_TOKEN_MINUTES,
    ))
}

/// Wire an auth service over the given database
pub fn auth_service(database: &Arc<Database>) -> AuthService {
    AuthService::new(
        Arc::clone(database),
        test_auth_manager(),
        TEST_REFRESH_TOKEN_DAYS,
    )
}

/// Wire an admin service over the given database
pub fn admin_service(database: &Arc<Database>) -> AdminService {
    AdminService::new(Arc::clone(database))
}

/// Build a registration request for the given email
pub fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.into(),
        password: "secret-password-1".into(),
        first_name: "Test".into(),
        last_name: "User".into(),
    }
}

/// Insert a user directly, bypassing the registration flow
pub async fn insert_user(database: &Database, email: &str, password: &str, is_admin: bool) -> User {
    let password_hash =
        bcrypt::hash(password, TEST_BCRYPT_COST).expect("Failed to hash test password");
    let mut user = User::new(email.into(), password_hash, "Test".into(), "User".into());
    user.is_admin = is_admin;

    database
        .create_user(&user)
        .await
        .expect("Failed to insert test user");

    user
}
