// ABOUTME: Core data models for the Tally finance API
// ABOUTME: Defines User, refresh session records and request/response payload types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! # Data Models
//!
//! Core data structures used throughout the Tally server. The `User` model is
//! the principal record owned by the user directory; refresh session types
//! describe the persisted long-lived credentials and what the store returns
//! when one is rotated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address (unique, used for login)
    pub email: String,
    /// Hashed password for authentication (never the plaintext)
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Whether this user has admin privileges
    pub is_admin: bool,
    /// When the user account was created
    pub created_at: DateTime<Utc>,
    /// Last time the user authenticated or refreshed a session
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and timestamps
    #[must_use]
    pub fn new(email: String, password_hash: String, first_name: String, last_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            is_admin: false,
            created_at: now,
            last_active: now,
        }
    }
}

/// Explicit patch applied to a user profile
///
/// Each field is optional and is validated and applied by name; there is no
/// generic field-map update path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New given name, if changing
    pub first_name: Option<String>,
    /// New family name, if changing
    pub last_name: Option<String>,
}

impl UserUpdate {
    /// Whether the patch carries no changes at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

/// A persisted refresh token record
///
/// The token value doubles as the unique key. A record either exists and is
/// consumable exactly once, or is absent; there is no consumed-but-retained
/// state.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// Opaque token value (unique key)
    pub token: String,
    /// Owning user id
    pub user_id: Uuid,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
    /// When the record was created
    pub issued_at: DateTime<Utc>,
}

/// Result of atomically consuming and replacing a refresh token
#[derive(Debug, Clone)]
pub struct RotatedSession {
    /// Replacement token value
    pub token: String,
    /// Expiry of the replacement token
    pub expires_at: DateTime<Utc>,
    /// Owner of both the consumed and the replacement token
    pub user_id: Uuid,
}

/// One active session row for the admin view
///
/// One entry per user with at least one live refresh token;
/// `logged_in_since` is the earliest live issued-at for that user.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    /// Owning user id
    pub user_id: Uuid,
    /// Earliest non-expired issued-at among the user's tokens
    pub logged_in_since: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(
            "test@example.com".into(),
            "hashed_password_123".into(),
            "Test".into(),
            "User".into(),
        );
        assert!(!user.is_admin);
        assert_eq!(user.email, "test@example.com");
        assert!(user.created_at <= Utc::now());
    }

    #[test]
    fn test_empty_user_update() {
        assert!(UserUpdate::default().is_empty());
        let patch = UserUpdate {
            first_name: Some("New".into()),
            last_name: None,
        };
        assert!(!patch.is_empty());
    }
}
