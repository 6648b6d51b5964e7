// ABOUTME: Refresh token persistence and the single-use rotation protocol
// ABOUTME: Issue, atomically consume-and-rotate, revoke and enumerate long-lived session credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Refresh token store
//!
//! A refresh token is an opaque random value persisted with its owner and
//! expiry. Consumption is deletion: a stored value either exists exactly once
//! or is absent, so rotation, expiry and revocation all converge on row
//! absence. Rotation consumes the record through a single conditional delete,
//! which makes every token consumable at most once even under concurrent
//! presentation of the same value.

use super::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{ActiveSession, RefreshTokenRecord, RotatedSession};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::Row;
use uuid::Uuid;

/// Length of the random part of a refresh token value
const REFRESH_TOKEN_RANDOM_LEN: usize = 48;

/// Generate an unguessable opaque token value
///
/// The value is pure CSPRNG output; it never encodes the owner id.
fn generate_token_value() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("rt_{random}")
}

impl Database {
    /// Create the refresh_tokens table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_refresh_tokens(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at DATETIME NOT NULL,
                issued_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create refresh_tokens table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create refresh_tokens index: {e}")))?;

        Ok(())
    }

    /// Issue a fresh refresh token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn issue_refresh_token(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> AppResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord {
            token: generate_token_value(),
            user_id,
            expires_at: Utc::now() + ttl,
            issued_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO refresh_tokens (token, user_id, expires_at, issued_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&record.token)
        .bind(record.user_id.to_string())
        .bind(record.expires_at)
        .bind(record.issued_at)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to store refresh token: {e}")))?;

        Ok(record)
    }

    /// Atomically consume a refresh token and issue its replacement
    ///
    /// The conditional delete is the arbiter: `DELETE .. RETURNING` removes
    /// and reports the record in one statement, so of N concurrent callers
    /// presenting the same value exactly one observes the row and proceeds
    /// to insert a replacement; every other caller sees absence. A lapsed
    /// record is consumed the same way but refused, which is the lazy expiry
    /// path - a retry then observes plain absence.
    ///
    /// # Errors
    ///
    /// - `RefreshTokenNotFound` if the value is unknown or already consumed
    /// - `RefreshTokenExpired` if the record existed but had lapsed
    pub async fn rotate_refresh_token(
        &self,
        token_value: &str,
        ttl: Duration,
    ) -> AppResult<RotatedSession> {
        let row = sqlx::query(
            "DELETE FROM refresh_tokens WHERE token = $1 RETURNING user_id, expires_at",
        )
        .bind(token_value)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to consume refresh token: {e}")))?;

        let Some(row) = row else {
            return Err(AppError::new(
                ErrorCode::RefreshTokenNotFound,
                "Refresh token not found",
            ));
        };

        let owner: String = row.get("user_id");
        let user_id = crate::utils::uuid::parse_uuid(&owner)?;
        let expires_at: DateTime<Utc> = row.get("expires_at");

        if expires_at < Utc::now() {
            tracing::debug!(user_id = %user_id, "discarded expired refresh token");
            return Err(AppError::new(
                ErrorCode::RefreshTokenExpired,
                "Refresh token expired",
            ));
        }

        let replacement = RefreshTokenRecord {
            token: generate_token_value(),
            user_id,
            expires_at: Utc::now() + ttl,
            issued_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO refresh_tokens (token, user_id, expires_at, issued_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&replacement.token)
        .bind(replacement.user_id.to_string())
        .bind(replacement.expires_at)
        .bind(replacement.issued_at)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to store rotated token: {e}")))?;

        Ok(RotatedSession {
            token: replacement.token,
            expires_at: replacement.expires_at,
            user_id,
        })
    }

    /// Fetch a stored refresh token record by value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_refresh_token(&self, token_value: &str) -> AppResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query(
            "SELECT token, user_id, expires_at, issued_at FROM refresh_tokens WHERE token = $1",
        )
        .bind(token_value)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to query refresh token: {e}")))?;

        row.map(|r| {
            let owner: String = r.get("user_id");
            Ok(RefreshTokenRecord {
                token: r.get("token"),
                user_id: crate::utils::uuid::parse_uuid(&owner)?,
                expires_at: r.get("expires_at"),
                issued_at: r.get("issued_at"),
            })
        })
        .transpose()
    }

    /// Delete one refresh token if present
    ///
    /// Logout is idempotent: revoking an unknown or already-consumed value is
    /// a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the delete itself fails
    pub async fn revoke_refresh_token(&self, token_value: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token_value)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke refresh token: {e}")))?;

        Ok(())
    }

    /// Delete every refresh token belonging to one user
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke user sessions: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Delete every refresh token system-wide
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn revoke_all_refresh_tokens(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens")
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke all sessions: {e}")))?;

        let revoked = result.rows_affected();
        tracing::warn!(revoked, "all refresh tokens revoked");
        Ok(revoked)
    }

    /// List users with at least one live refresh token
    ///
    /// Expired rows are discarded first (lazy expiry). One entry per user;
    /// `logged_in_since` is the earliest live issued-at, and users with the
    /// most recent session activity come first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup or query fails
    pub async fn list_active_sessions(&self) -> AppResult<Vec<ActiveSession>> {
        let now = Utc::now();

        sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to prune expired tokens: {e}")))?;

        let rows = sqlx::query(
            r"
            SELECT user_id,
                   MIN(issued_at) AS logged_in_since,
                   MAX(issued_at) AS last_activity
            FROM refresh_tokens
            GROUP BY user_id
            ORDER BY last_activity DESC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list active sessions: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let owner: String = row.get("user_id");
                Ok(ActiveSession {
                    user_id: crate::utils::uuid::parse_uuid(&owner)?,
                    logged_in_since: row.get("logged_in_since"),
                })
            })
            .collect()
    }
}
