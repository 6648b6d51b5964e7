// ABOUTME: User directory database operations
// ABOUTME: Handles user creation, lookup, profile updates, admin flag and cascading deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use super::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{User, UserUpdate};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                is_admin BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                last_active DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to create users index: {e}")))?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// The unique constraint on `email` is the authoritative duplicate
    /// detector; callers may pre-check for a friendlier fast path but must
    /// not rely on it under concurrency.
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database
    /// error otherwise
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, first_name, last_name, is_admin, created_at, last_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.last_active)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::new(ErrorCode::ResourceAlreadyExists, "Email already registered")
                    .with_source(e)
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        Ok(user.id)
    }

    /// Fetch a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to query user: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Fetch a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to query user by email: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Apply a validated profile patch, field by field
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn update_user_profile(&self, user_id: Uuid, patch: &UserUpdate) -> AppResult<User> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name)
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update user profile: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Set or clear the admin flag on a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn set_admin_status(&self, user_id: Uuid, is_admin: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
            .bind(user_id.to_string())
            .bind(is_admin)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to update admin flag: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }

        Ok(())
    }

    /// Record session activity for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_last_active(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_active = $2 WHERE id = $1")
            .bind(user_id.to_string())
            .bind(Utc::now())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to update last_active: {e}")))?;

        Ok(())
    }

    /// Delete a user together with everything that belongs to them
    ///
    /// Children are removed before the parent row, in a fixed order, inside
    /// one transaction: refresh tokens, then transactions, then the user.
    /// The schema declares no cascading constraints.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user never existed
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let id = user_id.to_string();

        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user sessions: {e}")))?;

        sqlx::query("DELETE FROM transactions WHERE user_id = $1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user transactions: {e}")))?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user: {e}")))?;

        if result.rows_affected() == 0 {
            // Nothing was deleted anywhere; roll the transaction back
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Err(AppError::not_found("User"));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit user deletion: {e}")))?;

        Ok(())
    }
}

/// Decode one users row
fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let created_at: DateTime<Utc> = row.get("created_at");
    let last_active: DateTime<Utc> = row.get("last_active");

    Ok(User {
        id: crate::utils::uuid::parse_uuid(&id)?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_admin: row.get("is_admin"),
        created_at,
        last_active,
    })
}

/// Whether a sqlx error is a uniqueness-constraint violation
fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
