// ABOUTME: Transaction table schema and ownership queries
// ABOUTME: Storage surface only; transaction CRUD endpoints live outside this service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use super::Database;
use crate::errors::{AppError, AppResult};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the transactions table
    ///
    /// The table is migrated here because account deletion must cascade over
    /// it; the expense CRUD service owns its contents.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_transactions(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                description TEXT,
                date DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create transactions table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id)",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create transactions index: {e}")))?;

        Ok(())
    }

    /// Count transactions belonging to a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_user_transactions(&self, user_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transactions WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to count transactions: {e}")))?;

        Ok(row.get("n"))
    }
}
