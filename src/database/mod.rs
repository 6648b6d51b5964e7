// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! This module provides database functionality for the Tally server. It owns
//! the connection pool, creates the schema on startup, and hosts the user,
//! refresh-token and transaction table operations in their domain files.

mod refresh_tokens;
mod transactions;
mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::errors::{AppError, AppResult};

/// Database manager for user and session storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// creation fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // A single connection keeps an in-memory database coherent across the
        // pool; file-backed databases get a real pool.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 10 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_refresh_tokens().await?;
        self.migrate_transactions().await?;
        Ok(())
    }
}

/// Create a test database instance backed by in-process memory
///
/// # Errors
///
/// Returns an error if database initialization fails
pub async fn create_test_db() -> AppResult<Database> {
    Database::new("sqlite::memory:").await
}
