// ABOUTME: Request authentication middleware for bearer access tokens
// ABOUTME: Extracts and verifies credentials and gates admin-only operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::utils::errors::permission_error;
use uuid::Uuid;

/// Authentication result with user context
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Authenticated user id
    pub user_id: Uuid,
}

/// Middleware for bearer-token request authentication
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request from its Authorization header
    ///
    /// Token verification is purely local (signature + clock); no store round
    /// trip happens here, so a database outage can never turn a good token
    /// into a rejected one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The header is missing or not a bearer credential
    /// - The access token fails verification (expired, malformed, bad
    ///   signature, missing subject)
    #[tracing::instrument(skip(self, auth_header), fields(user_id = tracing::field::Empty))]
    pub fn authenticate_request(&self, auth_header: Option<&str>) -> AppResult<AuthResult> {
        let Some(header) = auth_header else {
            tracing::debug!("authentication failed: missing authorization header");
            return Err(AppError::auth_required());
        };

        let Some(token) = header.strip_prefix("Bearer ") else {
            tracing::debug!("authentication failed: not a bearer credential");
            return Err(AppError::auth_invalid(
                "Invalid authorization header format - must be 'Bearer <token>'",
            ));
        };

        let user_id = self.auth_manager.verify_subject(token)?;
        tracing::Span::current().record("user_id", user_id.to_string());

        Ok(AuthResult { user_id })
    }

    /// Authenticate a request from the full header map
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::authenticate_request`]
    pub fn authenticate_headers(&self, headers: &axum::http::HeaderMap) -> AppResult<AuthResult> {
        let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());
        self.authenticate_request(auth_header)
    }

    /// Require that the authenticated caller holds the admin flag
    ///
    /// Evaluated before any privileged mutation.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the user is absent or not an admin
    pub async fn require_admin(&self, user_id: Uuid) -> AppResult<User> {
        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| permission_error("Admin access required"))?;

        if !user.is_admin {
            tracing::warn!(user_id = %user_id, "admin operation rejected for non-admin caller");
            return Err(permission_error("Admin access required"));
        }

        Ok(user)
    }
}
