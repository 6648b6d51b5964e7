// ABOUTME: Admin route handlers for session oversight and account administration
// ABOUTME: Every operation requires the caller's admin flag before any mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Admin routes
//!
//! Privileged operations layered on the refresh token store and the user
//! directory: active session listing, admin flag management, account deletion
//! and the global logout escape hatch. The admin check is a precondition
//! evaluated before any mutation.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::Database,
    errors::{AppError, AppResult, ErrorCode},
    server::ServerResources,
};

/// One row of the active sessions view
#[derive(Debug, Serialize)]
pub struct ActiveSessionInfo {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub logged_in_since: String,
}

/// Active sessions listing response
#[derive(Debug, Serialize)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<ActiveSessionInfo>,
    pub total_count: usize,
}

/// Admin flag update request
#[derive(Debug, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

/// Generic admin acknowledgement
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub message: String,
}

/// Global logout response
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub message: String,
    pub sessions_revoked: u64,
}

/// Admin service for privileged session and account operations
#[derive(Clone)]
pub struct AdminService {
    database: Arc<Database>,
}

impl AdminService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// List users with live sessions, joined with their profile fields
    ///
    /// # Errors
    ///
    /// Returns a database error if the store or directory query fails
    pub async fn list_sessions(&self) -> AppResult<Vec<ActiveSessionInfo>> {
        let sessions = self.database.list_active_sessions().await?;

        let mut rows = Vec::with_capacity(sessions.len());
        for session in sessions {
            // A session whose owner vanished mid-listing is skipped rather
            // than failing the whole view
            let Some(user) = self.database.get_user(session.user_id).await? else {
                continue;
            };
            rows.push(ActiveSessionInfo {
                user_id: user.id.to_string(),
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                is_admin: user.is_admin,
                logged_in_since: session.logged_in_since.to_rfc3339(),
            });
        }

        Ok(rows)
    }

    /// Set or clear a user's admin flag
    ///
    /// # Errors
    ///
    /// - `SelfDemotionForbidden` if an admin tries to drop their own flag
    /// - `ResourceNotFound` if the target does not exist
    pub async fn set_admin(
        &self,
        caller_id: Uuid,
        target_id: Uuid,
        is_admin: bool,
    ) -> AppResult<()> {
        if target_id == caller_id && !is_admin {
            return Err(AppError::new(
                ErrorCode::SelfDemotionForbidden,
                "Cannot remove admin rights from yourself",
            ));
        }

        self.database.set_admin_status(target_id, is_admin).await?;
        tracing::info!(admin = %caller_id, target = %target_id, is_admin, "admin flag updated");
        Ok(())
    }

    /// Delete a user account and everything that belongs to it
    ///
    /// # Errors
    ///
    /// - `SelfDeletionForbidden` if an admin targets themselves
    /// - `ResourceNotFound` if the target never existed
    pub async fn delete_user(&self, caller_id: Uuid, target_id: Uuid) -> AppResult<()> {
        if target_id == caller_id {
            return Err(AppError::new(
                ErrorCode::SelfDeletionForbidden,
                "Cannot delete your own user",
            ));
        }

        self.database.delete_user(target_id).await?;
        tracing::warn!(admin = %caller_id, target = %target_id, "user account deleted");
        Ok(())
    }

    /// Revoke every refresh token system-wide
    ///
    /// A privileged, irreversible escape hatch for suspected compromise.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn logout_all_users(&self, caller_id: Uuid) -> AppResult<u64> {
        let revoked = self.database.revoke_all_refresh_tokens().await?;
        tracing::warn!(admin = %caller_id, revoked, "global logout executed");
        Ok(revoked)
    }
}

/// Admin route handlers
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/admin/sessions", get(Self::handle_list_sessions))
            .route(
                "/api/v1/admin/users/:user_id/admin",
                put(Self::handle_set_admin),
            )
            .route(
                "/api/v1/admin/users/:user_id",
                delete(Self::handle_delete_user),
            )
            .route("/api/v1/admin/logout-all", post(Self::handle_logout_all))
            .with_state(resources)
    }

    /// Authenticate the caller and require the admin flag
    async fn authenticate_admin(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> AppResult<Uuid> {
        let auth = resources.auth_middleware.authenticate_headers(headers)?;
        resources.auth_middleware.require_admin(auth.user_id).await?;
        Ok(auth.user_id)
    }

    /// Handle active session listing
    async fn handle_list_sessions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let admin_id = Self::authenticate_admin(&headers, &resources).await?;
        tracing::info!(admin = %admin_id, "listing active sessions");

        let sessions = resources.admin_service.list_sessions().await?;
        let total_count = sessions.len();

        Ok((
            StatusCode::OK,
            Json(ActiveSessionsResponse {
                sessions,
                total_count,
            }),
        )
            .into_response())
    }

    /// Handle admin flag updates
    async fn handle_set_admin(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<Uuid>,
        headers: HeaderMap,
        Json(request): Json<SetAdminRequest>,
    ) -> AppResult<Response> {
        let admin_id = Self::authenticate_admin(&headers, &resources).await?;

        resources
            .admin_service
            .set_admin(admin_id, user_id, request.is_admin)
            .await?;

        Ok((
            StatusCode::OK,
            Json(AdminResponse {
                message: format!("User {user_id} admin status set to {}", request.is_admin),
            }),
        )
            .into_response())
    }

    /// Handle account deletion
    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<Uuid>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let admin_id = Self::authenticate_admin(&headers, &resources).await?;

        resources.admin_service.delete_user(admin_id, user_id).await?;

        Ok((
            StatusCode::OK,
            Json(AdminResponse {
                message: format!("User {user_id} deleted successfully"),
            }),
        )
            .into_response())
    }

    /// Handle the global logout escape hatch
    async fn handle_logout_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let admin_id = Self::authenticate_admin(&headers, &resources).await?;

        let sessions_revoked = resources.admin_service.logout_all_users(admin_id).await?;

        Ok((
            StatusCode::OK,
            Json(LogoutAllResponse {
                message: "All users have been logged out".into(),
                sessions_revoked,
            }),
        )
            .into_response())
    }
}
