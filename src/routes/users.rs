// ABOUTME: User profile route handlers for the authenticated account
// ABOUTME: Exposes profile retrieval and explicit field-by-field profile patching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Profile routes for the authenticated user

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    constants::limits,
    errors::{AppError, AppResult, ErrorCode},
    models::{User, UserUpdate},
    server::ServerResources,
    utils::errors::validation_error,
};

/// Profile payload returned for the authenticated user
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// User profile route handlers
pub struct UserRoutes;

impl UserRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/v1/users/me",
                get(Self::handle_get_profile).patch(Self::handle_update_profile),
            )
            .with_state(resources)
    }

    /// Return the caller's profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;

        let user = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok((StatusCode::OK, Json(UserProfileResponse::from(user))).into_response())
    }

    /// Apply a profile patch for the caller
    ///
    /// Every optional field is validated and applied by name; an empty patch
    /// is rejected rather than silently accepted.
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(patch): Json<UserUpdate>,
    ) -> AppResult<Response> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;

        validate_patch(&patch)?;

        let user = resources
            .database
            .update_user_profile(auth.user_id, &patch)
            .await?;

        tracing::info!(user_id = %auth.user_id, "user profile updated");

        Ok((StatusCode::OK, Json(UserProfileResponse::from(user))).into_response())
    }
}

/// Validate each provided patch field against the profile schema
fn validate_patch(patch: &UserUpdate) -> AppResult<()> {
    if patch.is_empty() {
        return Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "No fields provided for update",
        ));
    }

    if let Some(first_name) = &patch.first_name {
        if first_name.trim().is_empty() || first_name.len() > limits::MAX_NAME_LENGTH {
            return Err(validation_error("Invalid value for first_name"));
        }
    }
    if let Some(last_name) = &patch.last_name {
        if last_name.trim().is_empty() || last_name.len() > limits::MAX_NAME_LENGTH {
            return Err(validation_error("Invalid value for last_name"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation() {
        assert!(validate_patch(&UserUpdate::default()).is_err());

        let valid = UserUpdate {
            first_name: Some("Ada".into()),
            last_name: None,
        };
        assert!(validate_patch(&valid).is_ok());

        let blank = UserUpdate {
            first_name: Some("   ".into()),
            last_name: None,
        };
        assert!(validate_patch(&blank).is_err());
    }
}
