// ABOUTME: User authentication route handlers for registration, login, refresh and logout
// ABOUTME: Thin axum wrappers delegating session issuance and rotation to the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Authentication routes for session management
//!
//! Register and login mint an access/refresh pair; refresh atomically rotates
//! the persisted refresh credential; logout revokes it. The refresh value
//! travels only in an HttpOnly, path-scoped cookie. All handlers are thin
//! wrappers that delegate business logic to [`AuthService`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthManager,
    constants::{error_messages, limits},
    database::Database,
    errors::{AppError, AppResult, ErrorCode},
    models::User,
    security::cookies,
    server::ServerResources,
    utils::errors::{auth_error, validation_error},
};

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access token response body; the refresh value rides in the cookie only
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Logout acknowledgement
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// A freshly minted access/refresh pair
#[derive(Debug)]
pub struct IssuedSession {
    /// Authenticated user
    pub user_id: Uuid,
    /// Signed short-lived access token
    pub access_token: String,
    /// Opaque persisted refresh token
    pub refresh_token: String,
    /// Expiry of the refresh token
    pub refresh_expires_at: DateTime<Utc>,
}

/// Authentication service for session business logic
#[derive(Clone)]
pub struct AuthService {
    database: Arc<Database>,
    auth_manager: Arc<AuthManager>,
    refresh_token_expiry: Duration,
}

impl AuthService {
    /// Create the service with its collaborators
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        auth_manager: Arc<AuthManager>,
        refresh_token_expiry_days: i64,
    ) -> Self {
        Self {
            database,
            auth_manager,
            refresh_token_expiry: Duration::days(refresh_token_expiry_days),
        }
    }

    /// How long issued refresh tokens live
    #[must_use]
    pub const fn refresh_token_expiry(&self) -> Duration {
        self.refresh_token_expiry
    }

    /// Handle user registration
    ///
    /// The existence pre-check is a fast path only; the final arbiter for a
    /// duplicate email under concurrent registration is the unique constraint
    /// inside [`Database::create_user`].
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, `ResourceAlreadyExists`
    /// for a duplicate email, or a database error
    pub async fn register(&self, request: RegisterRequest) -> AppResult<IssuedSession> {
        tracing::info!("user registration attempt for email: {}", request.email);

        if !Self::is_valid_email(&request.email) {
            return Err(validation_error(error_messages::INVALID_EMAIL_FORMAT));
        }
        if !Self::is_valid_password(&request.password) {
            return Err(validation_error(error_messages::PASSWORD_TOO_WEAK));
        }
        Self::validate_name(&request.first_name, "first_name")?;
        Self::validate_name(&request.last_name, "last_name")?;

        if self
            .database
            .get_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(error_messages::USER_ALREADY_EXISTS));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        let user = User::new(
            request.email.clone(), // Safe: String ownership needed for user model
            password_hash,
            request.first_name,
            request.last_name,
        );

        let user_id = self.database.create_user(&user).await?;
        tracing::info!("user registered successfully: {} ({})", request.email, user_id);

        self.issue_session(user_id).await
    }

    /// Handle user login
    ///
    /// An unknown email and a wrong password produce the same failure; the
    /// caller learns nothing about which accounts exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` on bad credentials or a database error
    pub async fn login(&self, request: LoginRequest) -> AppResult<IssuedSession> {
        tracing::info!("user login attempt for email: {}", request.email);

        let Some(user) = self.database.get_user_by_email(&request.email).await? else {
            tracing::debug!("login rejected: unknown email");
            return Err(auth_error(error_messages::INVALID_CREDENTIALS));
        };

        // Verify password on the blocking pool to keep the async executor free
        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            tracing::debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(auth_error(error_messages::INVALID_CREDENTIALS));
        }

        self.database.update_last_active(user.id).await?;
        tracing::info!("user logged in successfully: {} ({})", user.email, user.id);

        self.issue_session(user.id).await
    }

    /// Handle refresh token rotation
    ///
    /// Store-level failure kinds (unknown vs. expired) are collapsed into one
    /// generic authentication failure at this boundary.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the token cannot be consumed, or a database
    /// error
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<IssuedSession> {
        let rotated = self
            .database
            .rotate_refresh_token(refresh_token, self.refresh_token_expiry)
            .await
            .map_err(|e| match e.code {
                ErrorCode::RefreshTokenNotFound | ErrorCode::RefreshTokenExpired => {
                    auth_error(error_messages::INVALID_REFRESH_TOKEN)
                }
                _ => e,
            })?;

        let access_token = self.auth_manager.generate_token(rotated.user_id)?;
        self.database.update_last_active(rotated.user_id).await?;

        tracing::info!(user_id = %rotated.user_id, "session refreshed");

        Ok(IssuedSession {
            user_id: rotated.user_id,
            access_token,
            refresh_token: rotated.token,
            refresh_expires_at: rotated.expires_at,
        })
    }

    /// Handle logout
    ///
    /// Always succeeds: revoking an unknown or already-consumed token is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store delete itself fails
    pub async fn logout(&self, refresh_token: Option<&str>) -> AppResult<()> {
        if let Some(token) = refresh_token {
            self.database.revoke_refresh_token(token).await?;
        }
        Ok(())
    }

    /// Mint a new access/refresh pair for a user
    async fn issue_session(&self, user_id: Uuid) -> AppResult<IssuedSession> {
        let access_token = self.auth_manager.generate_token(user_id)?;
        let refresh = self
            .database
            .issue_refresh_token(user_id, self.refresh_token_expiry)
            .await?;

        Ok(IssuedSession {
            user_id,
            access_token,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        let domain_part = &email[at_pos + 1..];
        domain_part.contains('.')
    }

    /// Validate password strength
    #[must_use]
    pub fn is_valid_password(password: &str) -> bool {
        password.len() >= limits::MIN_PASSWORD_LENGTH
    }

    /// Validate a name field
    fn validate_name(value: &str, field: &str) -> AppResult<()> {
        if value.trim().is_empty() || value.len() > limits::MAX_NAME_LENGTH {
            return Err(validation_error(&format!("Invalid value for {field}")));
        }
        Ok(())
    }
}

/// Authentication route handlers
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/users/register", post(Self::handle_register))
            .route("/api/v1/users/login", post(Self::handle_login))
            .route("/api/v1/users/refresh", post(Self::handle_refresh))
            .route("/api/v1/users/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    /// Handle user registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> AppResult<Response> {
        let session = resources.auth_service.register(request).await?;
        Ok(session_response(&resources, &session))
    }

    /// Handle user login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> AppResult<Response> {
        let session = resources.auth_service.login(request).await?;
        Ok(session_response(&resources, &session))
    }

    /// Handle refresh token rotation via the scoped cookie
    async fn handle_refresh(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let Some(token) = cookies::get_cookie_value(&headers, cookies::REFRESH_COOKIE_NAME) else {
            return Err(auth_error("Missing refresh token"));
        };

        let session = resources.auth_service.refresh(&token).await?;
        Ok(session_response(&resources, &session))
    }

    /// Handle logout; reports success even for unknown tokens
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let token = cookies::get_cookie_value(&headers, cookies::REFRESH_COOKIE_NAME);
        resources.auth_service.logout(token.as_deref()).await?;

        let clear = cookies::clear_refresh_cookie(resources.config.auth.secure_cookies);
        Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, clear)],
            Json(LogoutResponse {
                message: "Logged out successfully".into(),
            }),
        )
            .into_response())
    }
}

/// Build the access-token body plus refresh cookie response
fn session_response(resources: &ServerResources, session: &IssuedSession) -> Response {
    let max_age = resources
        .auth_service
        .refresh_token_expiry()
        .num_seconds();
    let cookie = cookies::refresh_cookie(
        &session.refresh_token,
        max_age,
        resources.config.auth.secure_cookies,
    );

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: session.access_token.clone(), // Safe: response body ownership
            token_type: "bearer".into(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(AuthService::is_valid_email("user@example.com"));
        assert!(!AuthService::is_valid_email("short"));
        assert!(!AuthService::is_valid_email("no-at-sign.com"));
        assert!(!AuthService::is_valid_email("@example.com"));
        assert!(!AuthService::is_valid_email("user@nodomain"));
    }

    #[test]
    fn test_password_validation() {
        assert!(AuthService::is_valid_password("longenough"));
        assert!(!AuthService::is_valid_password("short"));
    }
}
