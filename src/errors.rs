// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Unified Error Handling System
//!
//! This module provides a centralized error handling system for the Tally server.
//! It defines standard error types, error codes, and HTTP response formatting to
//! ensure consistent error handling across all modules and APIs. Every failure in
//! the auth/session core is a typed value; the single translation to an HTTP
//! status happens in the [`axum::response::IntoResponse`] impl at the bottom.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::auth::JwtValidationError;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization (1000-1999)
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired = 1002,
    #[serde(rename = "AUTH_MALFORMED")]
    AuthMalformed = 1003,
    #[serde(rename = "AUTH_MISSING_SUBJECT")]
    AuthMissingSubject = 1004,
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 1005,
    #[serde(rename = "SELF_DEMOTION_FORBIDDEN")]
    SelfDemotionForbidden = 1006,
    #[serde(rename = "SELF_DELETION_FORBIDDEN")]
    SelfDeletionForbidden = 1007,

    // Refresh sessions (2000-2999)
    #[serde(rename = "REFRESH_TOKEN_NOT_FOUND")]
    RefreshTokenNotFound = 2000,
    #[serde(rename = "REFRESH_TOKEN_EXPIRED")]
    RefreshTokenExpired = 2001,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 4001,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    ///
    /// All credential failures (bad login, bad access token, bad refresh token)
    /// share 401 so callers cannot distinguish why authentication failed from
    /// the status alone.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 401 Unauthorized
            Self::AuthRequired
            | Self::AuthInvalid
            | Self::AuthExpired
            | Self::AuthMalformed
            | Self::AuthMissingSubject
            | Self::RefreshTokenNotFound
            | Self::RefreshTokenExpired => 401,

            // 403 Forbidden
            Self::PermissionDenied | Self::SelfDemotionForbidden | Self::SelfDeletionForbidden => {
                403
            }

            // 400 Bad Request
            Self::InvalidInput | Self::MissingRequiredField => 400,

            // 404 Not Found
            Self::ResourceNotFound => 404,

            // 409 Conflict
            Self::ResourceAlreadyExists => 409,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided credentials are invalid",
            Self::AuthExpired => "The access token has expired",
            Self::AuthMalformed => "The access token is malformed or corrupted",
            Self::AuthMissingSubject => "The access token carries no subject",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::SelfDemotionForbidden => "Administrators cannot remove their own admin rights",
            Self::SelfDeletionForbidden => "Administrators cannot delete their own account",
            Self::RefreshTokenNotFound => "The refresh token is not recognized",
            Self::RefreshTokenExpired => "The refresh token has expired",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Configuration error encountered",
        }
    }

    /// Whether this code maps to 401 and should carry a bearer challenge header
    #[must_use]
    pub const fn is_unauthorized(self) -> bool {
        self.http_status() == 401
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Caller lacks the admin flag or tried a forbidden privileged action
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Duplicate resource (e.g. registration with an email already in use)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

/// Conversion from JWT validation failures to the unified error type
///
/// Every kind keeps its own detail string for debugging, but all of them
/// resolve to the same 401 status with a bearer challenge (see
/// [`ErrorCode::http_status`]).
impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        let code = match &error {
            JwtValidationError::TokenExpired { .. } => ErrorCode::AuthExpired,
            JwtValidationError::TokenInvalid { .. } => ErrorCode::AuthInvalid,
            JwtValidationError::TokenMalformed { .. } => ErrorCode::AuthMalformed,
            JwtValidationError::TokenMissingSubject => ErrorCode::AuthMissingSubject,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

/// Conversion from anyhow::Error at the binary seam
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

/// Single boundary where typed errors become HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = ?self.code, "request failed: {}", self);
        } else {
            tracing::debug!(code = ?self.code, "request rejected: {}", self);
        }

        let challenge = self.code.is_unauthorized();
        let body = Json(ErrorResponse::from(self));

        if challenge {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::RefreshTokenNotFound.http_status(), 401);
        assert_eq!(ErrorCode::RefreshTokenExpired.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_token_failures_share_the_unauthorized_status() {
        // Status uniformity: the detail string may differ but the status
        // never reveals which check failed.
        for code in [
            ErrorCode::AuthInvalid,
            ErrorCode::AuthExpired,
            ErrorCode::AuthMalformed,
            ErrorCode::AuthMissingSubject,
        ] {
            assert_eq!(code.http_status(), 401);
            assert!(code.is_unauthorized());
        }
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::conflict("Email already registered");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("RESOURCE_ALREADY_EXISTS"));
        assert!(json.contains("Email already registered"));
    }
}
