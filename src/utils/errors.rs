// ABOUTME: Error construction helpers shared by routes and middleware
// ABOUTME: Short constructors for the most common request rejection kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use crate::errors::{AppError, ErrorCode};

/// Build a validation error for malformed request input
#[must_use]
pub fn validation_error(message: &str) -> AppError {
    AppError::new(ErrorCode::InvalidInput, message)
}

/// Build a generic authentication failure
///
/// Used wherever the caller must not learn which part of the credentials was
/// wrong.
#[must_use]
pub fn auth_error(message: &str) -> AppError {
    AppError::new(ErrorCode::AuthInvalid, message)
}

/// Build a permission failure for non-admin callers
#[must_use]
pub fn permission_error(message: &str) -> AppError {
    AppError::new(ErrorCode::PermissionDenied, message)
}
