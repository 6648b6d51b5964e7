// ABOUTME: UUID parsing utilities to eliminate duplication across the codebase
// ABOUTME: Provides safe UUID parsing with consistent error handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use crate::errors::{AppError, AppResult};
use uuid::Uuid;

/// Parse a UUID from a string with consistent error handling
///
/// # Errors
///
/// Returns an error if the string is not a valid UUID format
pub fn parse_uuid(uuid_str: &str) -> AppResult<Uuid> {
    Uuid::parse_str(uuid_str)
        .map_err(|_| AppError::internal(format!("Invalid UUID format: '{uuid_str}'")))
}
