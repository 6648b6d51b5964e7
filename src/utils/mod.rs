// ABOUTME: Shared utility module organization
// ABOUTME: Small helpers reused across routes, middleware and storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Shared utilities for the Tally server

/// Error construction helpers
pub mod errors;
/// UUID parsing helpers
pub mod uuid;
