// ABOUTME: Security helper module organization
// ABOUTME: Cookie handling for the refresh credential transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Security helpers for the Tally server

/// HTTP cookie parsing and construction
pub mod cookies;
