// ABOUTME: Library root for the Tally Finance authentication and session server
// ABOUTME: Module organization for the auth/session core and its HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! # Tally Server
//!
//! Authentication and session backend for the Tally personal-finance app.
//!
//! The core issues short-lived signed access tokens and long-lived persisted
//! refresh tokens, rotates refresh tokens atomically (each value is
//! consumable at most once, even under concurrent presentation), and gates
//! privileged administration behind the admin flag. Everything else - expense
//! CRUD, categorization, the web frontend - lives elsewhere and talks to this
//! service over HTTP.

/// Access token creation and verification
pub mod auth;
/// Typed configuration loaded from the environment
pub mod config;
/// Shared constants (limits, client-facing messages)
pub mod constants;
/// Database pool, schema and table operations
pub mod database;
/// Unified error types and the HTTP translation boundary
pub mod errors;
/// Structured logging setup
pub mod logging;
/// Request authentication middleware
pub mod middleware;
/// Core data models
pub mod models;
/// HTTP route handlers by domain
pub mod routes;
/// Cookie and other security helpers
pub mod security;
/// Server state wiring and the top-level router
pub mod server;
/// Small shared utilities
pub mod utils;
