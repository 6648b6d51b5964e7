// ABOUTME: Route module organization for Tally server HTTP endpoints
// ABOUTME: Centralized route definitions organized by domain with thin handler functions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Route module for the Tally server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate business logic to service layers.

/// Admin routes for session oversight and account administration
pub mod admin;
/// Authentication and session routes
pub mod auth;
/// Health check and banner routes
pub mod health;
/// User profile routes
pub mod users;

/// Admin route handlers
pub use admin::AdminRoutes;
/// Admin service
pub use admin::AdminService;
/// Authentication route handlers
pub use auth::AuthRoutes;
/// Authentication service
pub use auth::AuthService;
/// Freshly minted session pair
pub use auth::IssuedSession;
/// Login request payload
pub use auth::LoginRequest;
/// Registration request payload
pub use auth::RegisterRequest;
/// Access token response body
pub use auth::TokenResponse;
/// Health route handlers
pub use health::HealthRoutes;
/// Profile route handlers
pub use users::UserRoutes;
