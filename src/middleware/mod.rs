// ABOUTME: Middleware module organization
// ABOUTME: Request authentication and admin gating
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Middleware for the Tally server

mod auth;

pub use auth::{AuthMiddleware, AuthResult};
