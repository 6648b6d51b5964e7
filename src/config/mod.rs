// ABOUTME: Configuration module organization for the Tally server
// ABOUTME: Environment-driven typed configuration for server, database and auth settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Configuration management for the Tally server

/// Environment-based configuration parsing
pub mod environment;

pub use environment::{AuthConfig, DatabaseUrl, Environment, ServerConfig};
