// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels and output formats from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Production-ready logging configuration with structured output

use anyhow::Result;
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Machine-readable JSON lines (production)
    Json,
    /// Human-readable multi-line output (development)
    #[default]
    Pretty,
    /// Single-line condensed output
    Compact,
}

impl LogFormat {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber from the environment
///
/// `RUST_LOG` controls the filter (default `info`); `TALLY_LOG_FORMAT`
/// selects json, pretty or compact output.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed
pub fn init_from_env() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format =
        LogFormat::from_str_or_default(&env::var("TALLY_LOG_FORMAT").unwrap_or_default());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str_or_default("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_or_default("COMPACT"), LogFormat::Compact);
        assert_eq!(LogFormat::from_str_or_default("anything"), LogFormat::Pretty);
    }
}
