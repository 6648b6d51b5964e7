// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Default HTTP port the server binds to
const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default access token lifetime in minutes
const DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;
/// Default refresh token lifetime in days
const DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Environment type for security and other configuration decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory SQLite database (testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse a connection string into a typed database location
    ///
    /// # Errors
    ///
    /// Returns an error if the URL scheme is not a supported database kind
    pub fn parse_url(url: &str) -> Result<Self> {
        if url == "sqlite::memory:" {
            return Ok(Self::Memory);
        }
        if let Some(path) = url.strip_prefix("sqlite:") {
            return Ok(Self::SQLite {
                path: PathBuf::from(path),
            });
        }
        anyhow::bail!("Unsupported database URL (expected sqlite:<path> or sqlite::memory:): {url}")
    }

    /// Render as a sqlx connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }
}

/// Authentication and session configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric secret for signing access tokens (HS256)
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in minutes
    pub access_token_expiry_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_expiry_days: i64,
    /// Whether refresh cookies carry the Secure attribute
    ///
    /// Disabled only for non-encrypted development transport.
    pub secure_cookies: bool,
}

/// Complete server configuration assembled from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port to bind
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database location
    pub database_url: DatabaseUrl,
    /// Auth/session settings
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `TALLY_JWT_SECRET` is mandatory in production; in development a random
    /// secret is generated (and every restart invalidates outstanding access
    /// tokens).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A numeric variable fails to parse
    /// - The database URL is unsupported
    /// - The JWT secret is missing in production
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str_or_default(
            &env::var("TALLY_ENVIRONMENT").unwrap_or_default(),
        );

        let http_port = parse_env_or("TALLY_HTTP_PORT", DEFAULT_HTTP_PORT)?;

        let database_url = DatabaseUrl::parse_url(
            &env::var("TALLY_DATABASE_URL").unwrap_or_else(|_| "sqlite:data/tally.db".into()),
        )?;

        let jwt_secret = match env::var("TALLY_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ if environment.is_production() => {
                anyhow::bail!("TALLY_JWT_SECRET must be set in production")
            }
            _ => {
                let generated = crate::auth::generate_jwt_secret()
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .context("Failed to generate development JWT secret")?;
                warn!(
                    "TALLY_JWT_SECRET not set; generated an ephemeral development secret \
                     ({}... redacted). Tokens will not survive a restart.",
                    &hex::encode(generated)[..8]
                );
                generated.to_vec()
            }
        };

        let auth = AuthConfig {
            jwt_secret,
            access_token_expiry_minutes: parse_env_or(
                "TALLY_ACCESS_TOKEN_EXPIRY_MINUTES",
                DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES,
            )?,
            refresh_token_expiry_days: parse_env_or(
                "TALLY_REFRESH_TOKEN_EXPIRY_DAYS",
                DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
            )?,
            // Plain-HTTP development transport cannot carry Secure cookies
            secure_cookies: parse_env_or("TALLY_SECURE_COOKIES", !environment.is_development())?,
        };

        Ok(Self {
            http_port,
            environment,
            database_url,
            auth,
        })
    }

    /// One-line configuration summary safe for logging (secrets redacted)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} port={} database={} access_ttl={}m refresh_ttl={}d secure_cookies={}",
            self.environment,
            self.http_port,
            self.database_url.to_connection_string(),
            self.auth.access_token_expiry_minutes,
            self.auth.refresh_token_expiry_days,
            self.auth.secure_cookies,
        )
    }
}

/// Parse an environment variable, falling back to a default when unset
fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Invalid value for {key}: {value}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_database_url_parsing() {
        assert!(matches!(
            DatabaseUrl::parse_url("sqlite::memory:").unwrap(),
            DatabaseUrl::Memory
        ));
        let url = DatabaseUrl::parse_url("sqlite:data/tally.db").unwrap();
        assert_eq!(url.to_connection_string(), "sqlite:data/tally.db");
        assert!(DatabaseUrl::parse_url("postgres://localhost/tally").is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("unknown"),
            Environment::Development
        );
    }

    #[test]
    #[serial]
    fn test_production_requires_jwt_secret() {
        std::env::set_var("TALLY_ENVIRONMENT", "production");
        std::env::remove_var("TALLY_JWT_SECRET");
        assert!(ServerConfig::from_env().is_err());

        std::env::set_var("TALLY_JWT_SECRET", "unit-test-secret");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.auth.secure_cookies);
        assert_eq!(config.auth.jwt_secret, b"unit-test-secret");

        std::env::remove_var("TALLY_ENVIRONMENT");
        std::env::remove_var("TALLY_JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        std::env::remove_var("TALLY_ENVIRONMENT");
        std::env::remove_var("TALLY_JWT_SECRET");
        std::env::remove_var("TALLY_SECURE_COOKIES");

        let config = ServerConfig::from_env().unwrap();
        assert!(config.environment.is_development());
        assert!(!config.auth.secure_cookies);
        assert_eq!(config.auth.refresh_token_expiry_days, 7);
        assert!(!config.auth.jwt_secret.is_empty());
    }
}
