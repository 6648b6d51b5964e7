// ABOUTME: JWT-based access token creation and verification for user authentication
// ABOUTME: Stateless HS256 codec; validity is a pure function of secret, token and clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! # Access Token Codec
//!
//! Short-lived signed credentials for the Tally server. Tokens embed a subject
//! id and an absolute expiry and are verified against a process-wide symmetric
//! secret. There is no revocation list for access tokens; a token is valid
//! exactly as long as its signature checks out and its expiry is in the
//! future. No state, no I/O.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// JWT validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper JWT format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
    /// Token parsed and verified but carries no subject claim
    TokenMissingSubject,
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let duration_expired = current_time.signed_duration_since(*expired_at);
                write!(
                    f,
                    "Access token expired {} seconds ago at {}",
                    duration_expired.num_seconds(),
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => {
                write!(f, "Access token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "Access token is malformed: {details}")
            }
            Self::TokenMissingSubject => {
                write!(f, "Access token payload carries no subject claim")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// JWT claims for user authentication
///
/// `sub` is optional at the type level so that a structurally valid token
/// without a subject is distinguishable from a malformed one.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id this token authenticates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication manager for signing and verifying access tokens
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: Duration,
}

impl AuthManager {
    /// Create a new authentication manager from the configured signing secret
    #[must_use]
    pub fn new(secret: &[u8], access_token_expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_token_expiry: Duration::minutes(access_token_expiry_minutes),
        }
    }

    /// How long generated tokens live
    #[must_use]
    pub const fn access_token_expiry(&self) -> Duration {
        self.access_token_expiry
    }

    /// Generate a signed access token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails due to invalid claims
    pub fn generate_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + self.access_token_expiry;

        let claims = Claims {
            sub: Some(user_id.to_string()),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))
    }

    /// Validate an access token with detailed error information
    ///
    /// The signature is checked first with expiry validation disabled, then
    /// expiry and subject presence are checked manually. An expired token is
    /// therefore always reported as expired, never as merely invalid.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if:
    /// - Token is malformed or not valid JWT format
    /// - Token signature is invalid
    /// - Token has expired
    /// - Token carries no subject claim
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims = self.decode_token_claims(token)?;
        Self::validate_claims_expiry(&claims)?;

        if claims.sub.is_none() {
            tracing::warn!("Access token rejected: no subject claim");
            return Err(JwtValidationError::TokenMissingSubject);
        }

        Ok(claims)
    }

    /// Validate an access token and extract the subject user id
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] under the same conditions as
    /// [`Self::validate_token_detailed`], or `TokenInvalid` if the subject
    /// claim is not a valid user id.
    pub fn verify_subject(&self, token: &str) -> Result<Uuid, JwtValidationError> {
        let claims = self.validate_token_detailed(token)?;
        let Some(sub) = claims.sub else {
            return Err(JwtValidationError::TokenMissingSubject);
        };

        Uuid::parse_str(&sub).map_err(|_| JwtValidationError::TokenInvalid {
            reason: "Subject claim is not a valid user id".into(),
        })
    }

    /// Decode token claims without expiration validation
    fn decode_token_claims(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation_no_exp = Validation::new(Algorithm::HS256);
        validation_no_exp.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation_no_exp)
            .map(|token_data| token_data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Validate claims expiration against the wall clock
    fn validate_claims_expiry(claims: &Claims) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        if current_time.timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::warn!(
                "Access token expired at {} (subject: {})",
                expired_at.to_rfc3339(),
                claims.sub.as_deref().unwrap_or("unknown")
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }
        Ok(())
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("Access token validation failed: {:?}", e);

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}

/// Generate a random JWT signing secret
///
/// # Errors
///
/// Returns an error if system RNG fails - the server cannot operate securely
/// without working RNG
pub fn generate_jwt_secret() -> AppResult<[u8; 64]> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];

    rng.fill(&mut secret).map_err(|e| {
        tracing::error!("CRITICAL: Failed to generate cryptographically secure JWT secret: {e}");
        AppError::internal("System RNG failure - cannot generate secure JWT secret")
    })?;

    Ok(secret)
}
