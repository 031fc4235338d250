//! Bearer token issuance, verification and role gates.
//!
//! Tokens are HS256 JWTs carrying the caller's role. Expiry is checked against
//! an injected [`AuthClock`] rather than inside `jsonwebtoken`, so tests can pin
//! time without sleeping.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::types::Role;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3 * 60 * 60);

const BEARER_PREFIX: &str = "Bearer ";

pub trait AuthClock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl AuthClock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to one instant, for tests and tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl AuthClock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Signing material and token policy.
pub struct AuthConfig {
    pub secret: SecretString,
    pub token_ttl: Duration,
    pub clock: Arc<dyn AuthClock>,
}

impl AuthConfig {
    pub fn new(secret: SecretString, token_ttl: Duration) -> Self {
        Self {
            secret,
            token_ttl,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn AuthClock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is missing")]
    Missing,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token uses an unexpected signing algorithm")]
    UnexpectedAlgorithm,
    #[error("token carries unknown role `{0}`")]
    UnknownRole(String),
    #[error("role `{actual}` may not access a `{required}` endpoint")]
    InsufficientRole { required: Role, actual: Role },
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    role: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// A token whose signature, algorithm and expiry have been checked.
///
/// Only [`AccessControl::verify`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    role: Role,
    expires_at: OffsetDateTime,
}

impl VerifiedToken {
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}

/// Access level an endpoint demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Authenticated,
    Moderator,
}

impl Gate {
    fn admits(self, role: Role) -> bool {
        match (self, role) {
            (Gate::Authenticated, _) => true,
            (Gate::Moderator, Role::Moderator) => true,
            (Gate::Moderator, Role::Client) => false,
        }
    }
}

pub struct AccessControl {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AccessControl {
    pub fn new(config: AuthConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let encoding = EncodingKey::from_secret(secret);
        let decoding = DecodingKey::from_secret(secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            config,
            encoding,
            decoding,
            validation,
        }
    }

    pub fn issue(&self, role: Role) -> Result<IssuedToken, AuthError> {
        let now = self.config.clock.now();
        let expires_at = now + self.config.token_ttl;
        let claims = Claims {
            role: role.as_str().to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    AuthError::UnexpectedAlgorithm
                }
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed(err.to_string()),
            }
        })?;

        let claims = data.claims;
        let now = self.config.clock.now().unix_timestamp();
        if claims.exp <= now {
            debug!(
                target = "listings::auth",
                exp = claims.exp,
                now,
                "rejecting expired token"
            );
            return Err(AuthError::Expired);
        }

        let role = claims
            .role
            .parse::<Role>()
            .map_err(|err| AuthError::UnknownRole(err.0))?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|err| AuthError::Malformed(err.to_string()))?;

        Ok(VerifiedToken { role, expires_at })
    }

    /// Role embedded in an already verified token.
    pub fn role_of(token: &VerifiedToken) -> Role {
        token.role
    }

    /// Check an `Authorization` header value against a gate.
    pub fn authorize(&self, header: Option<&str>, gate: Gate) -> Result<VerifiedToken, AuthError> {
        let raw = header.ok_or(AuthError::Missing)?;
        let token = raw
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AuthError::Malformed("expected `Bearer <token>`".to_string()))?;

        let verified = self.verify(token)?;
        let role = Self::role_of(&verified);
        if !gate.admits(role) {
            return Err(AuthError::InsufficientRole {
                required: Role::Moderator,
                actual: role,
            });
        }
        Ok(verified)
    }
}

impl fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessControl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
