//! JWT token service.
//!
//! Issues and verifies the opaque bearer credentials callers present.
//! A token binds a user identifier, their role, issued-at and expires-at
//! timestamps, and an integrity signature over the process-wide secret.
//! Validity is computed, never looked up: this path makes no store call.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigilis_core::Role;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,

    /// Role at issue time.
    pub role: Role,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// JWT ID (unique identifier for this token).
    pub jti: String,
}

/// The identity a verified token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: String,
    pub role: Role,
}

/// Issues and verifies signed, time-bounded tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service with an explicit secret and TTL.
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Self {
        TokenService {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Create a token service from loaded configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        TokenService::new(config.jwt_secret.clone(), config.token_ttl_secs)
    }

    /// Issue a token for a user.
    ///
    /// Pure computation: embeds user id, role, issued-at and the fixed-TTL
    /// expiry, signed with the process-wide secret.
    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Verify a token and resolve the identity behind it.
    ///
    /// Checks signature integrity and `now < expires_at`, with zero leeway.
    /// The failure variants are for logging only; callers surface them all
    /// as one unauthenticated outcome.
    pub fn verify(&self, token: &str) -> Result<TokenIdentity, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            _ => AuthError::MalformedToken,
        })?;

        Ok(TokenIdentity {
            user_id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }
}

/// Extract a bearer token from an Authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}
