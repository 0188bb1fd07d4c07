//! Error types for the credential layer.
//!
//! The three token failure variants exist for logging only: externally
//! they all collapse into a single "invalid credentials" outcome
//! ([`crate::guard::DenyReason::Unauthenticated`]). Callers must never
//! branch on which of the three occurred.

use thiserror::Error;

/// Credential layer errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature was fine but `now >= expires_at`.
    #[error("token expired")]
    ExpiredToken,

    /// Token could not be parsed as a JWT at all.
    #[error("malformed token")]
    MalformedToken,

    /// Well-formed token signed with a different secret.
    #[error("bad token signature")]
    BadSignature,

    /// Token could not be produced (should not happen with a valid secret).
    #[error("token encoding failed: {0}")]
    Encode(String),

    /// argon2 could not produce a digest.
    #[error("password hashing failed: {0}")]
    Hash(String),
}
