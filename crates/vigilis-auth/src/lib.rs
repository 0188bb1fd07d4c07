//! # vigilis-auth: Credential & Token Layer
//!
//! Token-based identity for Vigilis POS: issues and verifies signed,
//! time-bounded bearer tokens, hashes and verifies passwords, and gates
//! operations against the role-permission matrix.
//!
//! ## Control Flow
//! ```text
//! caller presents bearer token
//!        │
//!        ▼
//! AuthorizationGuard::authorize(token, operation)
//!        │
//!        ├── TokenService::verify ──► expired / malformed / bad signature
//!        │        │                       └── Denied(Unauthenticated)
//!        │        ▼
//!        ├── rbac::is_allowed(role, operation)
//!        │        │
//!        │        ├── false ──► Denied(Forbidden)   (still audited!)
//!        │        ▼
//!        └── ActorContext { user_id, role }
//! ```
//!
//! Verification is pure computation over the process-wide signing secret;
//! no store round trip ever happens on this path. The secret is injected
//! at startup via [`AuthConfig`] and read-only thereafter.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use guard::{AuthorizationGuard, Denied, DenyReason};
pub use password::{hash_password, verify_password};
pub use token::{TokenIdentity, TokenService};
