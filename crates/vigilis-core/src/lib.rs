//! # vigilis-core: Pure Business Logic for Vigilis POS
//!
//! This crate is the heart of the Vigilis authorization-and-audit core.
//! It contains the domain vocabulary and business rules as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  HTTP layer (out of scope)                      │
//! │     maps verb+path to an Operation and a mutation capability    │
//! └───────────────┬─────────────────────────────────────────────────┘
//!                 │
//! ┌───────────────▼─────────────────────────────────────────────────┐
//! │                  vigilis-auth (token + guard)                   │
//! │        verify(token) → ActorContext → is_allowed(role, op)      │
//! └───────────────┬─────────────────────────────────────────────────┘
//!                 │
//! ┌───────────────▼─────────────────────────────────────────────────┐
//! │               ★ vigilis-core (THIS CRATE) ★                     │
//! │                                                                 │
//! │    types      rbac        validation       error                │
//! │    entities   matrix      input checks     typed failures       │
//! │                                                                 │
//! │    NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │
//! └───────────────┬─────────────────────────────────────────────────┘
//!                 │
//! ┌───────────────▼─────────────────────────────────────────────────┐
//! │           vigilis-db (coordinator + repositories)               │
//! │        one atomic transaction per mutation + audit row          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Product, Invoice, AuditLog, ...)
//! - [`rbac`] - The static role-permission matrix (fail-closed)
//! - [`validation`] - Boundary input structs and field validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input = same output, always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer money**: monetary values are cents (i64), never floats
//! 4. **Explicit errors**: all errors are typed, never strings or panics

pub mod error;
pub mod rbac;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use rbac::is_allowed;
pub use types::*;
pub use validation::{
    NewInvoiceItem, NewProduct, NewStockAdjustment, NewUser, ProductPatch, ValidationResult,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length for a username.
pub const MAX_USERNAME_LEN: usize = 50;

/// Minimum length for a plaintext password at registration.
///
/// The digest itself is produced by vigilis-auth; core only enforces the
/// boundary rule so no transaction ever opens for input that cannot pass.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum length for product and entity display names.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for free-text fields (notes, references, reasons).
pub const MAX_NOTE_LEN: usize = 255;

/// Maximum quantity for a single invoice item.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price in cents ($1M per base unit).
///
/// Together with [`MAX_ITEM_QUANTITY`] this keeps any line total far
/// below i64 range, so cents arithmetic cannot overflow.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;
