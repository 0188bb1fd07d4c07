//! # Error Types
//!
//! Domain-specific error types for vigilis-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError ──► CoreError ──► MutationError (vigilis-db) ──► caller
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impls)
//! 2. Include context in error messages (id, field, quantity)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Target entity does not exist (or is soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique-key clash detected by the store, never pre-checked.
    #[error("duplicate {field}: '{value}' already exists")]
    Conflict { field: String, value: String },

    /// Entity is not in a state that allows the requested operation,
    /// e.g. adding items to a finalized invoice.
    #[error("{entity} {id} is {status}, cannot perform operation")]
    InvalidStatus {
        entity: String,
        id: String,
        status: String,
    },

    /// Finalizing would sell more than is on hand.
    #[error("not enough stock for {product}: available {available}, required {required}")]
    InsufficientStock {
        product: String,
        available: i64,
        required: i64,
    },

    /// A stock adjustment would drive quantity_on_hand below zero.
    #[error("cannot adjust stock of {product} below zero")]
    StockBelowZero { product: String },

    /// Finalizing an invoice with no lines.
    #[error("invoice {id} has no items")]
    EmptyInvoice { id: String },

    /// Input failed boundary validation (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation failures, raised at the boundary before any
/// transaction opens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of the allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (bad characters, not a UUID, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
