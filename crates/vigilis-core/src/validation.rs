//! # Validation Module
//!
//! Typed input structs and field validation for Vigilis POS.
//!
//! ## Validation Strategy
//! ```text
//! Layer 1: HTTP layer (out of scope) - deserialization, shape checks
//! Layer 2: THIS MODULE              - business field rules, rejects
//!                                     before any transaction opens
//! Layer 3: SQLite                   - NOT NULL / UNIQUE / FK constraints
//!
//! Defense in depth: uniqueness in particular is NEVER pre-checked here;
//! the store's UNIQUE enforcement is the only authority (no TOCTOU).
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Role, StockAdjustmentReason};
use crate::{
    MAX_ITEM_QUANTITY, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_UNIT_PRICE_CENTS, MAX_USERNAME_LEN,
    MIN_PASSWORD_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a username: non-empty, bounded, alphanumeric plus `.`/`-`/`_`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password before it is hashed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a SKU: non-empty, bounded, alphanumeric plus hyphen/underscore.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }
    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }
    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an entity display name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an invoice line quantity: strictly positive, bounded.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents: non-negative and bounded, so line
/// totals stay comfortably inside i64.
pub fn validate_unit_price(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price_cents".to_string(),
        });
    }
    if cents > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "unit_price_cents".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

fn validate_note_field(field: &str, value: &str) -> ValidationResult<()> {
    if value.len() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Input Structs
// =============================================================================
// Explicit typed inputs, validated before reaching the coordinator.
// The HTTP layer deserializes into these; nothing past this point re-checks
// field shapes.

/// Input for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    /// Plaintext; hashed by vigilis-auth before persistence.
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub reorder_level: i64,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_sku(&self.sku)?;
        validate_name(&self.name)?;
        if self.quantity_on_hand < 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity_on_hand".to_string(),
            });
        }
        if self.reorder_level < 0 {
            return Err(ValidationError::MustBePositive {
                field: "reorder_level".to_string(),
            });
        }
        Ok(())
    }
}

/// Partial update for a product; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Option<i64>,
}

impl ProductPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(level) = self.reorder_level {
            if level < 0 {
                return Err(ValidationError::MustBePositive {
                    field: "reorder_level".to_string(),
                });
            }
        }
        Ok(())
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.reorder_level.is_none()
    }
}

/// Input for adding a line to a draft invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewInvoiceItem {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(self.quantity)?;
        validate_unit_price(self.unit_price_cents)?;
        Ok(())
    }
}

/// Input for a stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockAdjustment {
    pub product_id: String,
    /// Positive or negative change in base units; never zero.
    pub change_qty: i64,
    pub reason: StockAdjustmentReason,
    pub reference: Option<String>,
    pub note: Option<String>,
}

impl NewStockAdjustment {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        if self.change_qty == 0 {
            return Err(ValidationError::Required {
                field: "change_qty".to_string(),
            });
        }
        if let Some(reference) = &self.reference {
            validate_note_field("reference", reference)?;
        }
        if let Some(note) = &self.note {
            validate_note_field("note", note)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
