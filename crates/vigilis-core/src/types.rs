//! # Domain Types
//!
//! Core domain types used throughout Vigilis POS.
//!
//! ## Identity Pattern
//! Every entity has an `id`: UUID v4 stored as a string, immutable once
//! assigned, used for database relations and audit back-references.
//! Audit rows reference entities by identifier only - a lookup reference,
//! never an ownership link, so the trail survives later changes to the
//! referenced entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Role
// =============================================================================

/// The closed set of user roles.
///
/// Roles are values on [`User`] and keys into the permission matrix in
/// [`crate::rbac`]; they are not a stored entity of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access: catalog management, user management, audit reads.
    Admin,
    /// Day-to-day counter operations: invoices, stock adjustments.
    Cashier,
    /// Sales floor: create invoices, read the catalog.
    Sales,
}

impl Role {
    /// All roles, for exhaustive matrix checks.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Cashier, Role::Sales];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Sales => "sales",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Operation
// =============================================================================

/// Every gated operation, named per (entity, action) pair.
///
/// The HTTP layer maps verb+path onto one of these before anything else
/// runs. The matrix in [`crate::rbac`] is keyed by this enum; anything it
/// does not explicitly allow is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    ProductCreate,
    ProductRead,
    ProductUpdate,
    ProductDelete,
    InvoiceCreate,
    InvoiceAddItem,
    InvoiceFinalize,
    InvoiceCancel,
    InvoiceRead,
    InvoiceListAll,
    StockAdjustmentCreate,
    UserCreate,
    AuditRead,
}

impl Operation {
    /// All operations, for exhaustive matrix checks.
    pub const ALL: [Operation; 13] = [
        Operation::ProductCreate,
        Operation::ProductRead,
        Operation::ProductUpdate,
        Operation::ProductDelete,
        Operation::InvoiceCreate,
        Operation::InvoiceAddItem,
        Operation::InvoiceFinalize,
        Operation::InvoiceCancel,
        Operation::InvoiceRead,
        Operation::InvoiceListAll,
        Operation::StockAdjustmentCreate,
        Operation::UserCreate,
        Operation::AuditRead,
    ];

    /// Stable dotted name, used in audit detail payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ProductCreate => "product.create",
            Operation::ProductRead => "product.read",
            Operation::ProductUpdate => "product.update",
            Operation::ProductDelete => "product.delete",
            Operation::InvoiceCreate => "invoice.create",
            Operation::InvoiceAddItem => "invoice.add_item",
            Operation::InvoiceFinalize => "invoice.finalize",
            Operation::InvoiceCancel => "invoice.cancel",
            Operation::InvoiceRead => "invoice.read",
            Operation::InvoiceListAll => "invoice.list_all",
            Operation::StockAdjustmentCreate => "stock_adjustment.create",
            Operation::UserCreate => "user.create",
            Operation::AuditRead => "audit.read",
        }
    }
}

impl Operation {
    /// The entity type this operation targets, used on audit rows for
    /// denied attempts where no concrete entity was reached.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Operation::ProductCreate
            | Operation::ProductRead
            | Operation::ProductUpdate
            | Operation::ProductDelete => EntityKind::Product,
            Operation::InvoiceCreate
            | Operation::InvoiceFinalize
            | Operation::InvoiceCancel
            | Operation::InvoiceRead
            | Operation::InvoiceListAll => EntityKind::Invoice,
            Operation::InvoiceAddItem => EntityKind::InvoiceItem,
            Operation::StockAdjustmentCreate => EntityKind::StockAdjustment,
            Operation::UserCreate => EntityKind::User,
            Operation::AuditRead => EntityKind::AuditLog,
        }
    }

    /// The audit action kind describing this operation.
    pub fn audit_action(&self) -> AuditAction {
        match self {
            Operation::ProductCreate | Operation::InvoiceCreate | Operation::UserCreate => {
                AuditAction::Create
            }
            Operation::ProductUpdate => AuditAction::Update,
            Operation::ProductDelete => AuditAction::Delete,
            Operation::InvoiceAddItem => AuditAction::AddItem,
            Operation::InvoiceFinalize => AuditAction::Finalize,
            Operation::InvoiceCancel => AuditAction::Cancel,
            Operation::StockAdjustmentCreate => AuditAction::AdjustStock,
            Operation::ProductRead
            | Operation::InvoiceRead
            | Operation::InvoiceListAll
            | Operation::AuditRead => AuditAction::Read,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Actor Context
// =============================================================================

/// The resolved identity behind a request, produced by the authorization
/// guard from a verified token.
///
/// Holding an `ActorContext` means: the token was valid at verification
/// time and the role was allowed to perform the requested operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Identifier of an already-committed User row.
    pub user_id: String,
    /// Role carried by the verified token.
    pub role: Role,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        ActorContext {
            user_id: user_id.into(),
            role,
        }
    }
}

// =============================================================================
// Audit Vocabulary
// =============================================================================

/// What kind of action an audit row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    AddItem,
    Finalize,
    Cancel,
    AdjustStock,
    Register,
    Login,
}

/// How the attempted action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The mutation committed; exactly one such row exists per mutation.
    Success,
    /// The guard (or credential check) refused the attempt pre-mutation.
    Denied,
    /// The mutation was attempted and aborted; the transaction rolled back.
    Error,
}

/// Which entity type an audit row targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Product,
    Invoice,
    InvoiceItem,
    StockAdjustment,
    AuditLog,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Product => "product",
            EntityKind::Invoice => "invoice",
            EntityKind::InvoiceItem => "invoice_item",
            EntityKind::StockAdjustment => "stock_adjustment",
            EntityKind::AuditLog => "audit_log",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// User
// =============================================================================

/// An authenticated operator of the system.
///
/// Users are never hard-deleted; `is_active = false` is a soft-disable so
/// historical audit rows always resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4), immutable once assigned.
    pub id: String,

    /// Login name, unique across the store.
    pub username: String,

    /// Password digest (argon2 PHC string). Never the plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Role consulted by the permission matrix.
    pub role: Role,

    /// Soft-disable flag; disabled users cannot log in.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// An inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Current stock snapshot in base units (fast to read).
    pub quantity_on_hand: i64,

    /// Stock level below which the product counts as low-stock.
    pub reorder_level: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a fresh product with a new id and zeroed timestamps set to now.
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.into(),
            name: name.into(),
            description: None,
            quantity_on_hand: 0,
            reorder_level: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Invoice lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Items can still be added; stock is untouched.
    Draft,
    /// Stock deducted, total computed; immutable except for cancellation.
    Finalized,
    /// Terminal state. Stock restored if it was finalized.
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Finalized => "finalized",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// A sale document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// User who made the sale.
    pub sold_by_id: String,

    pub status: InvoiceStatus,

    /// Total in cents; computed at finalization, zero while draft.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on an invoice.
///
/// Product name and price are snapshotted onto the line so the sale
/// history is preserved even if the product changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,

    /// Product name at the time the line was added.
    pub name_snapshot: String,

    /// Quantity in base units.
    pub quantity: i64,

    /// Price per base unit in cents.
    pub unit_price_cents: i64,

    /// quantity * unit_price_cents, precomputed.
    pub line_total_cents: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Why stock changed outside of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockAdjustmentReason {
    InitialImport,
    ManualAdjustment,
    Correction,
    Damage,
}

/// A signed stock delta applied to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAdjustment {
    pub id: String,
    pub product_id: String,

    /// Positive or negative change in base units.
    pub change_qty: i64,

    pub reason: StockAdjustmentReason,

    /// Optional external reference (delivery note, count sheet, ...).
    pub reference: Option<String>,

    pub note: Option<String>,

    /// User who performed the adjustment.
    pub created_by_user_id: String,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// One immutable row in the audit trail.
///
/// Invariants enforced by the coordinator:
/// - `actor_user_id`, when set, resolves to a User row committed strictly
///   before this row's write began - never a forward reference.
/// - Every successful mutation has exactly one Success row; every denied
///   or failed attempt reaching the coordinator has exactly one row with
///   that outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: String,

    /// Acting user; NULL only when authentication itself failed and no
    /// identity could be resolved (anonymous-actor marker).
    pub actor_user_id: Option<String>,

    pub action: AuditAction,

    /// Targeted entity type.
    pub entity_kind: EntityKind,

    /// Targeted entity identifier; a weak back-reference, never a cascade.
    pub entity_id: Option<String>,

    pub outcome: AuditOutcome,

    /// Optional JSON payload with operation-specific context.
    pub detail: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_stable() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Cashier.to_string(), "cashier");
        assert_eq!(Role::Sales.to_string(), "sales");
    }

    #[test]
    fn operation_names_are_dotted_pairs() {
        for op in Operation::ALL {
            let name = op.as_str();
            assert!(
                name.contains('.'),
                "operation name should be entity.action, got {name}"
            );
        }
        assert_eq!(Operation::ProductDelete.as_str(), "product.delete");
        assert_eq!(
            Operation::StockAdjustmentCreate.as_str(),
            "stock_adjustment.create"
        );
    }

    #[test]
    fn product_new_assigns_distinct_ids() {
        let a = Product::new("SKU-1", "First");
        let b = Product::new("SKU-1", "Second");
        assert_ne!(a.id, b.id);
        assert_eq!(a.quantity_on_hand, 0);
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: "u-1".into(),
            username: "alice".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: Role::Admin,
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("alice"));
    }
}
