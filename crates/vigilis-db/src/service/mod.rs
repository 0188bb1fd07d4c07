//! # Service Module
//!
//! Business operations for Vigilis POS, one service per aggregate.
//!
//! Services sit between the authorization gate and the repositories:
//! every mutation goes through [`crate::coordinator::MutationCoordinator`]
//! so it commits atomically with its audit row; reads go straight to the
//! repositories and are not audited.
//!
//! Callers are expected to hold an already-authorized
//! [`vigilis_core::ActorContext`] (see [`access::AccessService`]) before
//! invoking a mutation.

pub mod access;
pub mod identity;
pub mod invoices;
pub mod products;
pub mod stock;

pub use access::AccessService;
pub use identity::{IdentityError, IdentityService, LoginSession};
pub use invoices::InvoiceService;
pub use products::ProductService;
pub use stock::StockService;
