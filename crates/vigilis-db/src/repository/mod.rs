//! # Repository Module
//!
//! Database repository implementations for Vigilis POS.
//!
//! ## Shape
//! Each entity module has two layers:
//!
//! - module-level query functions generic over
//!   `impl Executor<'_, Database = Sqlite>`, so the same statement runs
//!   against the pool or inside an open coordinator transaction;
//! - a `*Repository` struct holding the pool, wrapping the read paths
//!   for callers outside a transaction.
//!
//! All SQL lives here; nothing outside this module and the coordinator
//! touches the database.

pub mod audit;
pub mod invoice;
pub mod product;
pub mod stock;
pub mod user;
