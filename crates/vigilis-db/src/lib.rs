//! # vigilis-db: Storage & Transaction Layer
//!
//! SQLite persistence for Vigilis POS: connection pooling, embedded
//! migrations, per-entity repositories, and the mutation coordinator
//! that commits every domain write atomically with its audit row.
//!
//! ## Layering
//! ```text
//! service/      business operations (validate, orchestrate, audit)
//!    │
//!    ▼
//! coordinator   one transaction per mutation: write + Success audit row
//!    │
//!    ▼
//! repository/   all SQL; generic over pool or open transaction
//!    │
//!    ▼
//! pool          WAL-mode SQLite, migrations on connect
//! ```
//!
//! ## Quick Start
//! ```rust,ignore
//! let db = Database::new(DbConfig::from_env()).await?;
//! let tokens = TokenService::from_config(&AuthConfig::load()?);
//!
//! let access = AccessService::new(AuthorizationGuard::new(tokens.clone()), db.coordinator());
//! let actor = access.authorize(bearer, Operation::ProductCreate).await?;
//!
//! let products = ProductService::new(db.pool().clone());
//! let created = products.create(&actor, new_product).await?;
//! ```

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

pub use coordinator::{
    mutation, MutationCoordinator, MutationError, MutationFuture, MutationRecord, MutationResult,
};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::audit::{AuditRepository, NewAuditEntry};
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
pub use repository::stock::StockAdjustmentRepository;
pub use repository::user::UserRepository;
pub use service::{
    AccessService, IdentityError, IdentityService, InvoiceService, LoginSession, ProductService,
    StockService,
};
