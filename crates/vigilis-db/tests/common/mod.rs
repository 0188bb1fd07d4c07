//! Shared test harness: an in-memory database plus the full service set.

#![allow(dead_code)]

use vigilis_auth::{AuthorizationGuard, TokenService};
use vigilis_core::{ActorContext, NewProduct, NewUser, Role, User};
use vigilis_db::{
    AccessService, Database, DbConfig, IdentityService, InvoiceService, ProductService,
    StockService,
};

pub const TEST_SECRET: &str = "test-secret";

pub struct Harness {
    pub db: Database,
    pub tokens: TokenService,
    pub access: AccessService,
    pub identity: IdentityService,
    pub products: ProductService,
    pub invoices: InvoiceService,
    pub stock: StockService,
}

pub async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let tokens = TokenService::new(TEST_SECRET, 3600);
    let pool = db.pool().clone();

    Harness {
        access: AccessService::new(AuthorizationGuard::new(tokens.clone()), db.coordinator()),
        identity: IdentityService::new(pool.clone(), tokens.clone()),
        products: ProductService::new(pool.clone()),
        invoices: InvoiceService::new(pool.clone()),
        stock: StockService::new(pool),
        tokens,
        db,
    }
}

impl Harness {
    /// Bootstrap-registers a user and returns it with its actor context
    /// and a fresh bearer token.
    pub async fn register(&self, username: &str, role: Role) -> (User, ActorContext, String) {
        let user = self
            .identity
            .register(
                None,
                NewUser {
                    username: username.to_string(),
                    password: "correct-horse-battery".to_string(),
                    role,
                },
            )
            .await
            .unwrap();

        let actor = ActorContext::new(user.id.clone(), role);
        let token = self.tokens.issue(&user.id, role).unwrap();
        (user, actor, token)
    }

    /// Creates a product with some starting stock, acting as `actor`.
    pub async fn seed_product(
        &self,
        actor: &ActorContext,
        sku: &str,
        quantity: i64,
    ) -> vigilis_core::Product {
        self.products
            .create(
                actor,
                NewProduct {
                    sku: sku.to_string(),
                    name: format!("Product {sku}"),
                    description: None,
                    quantity_on_hand: quantity,
                    reorder_level: 0,
                },
            )
            .await
            .unwrap()
    }
}
