//! Product catalog service.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use vigilis_core::{
    ActorContext, AuditAction, CoreError, EntityKind, NewProduct, Operation, Product, ProductPatch,
};

use crate::coordinator::{mutation, MutationCoordinator, MutationRecord, MutationResult};
use crate::error::DbResult;
use crate::repository::product::{self, ProductRepository};

/// Catalog mutations and reads.
///
/// Create, update and delete are admin-gated upstream; this service
/// assumes an authorized actor and concerns itself with the data.
#[derive(Debug, Clone)]
pub struct ProductService {
    coordinator: MutationCoordinator,
    products: ProductRepository,
}

impl ProductService {
    pub fn new(pool: SqlitePool) -> Self {
        ProductService {
            coordinator: MutationCoordinator::new(pool.clone()),
            products: ProductRepository::new(pool),
        }
    }

    /// Creates a product. Duplicate SKUs come back as `Conflict` straight
    /// from the store's unique index.
    pub async fn create(
        &self,
        actor: &ActorContext,
        input: NewProduct,
    ) -> MutationResult<Product> {
        input.validate()?;

        let mut created = Product::new(input.sku.trim(), input.name.trim());
        created.description = input.description;
        created.quantity_on_hand = input.quantity_on_hand;
        created.reorder_level = input.reorder_level;

        let row = created.clone();
        self.coordinator
            .perform(
                actor,
                Operation::ProductCreate,
                mutation(move |conn| {
                    Box::pin(async move {
                        product::insert(&mut *conn, &row).await?;
                        Ok(MutationRecord::new(
                            EntityKind::Product,
                            &row.id,
                            AuditAction::Create,
                        )
                        .detail(json!({ "sku": row.sku, "name": row.name })))
                    })
                }),
            )
            .await?;

        Ok(created)
    }

    /// Applies a partial update. An empty patch is a no-op that writes
    /// nothing, audits nothing, and returns the current row.
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: &str,
        patch: ProductPatch,
    ) -> MutationResult<Product> {
        patch.validate()?;

        if patch.is_empty() {
            return self
                .products
                .get_by_id(id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", id).into());
        }

        let product_id = id.to_string();
        let patch_detail = json!({
            "name": patch.name,
            "description": patch.description,
            "reorder_level": patch.reorder_level,
        });

        self.coordinator
            .perform(
                actor,
                Operation::ProductUpdate,
                mutation(move |conn| {
                    Box::pin(async move {
                        let mut current = product::fetch_by_id(&mut *conn, &product_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Product", &product_id))?;

                        if let Some(name) = patch.name {
                            current.name = name.trim().to_string();
                        }
                        if let Some(description) = patch.description {
                            current.description = Some(description);
                        }
                        if let Some(level) = patch.reorder_level {
                            current.reorder_level = level;
                        }
                        current.updated_at = Utc::now();

                        product::update(&mut *conn, &current).await?;

                        Ok(MutationRecord::new(
                            EntityKind::Product,
                            &current.id,
                            AuditAction::Update,
                        )
                        .detail(patch_detail))
                    })
                }),
            )
            .await?;

        self.products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    /// Deletes a product outright.
    ///
    /// Products referenced by invoice lines are protected by the store's
    /// foreign key and cannot be deleted; the sale history wins.
    pub async fn delete(&self, actor: &ActorContext, id: &str) -> MutationResult<()> {
        let product_id = id.to_string();

        self.coordinator
            .perform(
                actor,
                Operation::ProductDelete,
                mutation(move |conn| {
                    Box::pin(async move {
                        let existing = product::fetch_by_id(&mut *conn, &product_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Product", &product_id))?;

                        product::delete(&mut *conn, &existing.id).await?;

                        Ok(MutationRecord::new(
                            EntityKind::Product,
                            &existing.id,
                            AuditAction::Delete,
                        )
                        .detail(json!({ "sku": existing.sku })))
                    })
                }),
            )
            .await?;

        Ok(())
    }

    /// Gets a product by id. Reads are not audited.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        self.products.get_by_id(id).await
    }

    /// Gets a product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        self.products.get_by_sku(sku).await
    }

    /// Lists products with optional name filtering.
    pub async fn list(
        &self,
        name_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Product>> {
        self.products.list(name_filter, limit, offset).await
    }

    /// Products below their reorder level.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        self.products.list_low_stock().await
    }
}
