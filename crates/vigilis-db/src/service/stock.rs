//! Stock adjustment service.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use vigilis_core::{
    ActorContext, AuditAction, CoreError, EntityKind, NewStockAdjustment, Operation,
    StockAdjustment,
};

use crate::coordinator::{mutation, MutationCoordinator, MutationRecord, MutationResult};
use crate::error::DbResult;
use crate::repository::product;
use crate::repository::stock::{self, StockAdjustmentRepository};

/// Applies signed stock deltas outside the sale flow.
///
/// The adjustment row and the product's `quantity_on_hand` snapshot
/// commit together; the history always sums to the snapshot.
#[derive(Debug, Clone)]
pub struct StockService {
    coordinator: MutationCoordinator,
    adjustments: StockAdjustmentRepository,
}

impl StockService {
    pub fn new(pool: SqlitePool) -> Self {
        StockService {
            coordinator: MutationCoordinator::new(pool.clone()),
            adjustments: StockAdjustmentRepository::new(pool),
        }
    }

    /// Records an adjustment and moves the product's stock snapshot.
    ///
    /// A delta that would push `quantity_on_hand` below zero is rejected
    /// with `StockBelowZero` and nothing is written.
    pub async fn adjust(
        &self,
        actor: &ActorContext,
        input: NewStockAdjustment,
    ) -> MutationResult<StockAdjustment> {
        input.validate()?;

        let row = StockAdjustment {
            id: Uuid::new_v4().to_string(),
            product_id: input.product_id.clone(),
            change_qty: input.change_qty,
            reason: input.reason,
            reference: input.reference,
            note: input.note,
            created_by_user_id: actor.user_id.clone(),
            created_at: Utc::now(),
        };

        let adjustment = row.clone();
        self.coordinator
            .perform(
                actor,
                Operation::StockAdjustmentCreate,
                mutation(move |conn| {
                    Box::pin(async move {
                        let target = product::fetch_by_id(&mut *conn, &row.product_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Product", &row.product_id))?;

                        let new_quantity = target.quantity_on_hand + row.change_qty;
                        if new_quantity < 0 {
                            return Err(CoreError::StockBelowZero {
                                product: target.name,
                            }
                            .into());
                        }

                        product::set_quantity(&mut *conn, &target.id, new_quantity, row.created_at)
                            .await?;
                        stock::insert(&mut *conn, &row).await?;

                        Ok(MutationRecord::new(
                            EntityKind::StockAdjustment,
                            &row.id,
                            AuditAction::AdjustStock,
                        )
                        .detail(json!({
                            "product_id": row.product_id,
                            "change_qty": row.change_qty,
                            "new_quantity": new_quantity,
                        })))
                    })
                }),
            )
            .await?;

        Ok(adjustment)
    }

    /// Adjustment history for a product, newest first. Not audited.
    pub async fn history(&self, product_id: &str, limit: i64) -> DbResult<Vec<StockAdjustment>> {
        self.adjustments.list_for_product(product_id, limit).await
    }
}
