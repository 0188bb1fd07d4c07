//! Stock adjustment repository.
//!
//! Adjustments are append-only: each row records one signed delta and the
//! product's `quantity_on_hand` snapshot is updated in the same coordinator
//! transaction that writes the row.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vigilis_core::StockAdjustment;

const ADJUSTMENT_COLUMNS: &str =
    "id, product_id, change_qty, reason, reference, note, created_by_user_id, created_at";

/// Inserts a stock adjustment row.
pub async fn insert(
    executor: impl Executor<'_, Database = Sqlite>,
    adjustment: &StockAdjustment,
) -> DbResult<()> {
    debug!(
        id = %adjustment.id,
        product_id = %adjustment.product_id,
        change = adjustment.change_qty,
        "Inserting stock adjustment"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_adjustments (
            id, product_id, change_qty, reason,
            reference, note, created_by_user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&adjustment.id)
    .bind(&adjustment.product_id)
    .bind(adjustment.change_qty)
    .bind(adjustment.reason)
    .bind(&adjustment.reference)
    .bind(&adjustment.note)
    .bind(&adjustment.created_by_user_id)
    .bind(adjustment.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for stock adjustment database operations.
#[derive(Debug, Clone)]
pub struct StockAdjustmentRepository {
    pool: SqlitePool,
}

impl StockAdjustmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockAdjustmentRepository { pool }
    }

    /// Adjustment history for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: i64,
    ) -> DbResult<Vec<StockAdjustment>> {
        let adjustments = sqlx::query_as::<_, StockAdjustment>(&format!(
            r#"
            SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments
            WHERE product_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(adjustments)
    }

    /// Net stock movement for a product across its whole history.
    pub async fn net_change_for_product(&self, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(change_qty), 0) FROM stock_adjustments WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }
}
