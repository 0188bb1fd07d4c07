//! Invoice repository.
//!
//! Status transitions are written with a compare-and-set predicate on the
//! current status, so two concurrent finalize calls cannot both succeed:
//! the second one sees zero affected rows.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vigilis_core::{Invoice, InvoiceItem, InvoiceStatus};

const INVOICE_COLUMNS: &str = "id, sold_by_id, status, total_cents, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, invoice_id, product_id, name_snapshot, quantity, unit_price_cents, line_total_cents, created_at";

/// Inserts a draft invoice row.
pub async fn insert(
    executor: impl Executor<'_, Database = Sqlite>,
    invoice: &Invoice,
) -> DbResult<()> {
    debug!(id = %invoice.id, sold_by = %invoice.sold_by_id, "Inserting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (id, sold_by_id, status, total_cents, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.sold_by_id)
    .bind(invoice.status)
    .bind(invoice.total_cents)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Fetches an invoice by id.
pub async fn fetch_by_id(
    executor: impl Executor<'_, Database = Sqlite>,
    id: &str,
) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(invoice)
}

/// Moves an invoice from `expected` to `next`, updating the total.
///
/// Zero affected rows means the invoice was missing or not in the
/// expected status; callers distinguish the two by re-reading.
pub async fn transition_status(
    executor: impl Executor<'_, Database = Sqlite>,
    id: &str,
    expected: InvoiceStatus,
    next: InvoiceStatus,
    total_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, from = expected.as_str(), to = next.as_str(), "Invoice status transition");

    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET status = ?3, total_cents = ?4, updated_at = ?5
        WHERE id = ?1 AND status = ?2
        "#,
    )
    .bind(id)
    .bind(expected)
    .bind(next)
    .bind(total_cents)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Inserts an invoice line.
pub async fn insert_item(
    executor: impl Executor<'_, Database = Sqlite>,
    item: &InvoiceItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, product_id, name_snapshot,
            quantity, unit_price_cents, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// All lines of an invoice, in insertion order.
pub async fn items_for(
    executor: impl Executor<'_, Database = Sqlite>,
    invoice_id: &str,
) -> DbResult<Vec<InvoiceItem>> {
    let items = sqlx::query_as::<_, InvoiceItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY created_at, id"
    ))
    .bind(invoice_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Gets an invoice together with its lines, erroring if it is missing.
    pub async fn get_with_items(&self, id: &str) -> DbResult<(Invoice, Vec<InvoiceItem>)> {
        let invoice = fetch_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        let items = items_for(&self.pool, id).await?;
        Ok((invoice, items))
    }

    /// Lists invoices, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<InvoiceStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Invoice>> {
        let invoices = match status {
            Some(status) => {
                sqlx::query_as::<_, Invoice>(&format!(
                    r#"
                    SELECT {INVOICE_COLUMNS} FROM invoices
                    WHERE status = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2 OFFSET ?3
                    "#
                ))
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Invoice>(&format!(
                    r#"
                    SELECT {INVOICE_COLUMNS} FROM invoices
                    ORDER BY created_at DESC
                    LIMIT ?1 OFFSET ?2
                    "#
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(invoices)
    }

    /// Gets a single invoice line by id.
    pub async fn item_by_id(&self, id: &str) -> DbResult<Option<InvoiceItem>> {
        let item = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Invoices sold by a given user, newest first.
    pub async fn list_for_seller(&self, sold_by_id: &str, limit: i64) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE sold_by_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        ))
        .bind(sold_by_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }
}
