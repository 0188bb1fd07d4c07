//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! Stock mutations (`set_quantity`) only ever happen inside a coordinator
//! transaction, alongside the invoice or adjustment row that explains
//! them; the pool-facing repository is read-only for quantities.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vigilis_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, quantity_on_hand, reorder_level, created_at, updated_at";

/// Inserts a product row. Duplicate SKUs surface as `UniqueViolation`.
pub async fn insert(
    executor: impl Executor<'_, Database = Sqlite>,
    product: &Product,
) -> DbResult<()> {
    debug!(id = %product.id, sku = %product.sku, "Inserting product");

    let result = sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, description,
            quantity_on_hand, reorder_level,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.quantity_on_hand)
    .bind(product.reorder_level)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            let err = DbError::from(err);
            if err.is_unique_violation() {
                Err(DbError::duplicate("sku", &product.sku))
            } else {
                Err(err)
            }
        }
    }
}

/// Fetches a product by id.
pub async fn fetch_by_id(
    executor: impl Executor<'_, Database = Sqlite>,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Writes back mutable product fields (name, description, reorder level).
pub async fn update(
    executor: impl Executor<'_, Database = Sqlite>,
    product: &Product,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = ?2,
            description = ?3,
            reorder_level = ?4,
            updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.reorder_level)
    .bind(product.updated_at)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", &product.id));
    }

    Ok(())
}

/// Sets the stock snapshot for a product.
pub async fn set_quantity(
    executor: impl Executor<'_, Database = Sqlite>,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result =
        sqlx::query("UPDATE products SET quantity_on_hand = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(now)
            .execute(executor)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Deletes a product row.
///
/// Fails with a foreign key violation if the product appears on any
/// invoice line; sold products stay on record.
pub async fn delete(executor: impl Executor<'_, Database = Sqlite>, id: &str) -> DbResult<()> {
    debug!(id = %id, "Deleting product");

    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Gets a product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products, optionally filtered by a partial name match.
    pub async fn list(
        &self,
        name_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Product>> {
        let products = match name_filter {
            Some(filter) => {
                sqlx::query_as::<_, Product>(&format!(
                    r#"
                    SELECT {PRODUCT_COLUMNS} FROM products
                    WHERE name LIKE ?1
                    ORDER BY name
                    LIMIT ?2 OFFSET ?3
                    "#
                ))
                .bind(format!("%{filter}%"))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1 OFFSET ?2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(products)
    }

    /// Products whose stock has fallen below their reorder level.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE quantity_on_hand < reorder_level
            ORDER BY quantity_on_hand ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
