//! Invoice service: the draft / finalize / cancel lifecycle.
//!
//! ## Stock Rules
//! ```text
//! draft      - items accumulate, stock untouched, availability unchecked
//! finalize   - availability checked line by line, stock deducted, total
//!              computed; all inside one coordinator transaction
//! cancel     - finalized invoices restore their stock; drafts just close
//! ```
//! Availability is only authoritative at finalization; a draft is a quote,
//! not a reservation.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use vigilis_core::{
    ActorContext, AuditAction, CoreError, EntityKind, Invoice, InvoiceItem, InvoiceStatus,
    NewInvoiceItem, Operation, ValidationError,
};

use crate::coordinator::{mutation, MutationCoordinator, MutationRecord, MutationResult};
use crate::error::DbResult;
use crate::repository::invoice::{self, InvoiceRepository};
use crate::repository::product;

/// Sales document lifecycle and reads.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    coordinator: MutationCoordinator,
    invoices: InvoiceRepository,
}

impl InvoiceService {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceService {
            coordinator: MutationCoordinator::new(pool.clone()),
            invoices: InvoiceRepository::new(pool),
        }
    }

    /// Opens a new draft invoice sold by the acting user.
    pub async fn create(&self, actor: &ActorContext) -> MutationResult<Invoice> {
        let now = Utc::now();
        let draft = Invoice {
            id: Uuid::new_v4().to_string(),
            sold_by_id: actor.user_id.clone(),
            status: InvoiceStatus::Draft,
            total_cents: 0,
            created_at: now,
            updated_at: now,
        };

        let row = draft.clone();
        self.coordinator
            .perform(
                actor,
                Operation::InvoiceCreate,
                mutation(move |conn| {
                    Box::pin(async move {
                        invoice::insert(&mut *conn, &row).await?;
                        Ok(MutationRecord::new(
                            EntityKind::Invoice,
                            &row.id,
                            AuditAction::Create,
                        ))
                    })
                }),
            )
            .await?;

        Ok(draft)
    }

    /// Adds a line to a draft invoice, snapshotting the product's name.
    ///
    /// Quantity availability is deliberately not checked here; only
    /// finalization consults stock.
    pub async fn add_item(
        &self,
        actor: &ActorContext,
        invoice_id: &str,
        input: NewInvoiceItem,
    ) -> MutationResult<InvoiceItem> {
        input.validate()?;

        let invoice_id = invoice_id.to_string();
        let record = self
            .coordinator
            .perform(
                actor,
                Operation::InvoiceAddItem,
                mutation(move |conn| {
                    Box::pin(async move {
                        let target = invoice::fetch_by_id(&mut *conn, &invoice_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Invoice", &invoice_id))?;

                        if target.status != InvoiceStatus::Draft {
                            return Err(CoreError::InvalidStatus {
                                entity: "Invoice".to_string(),
                                id: target.id,
                                status: target.status.as_str().to_string(),
                            }
                            .into());
                        }

                        let sold = product::fetch_by_id(&mut *conn, &input.product_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Product", &input.product_id))?;

                        // Validation bounds quantity and price, so this
                        // cannot overflow in practice; stay checked anyway.
                        let line_total_cents = input
                            .quantity
                            .checked_mul(input.unit_price_cents)
                            .ok_or(ValidationError::OutOfRange {
                                field: "line_total_cents".to_string(),
                                min: 0,
                                max: i64::MAX,
                            })?;

                        let item = InvoiceItem {
                            id: Uuid::new_v4().to_string(),
                            invoice_id: target.id.clone(),
                            product_id: sold.id.clone(),
                            name_snapshot: sold.name.clone(),
                            quantity: input.quantity,
                            unit_price_cents: input.unit_price_cents,
                            line_total_cents,
                            created_at: Utc::now(),
                        };
                        invoice::insert_item(&mut *conn, &item).await?;

                        let detail = json!({
                            "invoice_id": item.invoice_id,
                            "product_id": item.product_id,
                            "quantity": item.quantity,
                            "line_total_cents": item.line_total_cents,
                        });
                        Ok(MutationRecord::new(
                            EntityKind::InvoiceItem,
                            &item.id,
                            AuditAction::AddItem,
                        )
                        .detail(detail))
                    })
                }),
            )
            .await?;

        // The line was committed under record.entity_id; re-read it.
        self.invoices
            .item_by_id(&record.entity_id)
            .await?
            .ok_or_else(|| CoreError::not_found("InvoiceItem", &record.entity_id).into())
    }

    /// Finalizes a draft: checks availability, deducts stock, totals the
    /// lines, and flips the status, all in one transaction.
    pub async fn finalize(&self, actor: &ActorContext, invoice_id: &str) -> MutationResult<Invoice> {
        let id = invoice_id.to_string();
        self.coordinator
            .perform(
                actor,
                Operation::InvoiceFinalize,
                mutation(move |conn| {
                    Box::pin(async move {
                        let target = invoice::fetch_by_id(&mut *conn, &id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Invoice", &id))?;

                        if target.status != InvoiceStatus::Draft {
                            return Err(CoreError::InvalidStatus {
                                entity: "Invoice".to_string(),
                                id: target.id,
                                status: target.status.as_str().to_string(),
                            }
                            .into());
                        }

                        let items = invoice::items_for(&mut *conn, &target.id).await?;
                        if items.is_empty() {
                            return Err(CoreError::EmptyInvoice { id: target.id }.into());
                        }

                        let now = Utc::now();
                        let mut total_cents = 0i64;
                        for item in &items {
                            let stocked = product::fetch_by_id(&mut *conn, &item.product_id)
                                .await?
                                .ok_or_else(|| {
                                    CoreError::not_found("Product", &item.product_id)
                                })?;

                            if stocked.quantity_on_hand < item.quantity {
                                return Err(CoreError::InsufficientStock {
                                    product: stocked.name,
                                    available: stocked.quantity_on_hand,
                                    required: item.quantity,
                                }
                                .into());
                            }

                            product::set_quantity(
                                &mut *conn,
                                &stocked.id,
                                stocked.quantity_on_hand - item.quantity,
                                now,
                            )
                            .await?;
                            total_cents = total_cents
                                .checked_add(item.line_total_cents)
                                .ok_or(ValidationError::OutOfRange {
                                    field: "total_cents".to_string(),
                                    min: 0,
                                    max: i64::MAX,
                                })?;
                        }

                        let moved = invoice::transition_status(
                            &mut *conn,
                            &target.id,
                            InvoiceStatus::Draft,
                            InvoiceStatus::Finalized,
                            total_cents,
                            now,
                        )
                        .await?;
                        if !moved {
                            // Lost a race with another writer on this invoice.
                            return Err(CoreError::InvalidStatus {
                                entity: "Invoice".to_string(),
                                id: target.id,
                                status: "contended".to_string(),
                            }
                            .into());
                        }

                        Ok(MutationRecord::new(
                            EntityKind::Invoice,
                            &target.id,
                            AuditAction::Finalize,
                        )
                        .detail(json!({
                            "total_cents": total_cents,
                            "item_count": items.len(),
                        })))
                    })
                }),
            )
            .await?;

        self.require(invoice_id).await
    }

    /// Cancels an invoice. A finalized invoice restores the stock its
    /// lines deducted; a draft just closes. Cancelled is terminal.
    pub async fn cancel(&self, actor: &ActorContext, invoice_id: &str) -> MutationResult<Invoice> {
        let id = invoice_id.to_string();
        self.coordinator
            .perform(
                actor,
                Operation::InvoiceCancel,
                mutation(move |conn| {
                    Box::pin(async move {
                        let target = invoice::fetch_by_id(&mut *conn, &id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("Invoice", &id))?;

                        if target.status == InvoiceStatus::Cancelled {
                            return Err(CoreError::InvalidStatus {
                                entity: "Invoice".to_string(),
                                id: target.id,
                                status: target.status.as_str().to_string(),
                            }
                            .into());
                        }

                        let now = Utc::now();
                        if target.status == InvoiceStatus::Finalized {
                            for item in invoice::items_for(&mut *conn, &target.id).await? {
                                let stocked = product::fetch_by_id(&mut *conn, &item.product_id)
                                    .await?
                                    .ok_or_else(|| {
                                        CoreError::not_found("Product", &item.product_id)
                                    })?;
                                product::set_quantity(
                                    &mut *conn,
                                    &stocked.id,
                                    stocked.quantity_on_hand + item.quantity,
                                    now,
                                )
                                .await?;
                            }
                        }

                        let moved = invoice::transition_status(
                            &mut *conn,
                            &target.id,
                            target.status,
                            InvoiceStatus::Cancelled,
                            target.total_cents,
                            now,
                        )
                        .await?;
                        if !moved {
                            return Err(CoreError::InvalidStatus {
                                entity: "Invoice".to_string(),
                                id: target.id,
                                status: "contended".to_string(),
                            }
                            .into());
                        }

                        Ok(MutationRecord::new(
                            EntityKind::Invoice,
                            &target.id,
                            AuditAction::Cancel,
                        )
                        .detail(json!({ "previous_status": target.status.as_str() })))
                    })
                }),
            )
            .await?;

        self.require(invoice_id).await
    }

    /// Gets an invoice by id. Not audited.
    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.invoices.get_by_id(id).await
    }

    /// Gets an invoice with its lines.
    pub async fn get_with_items(&self, id: &str) -> DbResult<(Invoice, Vec<InvoiceItem>)> {
        self.invoices.get_with_items(id).await
    }

    /// Lists invoices, optionally by status.
    pub async fn list(
        &self,
        status: Option<InvoiceStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Invoice>> {
        self.invoices.list(status, limit, offset).await
    }

    async fn require(&self, id: &str) -> MutationResult<Invoice> {
        self.invoices
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", id).into())
    }
}
