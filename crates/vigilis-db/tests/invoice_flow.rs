//! The invoice lifecycle end to end: draft, lines, finalize, cancel,
//! and the stock movements each step does (or does not) make.

mod common;

use common::harness;
use vigilis_core::{
    CoreError, InvoiceStatus, NewInvoiceItem, NewStockAdjustment, Role, StockAdjustmentReason,
};
use vigilis_db::MutationError;

fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewInvoiceItem {
    NewInvoiceItem {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
    }
}

#[tokio::test]
async fn draft_accumulates_lines_without_touching_stock() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.sold_by_id, cashier.user_id);

    let item = h
        .invoices
        .add_item(&cashier, &invoice.id, line(&product.id, 3, 250))
        .await
        .unwrap();
    assert_eq!(item.name_snapshot, product.name);
    assert_eq!(item.line_total_cents, 750);

    // Drafts are quotes, not reservations.
    let stocked = h.products.get(&product.id).await.unwrap().unwrap();
    assert_eq!(stocked.quantity_on_hand, 10);
}

#[tokio::test]
async fn absurd_unit_price_is_rejected_not_miscounted() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();

    // A price large enough to overflow the line total must fail cleanly
    // at the boundary, long before any cents arithmetic runs.
    let err = h
        .invoices
        .add_item(&cashier, &invoice.id, line(&product.id, 3, i64::MAX / 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::Validation(_))
    ));

    let (_, items) = h.invoices.get_with_items(&invoice.id).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn finalize_deducts_stock_and_totals_the_lines() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let para = h.seed_product(&admin, "PARA-500", 10).await;
    let ibu = h.seed_product(&admin, "IBU-200", 4).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&para.id, 3, 250))
        .await
        .unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&ibu.id, 2, 400))
        .await
        .unwrap();

    let finalized = h.invoices.finalize(&cashier, &invoice.id).await.unwrap();
    assert_eq!(finalized.status, InvoiceStatus::Finalized);
    assert_eq!(finalized.total_cents, 3 * 250 + 2 * 400);

    assert_eq!(
        h.products.get(&para.id).await.unwrap().unwrap().quantity_on_hand,
        7
    );
    assert_eq!(
        h.products.get(&ibu.id).await.unwrap().unwrap().quantity_on_hand,
        2
    );

    // Finalized invoices accept no more lines.
    let err = h
        .invoices
        .add_item(&cashier, &invoice.id, line(&para.id, 1, 250))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::InvalidStatus { .. })
    ));
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_finalization() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let plenty = h.seed_product(&admin, "PARA-500", 100).await;
    let scarce = h.seed_product(&admin, "IBU-200", 1).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&plenty.id, 10, 250))
        .await
        .unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&scarce.id, 5, 400))
        .await
        .unwrap();

    let err = h.invoices.finalize(&cashier, &invoice.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::InsufficientStock { available: 1, required: 5, .. })
    ));

    // Nothing moved, the first line's deduction included.
    assert_eq!(
        h.products.get(&plenty.id).await.unwrap().unwrap().quantity_on_hand,
        100
    );
    let reread = h.invoices.get(&invoice.id).await.unwrap().unwrap();
    assert_eq!(reread.status, InvoiceStatus::Draft);
}

#[tokio::test]
async fn cancelling_a_finalized_invoice_restores_stock() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&product.id, 4, 250))
        .await
        .unwrap();
    h.invoices.finalize(&cashier, &invoice.id).await.unwrap();
    assert_eq!(
        h.products.get(&product.id).await.unwrap().unwrap().quantity_on_hand,
        6
    );

    let cancelled = h.invoices.cancel(&admin, &invoice.id).await.unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert_eq!(
        h.products.get(&product.id).await.unwrap().unwrap().quantity_on_hand,
        10
    );

    // Cancelled is terminal.
    let err = h.invoices.cancel(&admin, &invoice.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::InvalidStatus { .. })
    ));
}

#[tokio::test]
async fn cancelling_a_draft_moves_no_stock() {
    let h = harness().await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    h.invoices
        .add_item(&cashier, &invoice.id, line(&product.id, 4, 250))
        .await
        .unwrap();

    let cancelled = h.invoices.cancel(&cashier, &invoice.id).await.unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert_eq!(
        h.products.get(&product.id).await.unwrap().unwrap().quantity_on_hand,
        10
    );
}

#[tokio::test]
async fn stock_adjustments_move_the_snapshot_and_keep_history() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    h.stock
        .adjust(
            &admin,
            NewStockAdjustment {
                product_id: product.id.clone(),
                change_qty: -4,
                reason: StockAdjustmentReason::Damage,
                reference: None,
                note: Some("water damage".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        h.products.get(&product.id).await.unwrap().unwrap().quantity_on_hand,
        6
    );

    // A delta past zero is rejected and nothing is written.
    let err = h
        .stock
        .adjust(
            &admin,
            NewStockAdjustment {
                product_id: product.id.clone(),
                change_qty: -7,
                reason: StockAdjustmentReason::Correction,
                reference: None,
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::StockBelowZero { .. })
    ));
    assert_eq!(
        h.products.get(&product.id).await.unwrap().unwrap().quantity_on_hand,
        6
    );

    let history = h.stock.history(&product.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_qty, -4);
}
