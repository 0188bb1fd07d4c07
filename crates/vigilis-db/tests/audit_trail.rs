//! The audit contract: every committed mutation has exactly one Success
//! row, every refusal a Denied row, every rolled-back attempt an Error
//! row - and rollbacks leave no partial writes behind.

mod common;

use common::harness;
use vigilis_core::{
    AuditAction, AuditOutcome, CoreError, EntityKind, NewInvoiceItem, Operation, ProductPatch,
    Role,
};
use vigilis_db::MutationError;

#[tokio::test]
async fn committed_mutation_has_exactly_one_success_row() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;

    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let rows = h
        .db
        .audits()
        .find_for_target(EntityKind::Product, &product.id)
        .await
        .unwrap();

    let successes: Vec<_> = rows
        .iter()
        .filter(|r| r.outcome == AuditOutcome::Success)
        .collect();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].actor_user_id.as_deref(), Some(admin.user_id.as_str()));
}

#[tokio::test]
async fn admin_delete_removes_the_product_and_leaves_one_delete_row() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    h.products.delete(&admin, &product.id).await.unwrap();
    assert!(h.products.get(&product.id).await.unwrap().is_none());

    let rows = h
        .db
        .audits()
        .find_for_target(EntityKind::Product, &product.id)
        .await
        .unwrap();
    let deletes: Vec<_> = rows
        .iter()
        .filter(|r| r.action == AuditAction::Delete)
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].outcome, AuditOutcome::Success);
    assert_eq!(
        deletes[0].actor_user_id.as_deref(),
        Some(admin.user_id.as_str())
    );
}

#[tokio::test]
async fn sold_product_cannot_be_deleted() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let (_, cashier, _) = h.register("casey", Role::Cashier).await;
    let product = h.seed_product(&admin, "PARA-500", 10).await;

    let invoice = h.invoices.create(&cashier).await.unwrap();
    h.invoices
        .add_item(
            &cashier,
            &invoice.id,
            NewInvoiceItem {
                product_id: product.id.clone(),
                quantity: 2,
                unit_price_cents: 250,
            },
        )
        .await
        .unwrap();

    // The invoice line holds a foreign key on the product; sale history
    // wins over deletion.
    let err = h.products.delete(&admin, &product.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Db(vigilis_db::DbError::ForeignKeyViolation { .. })
    ));
    assert!(h.products.get(&product.id).await.unwrap().is_some());
}

#[tokio::test]
async fn forbidden_attempt_is_audited_and_changes_nothing() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;
    let (_, sales_actor, sales_token) = h.register("sam", Role::Sales).await;

    let product = h.seed_product(&admin, "IBU-200", 5).await;

    // The gate refuses before any service runs.
    let denied = h
        .access
        .authorize(&sales_token, Operation::ProductDelete)
        .await
        .unwrap_err();
    assert_eq!(denied.actor.unwrap().user_id, sales_actor.user_id);

    // The product is untouched.
    assert!(h.products.get(&product.id).await.unwrap().is_some());

    // Exactly one Denied row, naming the refused actor.
    let denials = h
        .db
        .audits()
        .find_for_actor(&sales_actor.user_id, 50)
        .await
        .unwrap();
    let denied_rows: Vec<_> = denials
        .iter()
        .filter(|r| r.outcome == AuditOutcome::Denied)
        .collect();
    assert_eq!(denied_rows.len(), 1);
    assert_eq!(denied_rows[0].entity_kind, EntityKind::Product);
}

#[tokio::test]
async fn unauthenticated_attempt_gets_anonymous_denied_row() {
    let h = harness().await;

    let denied = h
        .access
        .authorize("not-a-jwt", Operation::InvoiceCreate)
        .await
        .unwrap_err();
    assert!(denied.actor.is_none());

    let rows = h.db.audits().list_recent(10, 0).await.unwrap();
    let row = rows
        .iter()
        .find(|r| r.outcome == AuditOutcome::Denied)
        .unwrap();
    assert!(row.actor_user_id.is_none());
    assert_eq!(row.entity_kind, EntityKind::Invoice);
}

#[tokio::test]
async fn failed_mutation_rolls_back_and_leaves_one_error_row() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;

    // Finalizing an empty invoice fails after the transaction opened.
    let invoice = h.invoices.create(&admin).await.unwrap();
    let err = h.invoices.finalize(&admin, &invoice.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::EmptyInvoice { .. })
    ));

    // Still a draft: the transaction rolled back.
    let reread = h.invoices.get(&invoice.id).await.unwrap().unwrap();
    assert_eq!(reread.status, vigilis_core::InvoiceStatus::Draft);

    // One Error row for the attempt, outside the rolled-back transaction.
    assert_eq!(
        h.db.audits()
            .count_by_outcome(AuditOutcome::Error)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn update_conflict_surfaces_without_orphan_audit_rows() {
    let h = harness().await;
    let (_, admin, _) = h.register("admin", Role::Admin).await;

    let err = h
        .products
        .update(&admin, "no-such-id", ProductPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MutationError::Core(CoreError::NotFound { .. })
    ));

    // No Success row exists for an entity that was never written.
    assert_eq!(
        h.db.audits()
            .find_for_target(EntityKind::Product, "no-such-id")
            .await
            .unwrap()
            .iter()
            .filter(|r| r.outcome == AuditOutcome::Success)
            .count(),
        0
    );
}
