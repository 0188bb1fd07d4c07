//! # Role-Permission Matrix
//!
//! The static mapping {role × operation → allow/deny}.
//!
//! ## Matrix
//! ```text
//! Operation                      Admin   Cashier   Sales
//! ─────────────────────────────  ─────   ───────   ─────
//! Product.Create/Update/Delete   allow   deny      deny
//! Product.Read                   allow   allow     allow
//! Invoice.Create                 allow   allow     allow
//! Invoice.AddItem/Finalize/Read  allow   allow     allow
//! Invoice.Cancel                 allow   allow     deny
//! Invoice.ListAll                allow   allow     deny
//! StockAdjustment.Create         allow   allow     deny
//! User.Create                    allow   deny      deny
//! Audit.Read                     allow   deny      deny
//! ```
//!
//! ## Fail-Closed
//! The match below lists allows only; everything else falls through to
//! deny. Adding an Operation variant without touching this table denies it
//! for every role until a row is added deliberately.

use crate::types::{Operation, Role};

/// Checks whether `role` may perform `operation`.
///
/// Deterministic, pure, O(1). Never consults the store.
pub fn is_allowed(role: Role, operation: Operation) -> bool {
    use Operation::*;
    use Role::*;

    match (operation, role) {
        // Catalog is readable by everyone, writable by admins only.
        (ProductRead, _) => true,
        (ProductCreate | ProductUpdate | ProductDelete, Admin) => true,

        // Anyone behind the counter can sell.
        (InvoiceCreate | InvoiceAddItem | InvoiceFinalize | InvoiceRead, _) => true,

        // Cancelling and cross-user listing are supervisory.
        (InvoiceCancel | InvoiceListAll, Admin | Cashier) => true,

        // Stock corrections need till responsibility.
        (StockAdjustmentCreate, Admin | Cashier) => true,

        // Account management and the audit trail are admin territory.
        (UserCreate, Admin) => true,
        (AuditRead, Admin) => true,

        // Fail closed.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Operation::*;
    use Role::*;

    /// The full expected table, row by row. Kept literal so a change to
    /// `is_allowed` that flips any cell fails loudly here.
    const EXPECTED: [(Operation, [bool; 3]); 13] = [
        // (operation, [admin, cashier, sales])
        (ProductCreate, [true, false, false]),
        (ProductRead, [true, true, true]),
        (ProductUpdate, [true, false, false]),
        (ProductDelete, [true, false, false]),
        (InvoiceCreate, [true, true, true]),
        (InvoiceAddItem, [true, true, true]),
        (InvoiceFinalize, [true, true, true]),
        (InvoiceCancel, [true, true, false]),
        (InvoiceRead, [true, true, true]),
        (InvoiceListAll, [true, true, false]),
        (StockAdjustmentCreate, [true, true, false]),
        (UserCreate, [true, false, false]),
        (AuditRead, [true, false, false]),
    ];

    #[test]
    fn matrix_matches_expected_table_exactly() {
        for (op, expected) in EXPECTED {
            for (role, want) in Role::ALL.iter().zip(expected) {
                assert_eq!(
                    is_allowed(*role, op),
                    want,
                    "matrix mismatch for ({role}, {op})"
                );
            }
        }
    }

    #[test]
    fn expected_table_covers_every_operation() {
        for op in Operation::ALL {
            assert!(
                EXPECTED.iter().any(|(o, _)| *o == op),
                "operation {op} missing from the expected table"
            );
        }
    }

    #[test]
    fn matrix_is_deterministic() {
        for op in Operation::ALL {
            for role in Role::ALL {
                assert_eq!(is_allowed(role, op), is_allowed(role, op));
            }
        }
    }

    #[test]
    fn admin_is_a_superset_of_every_role() {
        for op in Operation::ALL {
            for role in [Cashier, Sales] {
                if is_allowed(role, op) {
                    assert!(is_allowed(Admin, op), "admin denied {op} but {role} allowed");
                }
            }
        }
    }
}
