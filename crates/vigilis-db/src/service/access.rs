//! Access gate: authorization plus denied-attempt recording.
//!
//! The guard itself is pure; this service is the impure wrapper that
//! writes the Denied audit row when the guard refuses. One row per
//! refused attempt, with a NULL actor when authentication itself failed.

use tracing::warn;

use vigilis_auth::{AuthorizationGuard, Denied};
use vigilis_core::{ActorContext, Operation};

use crate::coordinator::MutationCoordinator;

/// Authorizes operations and records refusals on the audit trail.
#[derive(Clone)]
pub struct AccessService {
    guard: AuthorizationGuard,
    coordinator: MutationCoordinator,
}

impl AccessService {
    pub fn new(guard: AuthorizationGuard, coordinator: MutationCoordinator) -> Self {
        AccessService { guard, coordinator }
    }

    /// Resolves and checks the caller, auditing a refusal.
    ///
    /// The Denied row is best-effort: if the audit write itself fails the
    /// refusal still stands (fail closed) and the loss is logged.
    pub async fn authorize(
        &self,
        token: &str,
        operation: Operation,
    ) -> Result<ActorContext, Denied> {
        match self.guard.authorize(token, operation) {
            Ok(actor) => Ok(actor),
            Err(denied) => {
                if let Err(err) = self
                    .coordinator
                    .record_denied(denied.actor.as_ref(), operation, denied.reason.as_str())
                    .await
                {
                    warn!(
                        operation = operation.as_str(),
                        error = %err,
                        "Failed to record Denied audit row"
                    );
                }
                Err(denied)
            }
        }
    }
}
