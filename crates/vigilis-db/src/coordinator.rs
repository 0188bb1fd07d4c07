//! # Mutation Coordinator
//!
//! Single chokepoint for every audited mutation.
//!
//! ## Transaction Protocol
//! ```text
//! perform():
//!   BEGIN
//!     run mutation closure ──► MutationRecord
//!     INSERT audit row (Success)        <- same transaction
//!   COMMIT                              <- both or neither
//!
//! on mutation error:
//!   ROLLBACK, then INSERT audit row (Error) through the pool
//! ```
//!
//! Registration is the one exception: a new user cannot be referenced by
//! an audit row inside its own transaction without creating a forward
//! reference, so `register_user` commits the user first and audits second
//! (degraded mode: a lost registration audit is logged, never a failure).

use std::future::Future;
use std::pin::Pin;

use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::{audit, audit::NewAuditEntry, user};
use vigilis_core::{
    ActorContext, AuditAction, AuditOutcome, CoreError, EntityKind, Operation, User,
    ValidationError,
};

// =============================================================================
// Mutation Error
// =============================================================================

/// What a mutation attempt can fail with.
///
/// Business failures arrive as [`CoreError`]; infrastructure failures stay
/// [`DbError`]. The `From<DbError>` impl promotes the two constraint
/// categories the domain cares about (missing rows, unique clashes) into
/// their business-level shape.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for MutationError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                MutationError::Core(CoreError::NotFound { entity, id })
            }
            DbError::UniqueViolation { field, value } => {
                MutationError::Core(CoreError::Conflict { field, value })
            }
            other => MutationError::Db(other),
        }
    }
}

impl From<ValidationError> for MutationError {
    fn from(err: ValidationError) -> Self {
        MutationError::Core(CoreError::Validation(err))
    }
}

pub type MutationResult<T> = Result<T, MutationError>;

// =============================================================================
// Mutation Record
// =============================================================================

/// What a successful mutation closure hands back: everything the
/// coordinator needs to write the Success audit row.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub action: AuditAction,
    pub detail: Option<serde_json::Value>,
}

impl MutationRecord {
    pub fn new(
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        action: AuditAction,
    ) -> Self {
        MutationRecord {
            entity_kind,
            entity_id: entity_id.into(),
            action,
            detail: None,
        }
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Boxed future returned by a mutation closure.
pub type MutationFuture<'c> =
    Pin<Box<dyn Future<Output = MutationResult<MutationRecord>> + Send + 'c>>;

/// Identity helper that pins a closure to the exact higher-ranked
/// signature `perform` expects, so call sites can use plain closures
/// returning `Box::pin(async move { .. })`.
pub fn mutation<F>(f: F) -> F
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> MutationFuture<'c>,
{
    f
}

// =============================================================================
// Coordinator
// =============================================================================

/// Runs mutations and their audit rows as one atomic unit.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    pool: SqlitePool,
}

impl MutationCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        MutationCoordinator { pool }
    }

    /// Executes a mutation and its Success audit row in one transaction.
    ///
    /// On closure failure the transaction rolls back (no partial writes,
    /// no orphaned audit rows) and an Error audit row is written through
    /// the pool in a separate committed context.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let record = coordinator
    ///     .perform(&actor, Operation::ProductCreate, mutation(|conn| Box::pin(async move {
    ///         product::insert(&mut *conn, &product).await?;
    ///         Ok(MutationRecord::new(EntityKind::Product, &product.id, AuditAction::Create))
    ///     })))
    ///     .await?;
    /// ```
    pub async fn perform<F>(
        &self,
        actor: &ActorContext,
        operation: Operation,
        f: F,
    ) -> MutationResult<MutationRecord>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> MutationFuture<'c>,
    {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        match f(&mut *tx).await {
            Ok(record) => {
                let mut entry = NewAuditEntry::new(
                    Some(actor.user_id.clone()),
                    record.action,
                    record.entity_kind,
                    AuditOutcome::Success,
                )
                .entity_id(&record.entity_id);
                entry.detail = record.detail.clone();

                audit::insert(&mut *tx, &entry).await?;
                tx.commit().await.map_err(DbError::from)?;

                debug!(
                    actor = %actor.user_id,
                    entity = %record.entity_kind,
                    entity_id = %record.entity_id,
                    "Mutation committed"
                );
                Ok(record)
            }
            Err(err) => {
                // Explicit for clarity; dropping the transaction would
                // roll back too.
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after mutation error");
                }
                self.record_error_row(actor, operation, &err).await;
                Err(err)
            }
        }
    }

    /// Writes a Denied audit row for an attempt the guard refused.
    ///
    /// `actor` is `None` when authentication itself failed; the row then
    /// carries the anonymous-actor marker (NULL actor).
    pub async fn record_denied(
        &self,
        actor: Option<&ActorContext>,
        operation: Operation,
        reason: &str,
    ) -> MutationResult<()> {
        let entry = NewAuditEntry::new(
            actor.map(|a| a.user_id.clone()),
            operation.audit_action(),
            operation.entity_kind(),
            AuditOutcome::Denied,
        )
        .detail(json!({
            "operation": operation.as_str(),
            "reason": reason,
        }));

        audit::insert(&self.pool, &entry).await?;

        debug!(
            actor = actor.map(|a| a.user_id.as_str()).unwrap_or("<anonymous>"),
            operation = operation.as_str(),
            reason,
            "Denied attempt recorded"
        );
        Ok(())
    }

    /// Writes a Login audit row (Success or Denied).
    ///
    /// Failed logins use `actor = None` when the username did not resolve,
    /// so credential probing against unknown names is still visible.
    pub async fn record_login(
        &self,
        actor_user_id: Option<&str>,
        outcome: AuditOutcome,
        detail: serde_json::Value,
    ) -> MutationResult<()> {
        let entry = NewAuditEntry::new(
            actor_user_id.map(str::to_string),
            AuditAction::Login,
            EntityKind::User,
            outcome,
        )
        .detail(detail);

        audit::insert(&self.pool, &entry).await?;
        Ok(())
    }

    /// Registers a user with the two-phase protocol.
    ///
    /// Phase 1 commits the user row alone; phase 2 writes the Register
    /// audit row, which may reference the now-durable user. An audit
    /// failure after a committed user is degraded mode, not an error:
    /// the registration stands and the loss is logged.
    ///
    /// A phase-1 failure (duplicate username losing the unique-index
    /// race included) still leaves exactly one Error row.
    pub async fn register_user(
        &self,
        actor: Option<&ActorContext>,
        new_user: &User,
    ) -> MutationResult<()> {
        if let Err(err) = user::insert(&self.pool, new_user).await {
            let err = MutationError::from(err);
            // Phase 1 failed: the user row does not exist, so the Error
            // row carries no entity id, just the attempt.
            let entry = NewAuditEntry::new(
                actor.map(|a| a.user_id.clone()),
                AuditAction::Register,
                EntityKind::User,
                AuditOutcome::Error,
            )
            .detail(json!({
                "username": new_user.username,
                "error": err.to_string(),
            }));
            if let Err(audit_err) = audit::insert(&self.pool, &entry).await {
                warn!(
                    username = %new_user.username,
                    error = %audit_err,
                    "Failed to record Error audit row for registration"
                );
            }
            return Err(err);
        }

        let entry = NewAuditEntry::new(
            actor.map(|a| a.user_id.clone()),
            AuditAction::Register,
            EntityKind::User,
            AuditOutcome::Success,
        )
        .entity_id(&new_user.id)
        .detail(json!({
            "username": new_user.username,
            "role": new_user.role.as_str(),
        }));

        if let Err(err) = audit::insert(&self.pool, &entry).await {
            warn!(
                user_id = %new_user.id,
                error = %err,
                "Registration committed but audit write failed (degraded)"
            );
        }

        debug!(user_id = %new_user.id, username = %new_user.username, "User registered");
        Ok(())
    }

    /// Best-effort Error audit row after a rolled-back mutation.
    ///
    /// Runs outside the failed transaction. If this write fails too, the
    /// failure is logged; the caller still gets the original error.
    async fn record_error_row(&self, actor: &ActorContext, operation: Operation, err: &MutationError) {
        // The failed closure never produced a MutationRecord, so the
        // concrete entity id is unknown; kind and action come from the
        // attempted operation.
        let entry = NewAuditEntry::new(
            Some(actor.user_id.clone()),
            operation.audit_action(),
            operation.entity_kind(),
            AuditOutcome::Error,
        )
        .detail(json!({
            "operation": operation.as_str(),
            "error": err.to_string(),
        }));

        if let Err(audit_err) = audit::insert(&self.pool, &entry).await {
            warn!(
                actor = %actor.user_id,
                error = %audit_err,
                "Failed to record Error audit row"
            );
        }
    }
}
