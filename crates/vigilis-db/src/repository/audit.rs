//! Audit trail repository.
//!
//! Append-only by construction: this module exposes inserts and reads,
//! nothing else. The coordinator writes Success rows inside the mutation
//! transaction; Denied and Error rows go through the pool so they survive
//! the rollback of whatever they describe.

use chrono::Utc;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use vigilis_core::{AuditAction, AuditLog, AuditOutcome, EntityKind};

const AUDIT_COLUMNS: &str =
    "id, actor_user_id, action, entity_kind, entity_id, outcome, detail, created_at";

/// A not-yet-written audit row.
///
/// `detail` is structured JSON here and serialized to TEXT at insert
/// time; reads hand the raw string back on [`AuditLog`].
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// Acting user, or `None` when no identity was resolved.
    pub actor_user_id: Option<String>,
    pub action: AuditAction,
    pub entity_kind: EntityKind,
    pub entity_id: Option<String>,
    pub outcome: AuditOutcome,
    pub detail: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(
        actor_user_id: Option<String>,
        action: AuditAction,
        entity_kind: EntityKind,
        outcome: AuditOutcome,
    ) -> Self {
        NewAuditEntry {
            actor_user_id,
            action,
            entity_kind,
            entity_id: None,
            outcome,
            detail: None,
        }
    }

    pub fn entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Inserts an audit row, returning it as persisted.
pub async fn insert(
    executor: impl Executor<'_, Database = Sqlite>,
    entry: &NewAuditEntry,
) -> DbResult<AuditLog> {
    let row = AuditLog {
        id: Uuid::new_v4().to_string(),
        actor_user_id: entry.actor_user_id.clone(),
        action: entry.action,
        entity_kind: entry.entity_kind,
        entity_id: entry.entity_id.clone(),
        outcome: entry.outcome,
        detail: entry.detail.as_ref().map(|d| d.to_string()),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO audit_log (
            id, actor_user_id, action, entity_kind,
            entity_id, outcome, detail, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&row.id)
    .bind(&row.actor_user_id)
    .bind(row.action)
    .bind(row.entity_kind)
    .bind(&row.entity_id)
    .bind(row.outcome)
    .bind(&row.detail)
    .bind(row.created_at)
    .execute(executor)
    .await?;

    Ok(row)
}

/// Repository for reading the audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Writes a standalone audit row through the pool.
    pub async fn record(&self, entry: &NewAuditEntry) -> DbResult<AuditLog> {
        insert(&self.pool, entry).await
    }

    /// Most recent audit rows, newest first.
    pub async fn list_recent(&self, limit: i64, offset: i64) -> DbResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_log
            ORDER BY created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full history for one entity, newest first.
    pub async fn find_for_target(
        &self,
        entity_kind: EntityKind,
        entity_id: &str,
    ) -> DbResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_log
            WHERE entity_kind = ?1 AND entity_id = ?2
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(entity_kind)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rows written by (or denied to) a given actor, newest first.
    pub async fn find_for_actor(&self, actor_user_id: &str, limit: i64) -> DbResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_log
            WHERE actor_user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#
        ))
        .bind(actor_user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Number of rows with the given outcome.
    pub async fn count_by_outcome(&self, outcome: AuditOutcome) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE outcome = ?1")
            .bind(outcome)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
