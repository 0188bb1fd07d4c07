//! User repository.
//!
//! Users are never hard-deleted: disabling an account keeps the audit
//! trail's actor references resolvable forever.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vigilis_core::User;

/// Inserts a user row.
///
/// A duplicate username surfaces as `UniqueViolation` with the offending
/// value filled in; the store's UNIQUE index is the only duplicate check
/// (no pre-read, no TOCTOU window).
pub async fn insert(executor: impl Executor<'_, Database = Sqlite>, user: &User) -> DbResult<()> {
    debug!(id = %user.id, username = %user.username, "Inserting user");

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, role, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.is_active)
    .bind(user.created_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            let err = DbError::from(err);
            if err.is_unique_violation() {
                Err(DbError::duplicate("username", &user.username))
            } else {
                Err(err)
            }
        }
    }
}

/// Fetches a user by id.
pub async fn fetch_by_id(
    executor: impl Executor<'_, Database = Sqlite>,
    id: &str,
) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role, is_active, created_at
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Gets a user by username (the login path).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, is_active, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Soft-disables (or re-enables) a user.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}
