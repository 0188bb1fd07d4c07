//! Identity service: registration and login.
//!
//! Registration is the one mutation that does not use the single-
//! transaction protocol - see the two-phase rationale on
//! [`MutationCoordinator::register_user`].
//!
//! Login never mutates domain state but is still observable: every
//! attempt leaves a Login row, Denied ones included. A failed attempt
//! against an unknown username carries the anonymous-actor marker, so
//! credential probing shows up on the trail.

use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use vigilis_auth::{hash_password, verify_password, AuthError, TokenService};
use vigilis_core::{ActorContext, AuditOutcome, NewUser, User};

use crate::coordinator::{MutationCoordinator, MutationError};
use crate::repository::user::UserRepository;

/// Identity-path failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong username or password; deliberately not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been disabled.
    #[error("account is disabled")]
    AccountDisabled,

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// A successful login: the issued token plus the user it names.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user: User,
}

/// Registration and login.
#[derive(Clone)]
pub struct IdentityService {
    coordinator: MutationCoordinator,
    users: UserRepository,
    tokens: TokenService,
}

impl IdentityService {
    pub fn new(pool: SqlitePool, tokens: TokenService) -> Self {
        IdentityService {
            coordinator: MutationCoordinator::new(pool.clone()),
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Registers a user via the two-phase protocol.
    ///
    /// `actor` is the admin performing the registration, or `None` during
    /// bootstrap when the very first account is created and no actor can
    /// exist yet. A duplicate username surfaces as `Conflict` from the
    /// store's unique index, never from a pre-check.
    pub async fn register(
        &self,
        actor: Option<&ActorContext>,
        input: NewUser,
    ) -> Result<User, IdentityError> {
        input
            .validate()
            .map_err(|err| IdentityError::Mutation(err.into()))?;

        let created = User {
            id: Uuid::new_v4().to_string(),
            username: input.username.trim().to_string(),
            password_hash: hash_password(&input.password)?,
            role: input.role,
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        self.coordinator.register_user(actor, &created).await?;
        Ok(created)
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// Every outcome is audited. Unknown username and wrong password both
    /// collapse to `InvalidCredentials` for the caller; the audit detail
    /// keeps them apart for the admin reading the trail.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, IdentityError> {
        let user = match self.users.get_by_username(username).await {
            Ok(user) => user,
            Err(err) => return Err(MutationError::from(err).into()),
        };

        let Some(user) = user else {
            self.coordinator
                .record_login(
                    None,
                    AuditOutcome::Denied,
                    json!({ "username": username, "reason": "unknown_username" }),
                )
                .await?;
            return Err(IdentityError::InvalidCredentials);
        };

        if !user.is_active {
            self.coordinator
                .record_login(
                    Some(&user.id),
                    AuditOutcome::Denied,
                    json!({ "username": username, "reason": "account_disabled" }),
                )
                .await?;
            return Err(IdentityError::AccountDisabled);
        }

        if !verify_password(&user.password_hash, password) {
            self.coordinator
                .record_login(
                    Some(&user.id),
                    AuditOutcome::Denied,
                    json!({ "username": username, "reason": "bad_password" }),
                )
                .await?;
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, user.role)?;
        self.coordinator
            .record_login(
                Some(&user.id),
                AuditOutcome::Success,
                json!({ "username": username }),
            )
            .await?;

        debug!(user_id = %user.id, username = %user.username, "Login succeeded");
        Ok(LoginSession { token, user })
    }
}
