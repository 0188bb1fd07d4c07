//! Authorization guard.
//!
//! The pure gate in front of every operation: resolves the caller from
//! their token, consults the role-permission matrix, and either hands back
//! an [`ActorContext`] or a [`Denied`]. This function never mutates state;
//! routing Forbidden denials to the audit recorder is the caller's job
//! (`MutationCoordinator::record_denied` in vigilis-db).

use thiserror::Error;
use tracing::debug;

use vigilis_core::{is_allowed, ActorContext, Operation};

use crate::token::TokenService;

/// Why an attempt was refused pre-mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Missing, malformed, expired, or mis-signed token (401-equivalent).
    /// The precise token failure is logged, never exposed.
    Unauthenticated,

    /// Valid token, but the role is not allowed this operation
    /// (403-equivalent). A denied attempt is observable: it is still
    /// routed to the audit recorder.
    Forbidden,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::Forbidden => "forbidden",
        }
    }
}

/// A refused attempt.
///
/// `actor` is the identity the token resolved to, present only for
/// Forbidden: an unauthenticated attempt has no identity to name, which
/// is exactly the anonymous-actor case on the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("denied: {}", reason.as_str())]
pub struct Denied {
    pub reason: DenyReason,
    pub actor: Option<ActorContext>,
}

impl Denied {
    pub fn unauthenticated() -> Self {
        Denied {
            reason: DenyReason::Unauthenticated,
            actor: None,
        }
    }

    pub fn forbidden(actor: ActorContext) -> Self {
        Denied {
            reason: DenyReason::Forbidden,
            actor: Some(actor),
        }
    }
}

/// Accepts or rejects an operation before it executes.
#[derive(Clone)]
pub struct AuthorizationGuard {
    tokens: TokenService,
}

impl AuthorizationGuard {
    pub fn new(tokens: TokenService) -> Self {
        AuthorizationGuard { tokens }
    }

    /// Resolve the caller and check the matrix for `operation`.
    ///
    /// Deterministic: the same token and operation always produce the same
    /// outcome (and the same denial reason).
    pub fn authorize(&self, token: &str, operation: Operation) -> Result<ActorContext, Denied> {
        let identity = match self.tokens.verify(token) {
            Ok(identity) => identity,
            Err(err) => {
                // The distinction (expired / malformed / bad signature) is
                // for logging only; the caller sees one outcome.
                debug!(error = %err, operation = %operation, "token rejected");
                return Err(Denied::unauthenticated());
            }
        };

        let actor = ActorContext::new(identity.user_id, identity.role);

        if !is_allowed(actor.role, operation) {
            debug!(
                user_id = %actor.user_id,
                role = %actor.role,
                operation = %operation,
                "operation forbidden for role"
            );
            return Err(Denied::forbidden(actor));
        }

        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigilis_core::Role;

    fn guard() -> AuthorizationGuard {
        AuthorizationGuard::new(TokenService::new("test-secret", 3600))
    }

    fn token_for(role: Role) -> String {
        TokenService::new("test-secret", 3600)
            .issue("user-001", role)
            .unwrap()
    }

    #[test]
    fn admin_may_delete_products() {
        let actor = guard()
            .authorize(&token_for(Role::Admin), Operation::ProductDelete)
            .unwrap();
        assert_eq!(actor.user_id, "user-001");
        assert_eq!(actor.role, Role::Admin);
    }

    #[test]
    fn sales_may_not_delete_products() {
        let denied = guard()
            .authorize(&token_for(Role::Sales), Operation::ProductDelete)
            .unwrap_err();
        assert_eq!(denied.reason, DenyReason::Forbidden);
        // Forbidden still names who tried.
        assert_eq!(denied.actor.unwrap().user_id, "user-001");
    }

    #[test]
    fn invalid_token_is_unauthenticated_not_forbidden() {
        let denied = guard()
            .authorize("garbage", Operation::ProductRead)
            .unwrap_err();
        assert_eq!(denied.reason, DenyReason::Unauthenticated);
    }

    #[test]
    fn denial_is_idempotent() {
        // Same invalid token, same operation: same reason both times.
        let expired = TokenService::new("test-secret", -10)
            .issue("user-001", Role::Admin)
            .unwrap();
        let g = guard();

        let first = g.authorize(&expired, Operation::InvoiceCreate).unwrap_err();
        let second = g.authorize(&expired, Operation::InvoiceCreate).unwrap_err();
        assert_eq!(first.reason, second.reason);
        assert_eq!(first.reason, DenyReason::Unauthenticated);
    }

    #[test]
    fn expired_token_collapses_to_unauthenticated() {
        let expired = TokenService::new("test-secret", -10)
            .issue("user-001", Role::Admin)
            .unwrap();
        let denied = guard()
            .authorize(&expired, Operation::ProductRead)
            .unwrap_err();
        assert_eq!(denied.reason, DenyReason::Unauthenticated);
    }
}
