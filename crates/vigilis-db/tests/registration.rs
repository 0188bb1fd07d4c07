//! Registration's two-phase protocol and the login audit trail.

mod common;

use common::harness;
use vigilis_core::{AuditAction, AuditOutcome, CoreError, EntityKind, NewUser, Role};
use vigilis_db::{IdentityError, MutationError};

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "correct-horse-battery".to_string(),
        role: Role::Cashier,
    }
}

#[tokio::test]
async fn registration_commits_user_then_audit() {
    let h = harness().await;

    let user = h.identity.register(None, new_user("alice")).await.unwrap();

    // The user row is durable.
    let stored = h.db.users().get_by_username("alice").await.unwrap().unwrap();
    assert_eq!(stored.id, user.id);
    assert!(stored.is_active);

    // The Register row references the already-committed user.
    let rows = h
        .db
        .audits()
        .find_for_target(EntityKind::User, &user.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].action, AuditAction::Register);
    assert_eq!(rows[0].outcome, AuditOutcome::Success);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict_from_the_store() {
    let h = harness().await;

    h.identity.register(None, new_user("alice")).await.unwrap();
    let err = h
        .identity
        .register(None, new_user("alice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IdentityError::Mutation(MutationError::Core(CoreError::Conflict { .. }))
    ));

    // The failed attempt is still on the trail: one Error row, no
    // second user row, no entity reference (nothing was created).
    assert_eq!(
        h.db.audits()
            .count_by_outcome(AuditOutcome::Error)
            .await
            .unwrap(),
        1
    );
    let errors: Vec<_> = h
        .db
        .audits()
        .list_recent(10, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.outcome == AuditOutcome::Error)
        .collect();
    assert_eq!(errors[0].action, AuditAction::Register);
    assert!(errors[0].entity_id.is_none());
}

#[tokio::test]
async fn concurrent_duplicate_registrations_admit_exactly_one() {
    let h = harness().await;

    let a = h.identity.clone();
    let b = h.identity.clone();
    let first = tokio::spawn(async move { a.register(None, new_user("race")).await });
    let second = tokio::spawn(async move { b.register(None, new_user("race")).await });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "the unique index admits exactly one winner");

    let loss = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loss.as_ref().unwrap_err(),
        IdentityError::Mutation(MutationError::Core(CoreError::Conflict { .. }))
    ));

    // One Success Register row for the winner, one Error row for the
    // loser: both outcomes are on the trail.
    let register_rows: Vec<_> = h
        .db
        .audits()
        .list_recent(10, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.action == AuditAction::Register)
        .collect();
    assert_eq!(
        register_rows
            .iter()
            .filter(|r| r.outcome == AuditOutcome::Success)
            .count(),
        1
    );
    assert_eq!(
        register_rows
            .iter()
            .filter(|r| r.outcome == AuditOutcome::Error)
            .count(),
        1
    );
}

#[tokio::test]
async fn weak_password_is_rejected_before_any_write() {
    let h = harness().await;

    let err = h
        .identity
        .register(
            None,
            NewUser {
                username: "bob".to_string(),
                password: "short".to_string(),
                role: Role::Sales,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IdentityError::Mutation(MutationError::Core(CoreError::Validation(_)))
    ));

    assert!(h.db.users().get_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn login_outcomes_are_audited() {
    let h = harness().await;
    let user = h.identity.register(None, new_user("alice")).await.unwrap();

    // Success issues a verifiable token.
    let session = h
        .identity
        .login("alice", "correct-horse-battery")
        .await
        .unwrap();
    let identity = h.tokens.verify(&session.token).unwrap();
    assert_eq!(identity.user_id, user.id);

    // Wrong password is denied, with the actor resolved.
    let err = h.identity.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));

    // Unknown username is denied anonymously.
    let err = h.identity.login("mallory", "whatever").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));

    let logins: Vec<_> = h
        .db
        .audits()
        .list_recent(50, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.action == AuditAction::Login)
        .collect();
    assert_eq!(logins.len(), 3);

    let denied: Vec<_> = logins
        .iter()
        .filter(|r| r.outcome == AuditOutcome::Denied)
        .collect();
    assert_eq!(denied.len(), 2);
    assert!(denied.iter().any(|r| r.actor_user_id.is_none()));
    assert!(denied
        .iter()
        .any(|r| r.actor_user_id.as_deref() == Some(user.id.as_str())));
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let h = harness().await;
    let user = h.identity.register(None, new_user("alice")).await.unwrap();
    h.db.users().set_active(&user.id, false).await.unwrap();

    let err = h
        .identity
        .login("alice", "correct-horse-battery")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::AccountDisabled));
}
