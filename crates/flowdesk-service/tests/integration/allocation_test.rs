//! Integration tests for pool allocation.

mod helpers;

use futures::future::join_all;

use flowdesk_core::ErrorKind;
use flowdesk_core::config::OccupancyPolicy;
use flowdesk_core::traits::Table;
use flowdesk_entity::flow_account::{AccountCode, FLOW_ACCOUNT_CAPACITY};
use flowdesk_entity::user::UserStatus;

use helpers::TestApp;

#[tokio::test]
async fn test_nine_of_ten_then_full() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 9).await;
    let u1 = app.seed_user("u1", UserStatus::Trial).await;
    let u2 = app.seed_user("u2", UserStatus::Trial).await;

    let assignment = app.services.allocator.assign(u1.id, None).await.unwrap();
    assert_eq!(assignment.code.as_str(), "E1");
    assert_eq!(app.account(&e1).await.occupancy, 10);

    let explicit = app
        .services
        .allocator
        .assign(u2.id, Some(&AccountCode::from("E1")))
        .await
        .unwrap_err();
    assert_eq!(explicit.kind, ErrorKind::AccountFull);

    let auto = app.services.allocator.assign(u2.id, None).await.unwrap_err();
    assert_eq!(auto.kind, ErrorKind::NoCapacity);
    assert!(app.user(&u2).await.pool_code.is_none());
}

#[tokio::test]
async fn test_assign_release_round_trip_restores_occupancy() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 4).await;
    let e2 = app.seed_account("E2", 4).await;
    let user = app.seed_user("alice", UserStatus::Trial).await;

    let assignment = app.services.allocator.assign(user.id, None).await.unwrap();
    // Tie on occupancy goes to the smaller code.
    assert_eq!(assignment.code.as_str(), "E1");

    app.services.allocator.release(user.id).await.unwrap();
    assert_eq!(app.account(&e1).await.occupancy, 4);
    assert_eq!(app.account(&e2).await.occupancy, 4);
    assert!(app.user(&user).await.pool_code.is_none());
}

#[tokio::test]
async fn test_reassign_without_prior_assignment_is_plain_assign() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 0).await;
    let user = app.seed_user("bob", UserStatus::Trial).await;

    let assignment = app.services.allocator.reassign(user.id, None).await.unwrap();
    assert_eq!(assignment.code, e1.code);
    assert_eq!(app.account(&e1).await.occupancy, 1);
}

#[tokio::test]
async fn test_failed_increment_keeps_user_write() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 2).await;
    let user = app.seed_user("carol", UserStatus::Trial).await;

    app.store.fail_writes(Table::FlowAccounts, "occupancy");
    let assignment = app.services.allocator.assign(user.id, None).await.unwrap();
    assert_eq!(assignment.code.as_str(), "E1");

    // The counter lags behind until reconciliation.
    assert_eq!(app.account(&e1).await.occupancy, 2);
    assert_eq!(app.user(&user).await.pool_code, Some(e1.code.clone()));

    app.store.heal();
    let report = app.services.reconciler.reconcile(false).await.unwrap();
    assert_eq!(report.drifts.len(), 1);
    assert_eq!(app.account(&e1).await.occupancy, 3);
}

#[tokio::test]
async fn test_failed_user_write_leaves_counter_untouched() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 2).await;
    let user = app.seed_user("dave", UserStatus::Trial).await;

    app.store.fail_writes(Table::Users, "pool_code");
    let err = app.services.allocator.assign(user.id, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreWriteFailed);
    assert_eq!(app.account(&e1).await.occupancy, 2);
}

#[tokio::test]
async fn test_release_clears_user_even_if_decrement_fails() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 0).await;
    let user = app.seed_user("erin", UserStatus::Trial).await;
    app.services.allocator.assign(user.id, None).await.unwrap();

    app.store.fail_writes(Table::FlowAccounts, "occupancy");
    app.services.allocator.release(user.id).await.unwrap();
    assert!(app.user(&user).await.pool_code.is_none());
    assert_eq!(app.account(&e1).await.occupancy, 1);
}

#[tokio::test]
async fn test_remove_user_frees_slot() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 9).await;
    let leaving = app.seed_user("leaving", UserStatus::Trial).await;
    let waiting = app.seed_user("waiting", UserStatus::Trial).await;

    app.services.allocator.assign(leaving.id, None).await.unwrap();
    assert_eq!(app.account(&e1).await.occupancy, 10);

    app.services.users.remove_user(leaving.id).await.unwrap();
    assert_eq!(app.account(&e1).await.occupancy, 9);

    let assignment = app.services.allocator.assign(waiting.id, None).await.unwrap();
    assert_eq!(assignment.code, e1.code);
}

#[tokio::test]
async fn test_remove_user_kept_when_release_fails() {
    let app = TestApp::new();
    app.seed_account("E1", 0).await;
    let user = app.seed_user("stuck", UserStatus::Trial).await;
    app.services.allocator.assign(user.id, None).await.unwrap();

    app.store.fail_writes(Table::Users, "pool_code");
    let err = app.services.users.remove_user(user.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreWriteFailed);
    app.store.heal();

    let kept = app.user(&user).await;
    assert_eq!(kept.pool_code.as_ref().map(AccountCode::as_str), Some("E1"));
}

#[tokio::test]
async fn test_removed_account_code_is_reused() {
    let app = TestApp::new();
    let services = &app.services;
    let first = services
        .accounts
        .add_account("one@pool.test", "pw", None)
        .await
        .unwrap();
    services
        .accounts
        .add_account("two@pool.test", "pw", None)
        .await
        .unwrap();

    services.accounts.remove_account(first.id).await.unwrap();
    let replacement = services
        .accounts
        .add_account("three@pool.test", "pw", None)
        .await
        .unwrap();
    assert_eq!(replacement.code.as_str(), "E1");

    let user = app.seed_user("frank", UserStatus::Trial).await;
    let assignment = services
        .allocator
        .assign(user.id, Some(&AccountCode::from("E1")))
        .await
        .unwrap();
    assert_eq!(assignment.account_id, replacement.id);
}

#[tokio::test]
async fn test_strict_policy_never_exceeds_capacity_under_concurrency() {
    let app = TestApp::with_policy(OccupancyPolicy::Strict);
    let e1 = app.seed_account("E1", 0).await;

    let mut users = Vec::new();
    for i in 0..15 {
        users.push(app.seed_user(&format!("user{i}"), UserStatus::Trial).await);
    }

    let allocator = app.services.allocator.clone();
    let tasks = users.iter().map(|user| {
        let allocator = allocator.clone();
        let id = user.id;
        tokio::spawn(async move { allocator.assign(id, None).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count() as u32;
    assert!(granted >= 1 && granted <= FLOW_ACCOUNT_CAPACITY);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(err.kind, ErrorKind::NoCapacity | ErrorKind::Conflict),
            "unexpected error: {err}"
        );
    }
    assert_eq!(app.account(&e1).await.occupancy, granted);

    // Losers of a contended round may retry; the pool still stops at capacity.
    for (user, result) in users.iter().zip(&results) {
        if result.is_err() {
            let _ = app.services.allocator.assign(user.id, None).await;
        }
    }

    assert_eq!(app.account(&e1).await.occupancy, FLOW_ACCOUNT_CAPACITY);
    let holders = app
        .services
        .user_repo
        .find_by_pool_code(&e1.code)
        .await
        .unwrap();
    assert_eq!(holders.len() as u32, FLOW_ACCOUNT_CAPACITY);
}
