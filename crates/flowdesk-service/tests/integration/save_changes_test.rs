//! Integration tests for saving user status and token edits.

mod helpers;

use chrono::Utc;

use flowdesk_core::ErrorKind;
use flowdesk_core::traits::Table;
use flowdesk_entity::user::{SubscriptionDuration, UserStatus};
use flowdesk_service::{StatusRequest, TokenRequest};

use helpers::TestApp;

fn subscription(months: u32) -> StatusRequest {
    StatusRequest {
        status: UserStatus::Subscription,
        duration: SubscriptionDuration::Months(months),
    }
}

#[tokio::test]
async fn test_token_failure_reports_one_error_and_status_persists() {
    let app = TestApp::new();
    let user = app.seed_user("alice", UserStatus::Trial).await;

    app.store.fail_writes(Table::Users, "personal_token");
    let outcome = app
        .services
        .coordinator
        .save_changes(&user, &subscription(6), &TokenRequest::new("tok-alice"))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].kind, ErrorKind::StoreWriteFailed);

    let saved = app.user(&user).await;
    assert_eq!(saved.status, UserStatus::Subscription);
    assert!(saved.personal_token.is_none());
}

#[tokio::test]
async fn test_both_failures_are_aggregated() {
    let app = TestApp::new();
    let user = app.seed_user("bob", UserStatus::Trial).await;

    app.store.fail_writes(Table::Users, "personal_token");
    app.store.fail_writes(Table::Users, "status");
    let outcome = app
        .services
        .coordinator
        .save_changes(&user, &subscription(1), &TokenRequest::new("tok-bob"))
        .await;

    assert_eq!(outcome.errors.len(), 2);
    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialFailure);
    assert_eq!(err.causes.len(), 2);
    assert!(err.message.contains("Failed to update user status"));
    assert!(err.message.contains("Failed to update personal token"));
}

#[tokio::test]
async fn test_lifetime_duration_overrides_selected_status() {
    let app = TestApp::new();

    for (i, selected) in [UserStatus::Trial, UserStatus::Subscription, UserStatus::Inactive]
        .into_iter()
        .enumerate()
    {
        let user = app.seed_user(&format!("carol{i}"), UserStatus::Trial).await;
        let outcome = app
            .services
            .coordinator
            .save_changes(
                &user,
                &StatusRequest {
                    status: selected,
                    duration: SubscriptionDuration::Lifetime,
                },
                &TokenRequest::default(),
            )
            .await;
        assert!(outcome.success, "selected {selected}");

        let saved = app.user(&user).await;
        assert_eq!(saved.status, UserStatus::Lifetime, "selected {selected}");
        assert!(saved.subscription_expiry.is_none());
    }
}

#[tokio::test]
async fn test_non_upgrade_does_not_read_token_count() {
    let app = TestApp::new();
    let user = app.seed_user("hal", UserStatus::Trial).await;
    let other = app.seed_user("ivy", UserStatus::Trial).await;

    app.store.fail_reads(Table::Users);
    let outcome = app
        .services
        .coordinator
        .save_changes(
            &user,
            &StatusRequest {
                status: UserStatus::Inactive,
                duration: SubscriptionDuration::Months(6),
            },
            &TokenRequest::new("tok-hal"),
        )
        .await;
    assert!(outcome.success);

    // An upgrade still needs the count, so the read failure surfaces.
    let upgrade = app
        .services
        .coordinator
        .save_changes(&other, &subscription(1), &TokenRequest::default())
        .await;
    assert!(!upgrade.success);
    assert_eq!(upgrade.errors.len(), 1);
    app.store.heal();

    let saved = app.user(&user).await;
    assert_eq!(saved.status, UserStatus::Inactive);
    assert_eq!(saved.personal_token.as_deref(), Some("tok-hal"));
    assert_eq!(app.user(&other).await.status, UserStatus::Trial);
}

#[tokio::test]
async fn test_token_ceiling_at_four_holders() {
    let app = TestApp::new();
    for i in 0..3 {
        app.seed_token_holder(&format!("holder{i}"), &format!("tok{i}"))
            .await;
    }
    let early = app.seed_user("early", UserStatus::Trial).await;
    let late = app.seed_user("late", UserStatus::Inactive).await;

    // Three holders: the upgrade goes through.
    let outcome = app
        .services
        .coordinator
        .save_changes(&early, &subscription(12), &TokenRequest::default())
        .await;
    assert!(outcome.success);
    let saved = app.user(&early).await;
    assert_eq!(saved.status, UserStatus::Subscription);
    assert!(saved.subscription_expiry.is_some_and(|e| e > Utc::now()));

    app.seed_token_holder("holder3", "tok3").await;
    assert_eq!(app.services.users.authorized_token_count().await.unwrap(), 4);

    let outcome = app
        .services
        .coordinator
        .save_changes(&late, &subscription(12), &TokenRequest::default())
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.errors[0].kind, ErrorKind::TokenCeilingReached);
    assert_eq!(app.user(&late).await.status, UserStatus::Inactive);

    // A holder may still upgrade.
    let holder = app.seed_user("holder4", UserStatus::Trial).await;
    let holder = app
        .services
        .user_repo
        .set_personal_token(holder.id, Some("tok4"))
        .await
        .unwrap();
    let outcome = app
        .services
        .coordinator
        .save_changes(&holder, &subscription(1), &TokenRequest::new("tok4"))
        .await;
    assert!(outcome.success);
}

#[tokio::test]
async fn test_ceiling_follows_configuration() {
    let mut config = flowdesk_core::config::AppConfig::default();
    config.entitlement.authorized_token_limit = 1;
    let app = TestApp::with_config(config);
    app.seed_token_holder("holder", "tok").await;
    let user = app.seed_user("dave", UserStatus::Trial).await;

    let outcome = app
        .services
        .coordinator
        .save_changes(&user, &subscription(1), &TokenRequest::default())
        .await;
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].message.contains("fewer than 2 users"));
}
