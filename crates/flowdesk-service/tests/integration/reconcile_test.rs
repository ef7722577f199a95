//! Integration tests for occupancy reconciliation.

mod helpers;

use flowdesk_entity::flow_account::AccountCode;
use flowdesk_entity::user::UserStatus;

use helpers::TestApp;

#[tokio::test]
async fn test_reconcile_after_manual_drift() {
    let app = TestApp::new();
    let e1 = app.seed_account("E1", 0).await;
    let e2 = app.seed_account("E2", 0).await;

    for i in 0..3 {
        let user = app.seed_user(&format!("u{i}"), UserStatus::Trial).await;
        app.services
            .allocator
            .assign(user.id, Some(&AccountCode::from("E2")))
            .await
            .unwrap();
    }
    app.services
        .account_repo
        .set_occupancy(e1.id, 5)
        .await
        .unwrap();
    app.services
        .account_repo
        .set_occupancy(e2.id, 1)
        .await
        .unwrap();

    let preview = app.services.reconciler.reconcile(true).await.unwrap();
    assert_eq!(preview.drifts.len(), 2);
    assert_eq!(app.account(&e1).await.occupancy, 5);

    let report = app.services.reconciler.reconcile(false).await.unwrap();
    assert_eq!(report.drifts.len(), 2);
    assert_eq!(app.account(&e1).await.occupancy, 0);
    assert_eq!(app.account(&e2).await.occupancy, 3);

    let status = app.services.accounts.pool_status().await.unwrap();
    assert_eq!(status.total_occupancy, 3);
    assert_eq!(status.available, 17);
}

#[tokio::test]
async fn test_consistent_pool_reports_nothing() {
    let app = TestApp::new();
    app.seed_account("E1", 0).await;
    let user = app.seed_user("alice", UserStatus::Trial).await;
    app.services.allocator.assign(user.id, None).await.unwrap();

    let report = app.services.reconciler.reconcile(false).await.unwrap();
    assert!(report.is_consistent());
}
