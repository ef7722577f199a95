//! Occupancy reconciliation between flow account counters and user pointers.
//!
//! Counters drift when an increment or decrement fails after the user write
//! went through. The reconciler recounts users per active account and forces
//! each counter to match.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use flowdesk_core::error::AppError;
use flowdesk_core::traits::Service;
use flowdesk_core::types::id::UserId;
use flowdesk_database::repositories::{FlowAccountRepository, UserRepository};
use flowdesk_entity::flow_account::AccountCode;

/// A counter that disagrees with the number of users pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDrift {
    /// Account code.
    pub code: AccountCode,
    /// Value stored on the account.
    pub recorded: u32,
    /// Users actually holding the code.
    pub actual: u32,
}

/// A user whose code matches no active account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedUser {
    /// The user.
    pub user_id: UserId,
    /// The dangling code.
    pub code: AccountCode,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Accounts whose counter was (or would be) corrected.
    pub drifts: Vec<AccountDrift>,
    /// Users pointing at no active account. Reported, never modified.
    pub orphaned_users: Vec<OrphanedUser>,
    /// Whether corrections were written.
    pub applied: bool,
}

impl ReconcileReport {
    /// Returns `true` if no drift and no orphan was found.
    pub fn is_consistent(&self) -> bool {
        self.drifts.is_empty() && self.orphaned_users.is_empty()
    }
}

/// Recounts occupancy from user pointers.
#[derive(Debug, Clone)]
pub struct OccupancyReconciler {
    /// User repository.
    users: Arc<UserRepository>,
    /// Flow account repository.
    accounts: Arc<FlowAccountRepository>,
}

impl Service for OccupancyReconciler {}

impl OccupancyReconciler {
    /// Creates a new occupancy reconciler.
    pub fn new(users: Arc<UserRepository>, accounts: Arc<FlowAccountRepository>) -> Self {
        Self { users, accounts }
    }

    /// Detects drift and, unless `dry_run` is set, overwrites each drifted counter.
    pub async fn reconcile(&self, dry_run: bool) -> Result<ReconcileReport, AppError> {
        let accounts = self.accounts.find_active().await?;
        let users = self.users.find_all().await?;

        let mut held: BTreeMap<&AccountCode, u32> = BTreeMap::new();
        for code in users.iter().filter_map(|u| u.pool_code.as_ref()) {
            *held.entry(code).or_default() += 1;
        }

        let orphaned_users: Vec<OrphanedUser> = users
            .iter()
            .filter_map(|u| {
                let code = u.pool_code.as_ref()?;
                (!accounts.iter().any(|a| &a.code == code)).then(|| OrphanedUser {
                    user_id: u.id,
                    code: code.clone(),
                })
            })
            .collect();

        let mut report = ReconcileReport {
            orphaned_users,
            applied: !dry_run,
            ..ReconcileReport::default()
        };

        for account in &accounts {
            let actual = held.get(&account.code).copied().unwrap_or(0);
            if actual == account.occupancy {
                continue;
            }

            warn!(
                code = %account.code,
                recorded = account.occupancy,
                actual,
                delta = account.occupancy as i64 - actual as i64,
                "Occupancy drift detected"
            );

            if !dry_run {
                self.accounts.set_occupancy(account.id, actual).await?;
            }

            report.drifts.push(AccountDrift {
                code: account.code.clone(),
                recorded: account.occupancy,
                actual,
            });
        }

        for orphan in &report.orphaned_users {
            warn!(
                user_id = %orphan.user_id,
                code = %orphan.code,
                "User holds a code with no active flow account"
            );
        }

        if report.is_consistent() {
            info!(accounts = accounts.len(), "Occupancy is consistent");
        } else {
            info!(
                drifted = report.drifts.len(),
                orphaned = report.orphaned_users.len(),
                dry_run,
                "Occupancy reconciliation completed"
            );
        }

        Ok(report)
    }
}
