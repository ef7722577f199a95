//! Service wiring shared by every front end.

use std::sync::Arc;

use flowdesk_core::config::AppConfig;
use flowdesk_core::traits::{RecordStore, Table};
use flowdesk_database::UniqueIndex;
use flowdesk_database::repositories::{FlowAccountRepository, UserRepository};

use crate::entitlement::EntitlementGate;
use crate::flow_account::FlowAccountService;
use crate::pool::{OccupancyReconciler, PoolAllocator};
use crate::user::{UserDirectoryService, UserMutationCoordinator};

/// All services, built over one record store.
///
/// Fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppServices {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Repositories ─────────────────────────────────────────
    /// User repository
    pub user_repo: Arc<UserRepository>,
    /// Flow account repository
    pub account_repo: Arc<FlowAccountRepository>,

    // ── Services ─────────────────────────────────────────────
    /// User directory
    pub users: Arc<UserDirectoryService>,
    /// Flow account administration
    pub accounts: Arc<FlowAccountService>,
    /// Pool allocator
    pub allocator: Arc<PoolAllocator>,
    /// Save-changes coordinator
    pub coordinator: Arc<UserMutationCoordinator>,
    /// Occupancy reconciler
    pub reconciler: Arc<OccupancyReconciler>,
}

impl AppServices {
    /// Builds every service over `store`.
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let user_repo = Arc::new(UserRepository::new(store.clone()));
        let account_repo = Arc::new(FlowAccountRepository::new(store));

        let gate = EntitlementGate::new(&config.entitlement);
        let allocator = Arc::new(PoolAllocator::new(
            user_repo.clone(),
            account_repo.clone(),
            config.pool.clone(),
        ));

        Self {
            users: Arc::new(UserDirectoryService::new(user_repo.clone(), allocator.clone())),
            accounts: Arc::new(FlowAccountService::new(account_repo.clone())),
            allocator,
            coordinator: Arc::new(UserMutationCoordinator::new(user_repo.clone(), gate)),
            reconciler: Arc::new(OccupancyReconciler::new(
                user_repo.clone(),
                account_repo.clone(),
            )),
            user_repo,
            account_repo,
            config: Arc::new(config),
        }
    }

    /// Unique indexes the store should enforce under `config`.
    pub fn unique_indexes(config: &AppConfig) -> Vec<UniqueIndex> {
        let mut indexes = Vec::new();
        if config.store.unique_personal_token {
            indexes.push(UniqueIndex::new(Table::Users, "personal_token"));
        }
        indexes
    }
}
