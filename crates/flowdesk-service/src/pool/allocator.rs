//! Flow account pool allocator: assign, release, and reassign users.
//!
//! Each operation is a sequence of independent record-store calls. Under the
//! default [`OccupancyPolicy::BestEffort`] policy a counter write that fails
//! after the user write succeeded is logged and left for the reconciler.
//! Under [`OccupancyPolicy::Strict`] a slot is reserved with a
//! compare-and-swap before the user is touched, so concurrent assigns can
//! never push an account past its capacity.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use flowdesk_core::config::{OccupancyPolicy, PoolConfig};
use flowdesk_core::error::{AppError, ErrorKind};
use flowdesk_core::traits::Service;
use flowdesk_core::types::id::{FlowAccountId, UserId};
use flowdesk_database::repositories::{FlowAccountRepository, UserRepository};
use flowdesk_entity::flow_account::{AccountCode, FlowAccount, FlowCredential};

use super::selection::select_least_loaded;

/// The result of a successful assignment.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Code now stored on the user.
    pub code: AccountCode,
    /// Account that received the user.
    pub account_id: FlowAccountId,
    /// Credential the user should sign in with.
    pub credential: FlowCredential,
}

impl Assignment {
    fn new(user_id: UserId, account: &FlowAccount) -> Self {
        Self {
            user_id,
            code: account.code.clone(),
            account_id: account.id,
            credential: account.credential.clone(),
        }
    }
}

/// Assigns users to flow accounts and keeps occupancy counters in step.
#[derive(Debug, Clone)]
pub struct PoolAllocator {
    /// User repository.
    users: Arc<UserRepository>,
    /// Flow account repository.
    accounts: Arc<FlowAccountRepository>,
    /// Counter update policy.
    config: PoolConfig,
}

impl Service for PoolAllocator {}

impl PoolAllocator {
    /// Creates a new pool allocator.
    pub fn new(
        users: Arc<UserRepository>,
        accounts: Arc<FlowAccountRepository>,
        config: PoolConfig,
    ) -> Self {
        Self {
            users,
            accounts,
            config,
        }
    }

    /// Assigns a user to `requested`, or to the least-loaded account.
    ///
    /// Any code the user already holds is overwritten without being released;
    /// use [`PoolAllocator::reassign`] to move a user.
    pub async fn assign(
        &self,
        user_id: UserId,
        requested: Option<&AccountCode>,
    ) -> Result<Assignment, AppError> {
        let target = self.resolve_target(requested).await?;
        match self.config.occupancy_policy {
            OccupancyPolicy::BestEffort => self.assign_best_effort(user_id, target).await,
            OccupancyPolicy::Strict => self.assign_strict(user_id, target, requested).await,
        }
    }

    /// Releases the user's current assignment and returns the released code.
    ///
    /// Fails with `NOTHING_ASSIGNED` if the user holds no code. A code that
    /// points at no active account is cleared from the user all the same.
    pub async fn release(&self, user_id: UserId) -> Result<AccountCode, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;

        let code = user.pool_code.ok_or_else(AppError::nothing_assigned)?;

        match self.accounts.find_active_by_code(&code).await? {
            Some(account) => self.decrement(&account).await,
            None => warn!(
                user_id = %user_id,
                code = %code,
                "Released code has no active flow account, clearing user only"
            ),
        }

        self.users.set_pool_code(user_id, None).await?;

        info!(user_id = %user_id, code = %code, "User released from flow account");
        Ok(code)
    }

    /// Moves a user: release the current assignment, then assign afresh.
    ///
    /// A user with nothing assigned is simply assigned. If the assign step
    /// fails after a successful release the user is left unassigned.
    pub async fn reassign(
        &self,
        user_id: UserId,
        requested: Option<&AccountCode>,
    ) -> Result<Assignment, AppError> {
        let released = match self.release(user_id).await {
            Ok(code) => Some(code),
            Err(e) if e.is(ErrorKind::NothingAssigned) => None,
            Err(e) => return Err(e),
        };

        self.assign(user_id, requested).await.inspect_err(|e| {
            if let Some(code) = &released {
                warn!(
                    user_id = %user_id,
                    released = %code,
                    error = %e,
                    "Reassign failed after release, user is now unassigned"
                );
            }
        })
    }

    /// Resolves the account an assign should target.
    async fn resolve_target(
        &self,
        requested: Option<&AccountCode>,
    ) -> Result<FlowAccount, AppError> {
        match requested {
            Some(code) => {
                let account = self
                    .accounts
                    .find_active_by_code(code)
                    .await?
                    .ok_or_else(|| AppError::account_not_found(code.as_str()))?;
                if account.is_full() {
                    return Err(AppError::account_full(
                        account.code.as_str(),
                        account.capacity(),
                    ));
                }
                debug!(code = %account.code, occupancy = account.occupancy, "Requested account has room");
                Ok(account)
            }
            None => {
                let available = self.accounts.find_available().await?;
                let account = select_least_loaded(&available)?;
                debug!(
                    code = %account.code,
                    occupancy = account.occupancy,
                    candidates = available.len(),
                    "Selected least-loaded account"
                );
                Ok(account.clone())
            }
        }
    }

    async fn assign_best_effort(
        &self,
        user_id: UserId,
        account: FlowAccount,
    ) -> Result<Assignment, AppError> {
        self.users
            .set_pool_code(user_id, Some(&account.code))
            .await?;

        let occupancy = account.occupancy + 1;
        if let Err(e) = self.accounts.set_occupancy(account.id, occupancy).await {
            warn!(
                user_id = %user_id,
                code = %account.code,
                error = %e,
                "User assigned but occupancy increment failed"
            );
        }

        info!(
            user_id = %user_id,
            code = %account.code,
            occupancy,
            "User assigned to flow account"
        );
        Ok(Assignment::new(user_id, &account))
    }

    async fn assign_strict(
        &self,
        user_id: UserId,
        account: FlowAccount,
        requested: Option<&AccountCode>,
    ) -> Result<Assignment, AppError> {
        let reserved = self.reserve_slot(account, requested).await?;

        if let Err(e) = self
            .users
            .set_pool_code(user_id, Some(&reserved.code))
            .await
        {
            warn!(
                user_id = %user_id,
                code = %reserved.code,
                error = %e,
                "User write failed, returning reserved slot"
            );
            self.decrement(&reserved).await;
            return Err(e);
        }

        info!(
            user_id = %user_id,
            code = %reserved.code,
            occupancy = reserved.occupancy,
            "User assigned to flow account"
        );
        Ok(Assignment::new(user_id, &reserved))
    }

    /// Increments occupancy with compare-and-swap, re-resolving on contention.
    ///
    /// An explicit request stays pinned to its code; an automatic pick is
    /// re-selected from the current pool each round.
    async fn reserve_slot(
        &self,
        mut account: FlowAccount,
        requested: Option<&AccountCode>,
    ) -> Result<FlowAccount, AppError> {
        for attempt in 1..=self.config.max_cas_attempts {
            if let Some(updated) = self
                .accounts
                .compare_and_set_occupancy(account.id, account.occupancy, account.occupancy + 1)
                .await?
            {
                return Ok(updated);
            }
            warn!(
                code = %account.code,
                attempt,
                "Occupancy changed concurrently, retrying"
            );
            account = self.resolve_target(requested).await?;
        }

        Err(AppError::conflict(format!(
            "Could not reserve a slot after {} attempts",
            self.config.max_cas_attempts
        )))
    }

    /// Lowers occupancy by one, floored at zero. Failures are logged only.
    async fn decrement(&self, account: &FlowAccount) {
        if account.occupancy == 0 {
            warn!(code = %account.code, "Occupancy already zero, skipping decrement");
            return;
        }

        let result = match self.config.occupancy_policy {
            OccupancyPolicy::BestEffort => self
                .accounts
                .set_occupancy(account.id, account.occupancy - 1)
                .await
                .map(|_| ()),
            OccupancyPolicy::Strict => self.decrement_cas(account).await,
        };

        if let Err(e) = result {
            warn!(
                code = %account.code,
                error = %e,
                "Occupancy decrement failed"
            );
        }
    }

    async fn decrement_cas(&self, account: &FlowAccount) -> Result<(), AppError> {
        let mut current = account.occupancy;
        for _ in 0..self.config.max_cas_attempts {
            if current == 0 {
                return Ok(());
            }
            if self
                .accounts
                .compare_and_set_occupancy(account.id, current, current - 1)
                .await?
                .is_some()
            {
                return Ok(());
            }
            current = self
                .accounts
                .find_by_id(account.id)
                .await?
                .map(|a| a.occupancy)
                .unwrap_or(0);
        }
        Err(AppError::conflict(format!(
            "Could not decrement occupancy of {} after {} attempts",
            account.code, self.config.max_cas_attempts
        )))
    }
}
