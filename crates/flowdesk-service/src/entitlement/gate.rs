//! Upgrade gate for the personal-token ceiling.
//!
//! A user moving from an unpaid status to a paid one needs a personal token
//! slot. Only a limited number of users may hold a token; a user who
//! already holds one is never blocked.

use serde::Serialize;

use flowdesk_core::config::EntitlementConfig;
use flowdesk_core::error::AppError;
use flowdesk_entity::user::{User, UserStatus};

/// Why an upgrade was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    /// The authorized-token ceiling is reached and the user holds no token.
    TokenCeilingReached,
}

/// Outcome of [`EntitlementGate::can_upgrade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpgradeDecision {
    /// The status change may proceed.
    Allow,
    /// The status change is refused.
    Deny(DenyReason),
}

impl UpgradeDecision {
    /// Returns `true` for [`UpgradeDecision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Pure decision function over the user, the target status, and the
/// current authorized-token count.
#[derive(Debug, Clone, Copy)]
pub struct EntitlementGate {
    /// Number of token holders at which upgrades of token-less users stop.
    limit: usize,
}

impl Default for EntitlementGate {
    fn default() -> Self {
        Self::new(&EntitlementConfig::default())
    }
}

impl EntitlementGate {
    /// Creates a gate from configuration.
    pub fn new(config: &EntitlementConfig) -> Self {
        Self {
            limit: config.authorized_token_limit,
        }
    }

    /// Returns the configured ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether moving from `current` to `target` counts as an upgrade.
    pub fn is_upgrade(current: UserStatus, target: UserStatus) -> bool {
        target.is_paid() && !current.is_paid()
    }

    /// Decides whether `user` may move to `target`.
    ///
    /// `authorized_count` must be computed from the current user set right
    /// before the call.
    pub fn can_upgrade(
        &self,
        user: &User,
        target: UserStatus,
        authorized_count: usize,
    ) -> UpgradeDecision {
        if Self::is_upgrade(user.status, target)
            && !user.has_token()
            && authorized_count >= self.limit
        {
            return UpgradeDecision::Deny(DenyReason::TokenCeilingReached);
        }
        UpgradeDecision::Allow
    }

    /// Same as [`EntitlementGate::can_upgrade`], mapped to an error on deny.
    pub fn check(
        &self,
        user: &User,
        target: UserStatus,
        authorized_count: usize,
    ) -> Result<(), AppError> {
        match self.can_upgrade(user, target, authorized_count) {
            UpgradeDecision::Allow => Ok(()),
            UpgradeDecision::Deny(DenyReason::TokenCeilingReached) => {
                Err(AppError::token_ceiling_reached(self.limit))
            }
        }
    }
}
