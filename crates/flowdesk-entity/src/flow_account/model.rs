//! Flow account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowdesk_core::types::id::FlowAccountId;

use super::code::AccountCode;
use super::credential::FlowCredential;
use super::status::AccountStatus;

/// Number of users one flow account can serve.
pub const FLOW_ACCOUNT_CAPACITY: u32 = 10;

/// A shared external account handed out to users by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAccount {
    /// Store-assigned identifier.
    pub id: FlowAccountId,
    /// Label, unique among active accounts.
    pub code: AccountCode,
    /// External login pair.
    #[serde(flatten)]
    pub credential: FlowCredential,
    /// Users currently holding this account's code.
    pub occupancy: u32,
    /// Lifecycle state.
    pub status: AccountStatus,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FlowAccount {
    /// Maximum occupancy of any account.
    pub fn capacity(&self) -> u32 {
        FLOW_ACCOUNT_CAPACITY
    }

    /// Check whether the account is active.
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Check whether the account is at or above capacity.
    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity()
    }

    /// Check whether the account can take another user.
    pub fn has_free_slot(&self) -> bool {
        self.is_active() && !self.is_full()
    }

    /// Free slots left, zero when full or overshot.
    pub fn free_slots(&self) -> u32 {
        self.capacity().saturating_sub(self.occupancy)
    }
}
