//! Aggregate view of the flow account pool.

use serde::{Deserialize, Serialize};

use super::model::FlowAccount;

/// Live status of the flow account pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Number of active accounts.
    pub active_accounts: u32,
    /// Summed capacity of active accounts.
    pub total_capacity: u32,
    /// Summed occupancy of active accounts.
    pub total_occupancy: u32,
    /// Free slots across active accounts.
    pub available: u32,
    /// Active accounts with no free slot.
    pub full_accounts: u32,
    /// Occupancy as a percentage of capacity.
    pub usage_percent: f64,
}

impl PoolStatus {
    /// Summarize the active accounts among `accounts`.
    pub fn from_accounts(accounts: &[FlowAccount]) -> Self {
        let active: Vec<&FlowAccount> = accounts.iter().filter(|a| a.is_active()).collect();
        let total_capacity: u32 = active.iter().map(|a| a.capacity()).sum();
        let total_occupancy: u32 = active.iter().map(|a| a.occupancy).sum();
        let available: u32 = active.iter().map(|a| a.free_slots()).sum();
        let full_accounts = active.iter().filter(|a| a.is_full()).count() as u32;
        let usage_percent = if total_capacity == 0 {
            0.0
        } else {
            total_occupancy as f64 * 100.0 / total_capacity as f64
        };

        Self {
            active_accounts: active.len() as u32,
            total_capacity,
            total_occupancy,
            available,
            full_accounts,
            usage_percent,
        }
    }

    /// Check whether no active account can take another user.
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }
}
