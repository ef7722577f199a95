//! Pure selection rules over a set of flow accounts.

use std::collections::BTreeSet;

use flowdesk_core::error::AppError;
use flowdesk_entity::flow_account::{AccountCode, FlowAccount};

/// Propose the code for a new account.
///
/// Returns the smallest positive `n` such that no active account is coded
/// `E<n>`, so codes freed by removal are reused before new ones are minted.
/// Codes not of the form `E<n>` are ignored.
pub fn next_code(existing: &[FlowAccount]) -> AccountCode {
    let used: BTreeSet<u32> = existing
        .iter()
        .filter(|a| a.is_active())
        .filter_map(|a| a.code.number())
        .collect();

    let mut n = 1;
    while used.contains(&n) {
        n += 1;
    }
    AccountCode::from_number(n)
}

/// Pick the active account with a free slot and the lowest occupancy.
///
/// Ties go to the lexicographically smaller code.
pub fn select_least_loaded(accounts: &[FlowAccount]) -> Result<&FlowAccount, AppError> {
    accounts
        .iter()
        .filter(|a| a.has_free_slot())
        .min_by(|a, b| {
            a.occupancy
                .cmp(&b.occupancy)
                .then_with(|| a.code.cmp(&b.code))
        })
        .ok_or_else(AppError::no_capacity)
}
