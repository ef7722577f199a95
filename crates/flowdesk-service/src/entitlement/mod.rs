//! Entitlement checks for status changes.

pub mod gate;

pub use gate::{DenyReason, EntitlementGate, UpgradeDecision};
