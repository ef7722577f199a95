//! Flow account pool: selection, allocation, and counter reconciliation.

pub mod allocator;
pub mod reconciler;
pub mod selection;

pub use allocator::{Assignment, PoolAllocator};
pub use reconciler::{AccountDrift, OccupancyReconciler, ReconcileReport};
pub use selection::{next_code, select_least_loaded};
