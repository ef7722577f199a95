//! # flowdesk-service
//!
//! Business logic for the FlowDesk admin console: the flow account pool
//! allocator, the entitlement gate, and the coordinator that applies a
//! user's "save changes" as independent sub-operations.
//!
//! Services follow constructor injection; all dependencies are provided at
//! construction time via `Arc` references.

pub mod entitlement;
pub mod flow_account;
pub mod pool;
pub mod state;
pub mod user;

pub use entitlement::{EntitlementGate, UpgradeDecision};
pub use flow_account::FlowAccountService;
pub use pool::{Assignment, OccupancyReconciler, PoolAllocator, ReconcileReport};
pub use state::AppServices;
pub use user::{SaveOutcome, StatusRequest, TokenRequest, UserDirectoryService, UserMutationCoordinator};
