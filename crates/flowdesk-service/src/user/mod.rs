//! User services: directory reads and the save-changes coordinator.

pub mod coordinator;
pub mod directory;

pub use coordinator::{Change, SaveOutcome, StatusRequest, TokenRequest, UserMutationCoordinator};
pub use directory::UserDirectoryService;
