//! In-memory record store with optional JSON snapshot persistence.

pub mod compare;
pub mod snapshot;
pub mod store;

pub use snapshot::Snapshot;
pub use store::{MemoryRecordStore, UniqueIndex};
