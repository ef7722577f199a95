//! # flowdesk-database
//!
//! Record store implementations and the typed repositories that translate
//! between store records and FlowDesk entities.

pub mod memory;
pub mod repositories;

pub use memory::{MemoryRecordStore, UniqueIndex};
pub use repositories::{FlowAccountRepository, UserRepository};
