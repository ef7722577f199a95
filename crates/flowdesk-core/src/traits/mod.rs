//! Core traits defined in `flowdesk-core` and implemented by other crates.

pub mod record_store;
pub mod service;

pub use record_store::{Record, RecordStore, Table};
pub use service::Service;
