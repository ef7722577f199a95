//! Core type definitions used across the FlowDesk workspace.

pub mod filter;
pub mod id;
pub mod query;
pub mod sorting;

pub use filter::{FilterField, FilterOp};
pub use id::*;
pub use query::Query;
pub use sorting::{SortDirection, SortField};
