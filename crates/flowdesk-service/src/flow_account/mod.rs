//! Flow account administration.

pub mod service;

pub use service::{AccountUpdate, FlowAccountService};
