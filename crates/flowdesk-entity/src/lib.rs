//! # flowdesk-entity
//!
//! Domain entity models for FlowDesk. Every struct in this crate represents
//! a record of the `users` or `flow_accounts` table, or a value object
//! derived from them. All entities derive `Debug`, `Clone`, `Serialize`
//! and `Deserialize`; records travel through the store as JSON objects.

pub mod flow_account;
pub mod user;
