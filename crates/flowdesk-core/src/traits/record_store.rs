//! Generic record store contract consumed by the allocation engine.
//!
//! The engine never talks to a concrete database. It reads and writes
//! field-level records in two tables through this trait, which keeps the
//! backing store an external collaborator.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::query::Query;
use crate::types::sorting::SortField;

/// A stored row: field name to JSON value. Always carries an `id` field.
pub type Record = serde_json::Map<String, Value>;

/// The tables the engine touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Console users.
    Users,
    /// Shared flow accounts.
    FlowAccounts,
}

impl Table {
    /// Return the table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::FlowAccounts => "flow_accounts",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key/filter/update interface over the `users` and `flow_accounts` tables.
///
/// Implementations provide no cross-call locking. The only conditional write
/// is [`RecordStore::update_if`], a single-record compare-and-swap.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Fetch a record by primary key. `Ok(None)` means not found.
    async fn get_by_id(&self, table: Table, id: Uuid) -> AppResult<Option<Record>>;

    /// Return the records matching a query.
    async fn query(&self, table: Table, query: &Query) -> AppResult<Vec<Record>>;

    /// Return every record of a table in insertion order.
    async fn scan(&self, table: Table) -> AppResult<Vec<Record>>;

    /// Merge `fields` into an existing record and return the updated record.
    ///
    /// Fails with `NotFound` if no record has the given id.
    async fn update(&self, table: Table, id: Uuid, fields: Record) -> AppResult<Record>;

    /// Merge `fields` only if `guard_field` currently equals `expected`.
    ///
    /// Returns `Ok(None)` when the guard does not hold.
    async fn update_if(
        &self,
        table: Table,
        id: Uuid,
        guard_field: &str,
        expected: &Value,
        fields: Record,
    ) -> AppResult<Option<Record>>;

    /// Insert a new record. The store assigns the `id`.
    async fn insert(&self, table: Table, fields: Record) -> AppResult<Record>;

    /// Remove a record and return it.
    ///
    /// Fails with `NotFound` if no record has the given id.
    async fn delete(&self, table: Table, id: Uuid) -> AppResult<Record>;

    /// Records whose `field` equals `value`.
    async fn filter_equals(&self, table: Table, field: &str, value: Value) -> AppResult<Vec<Record>> {
        self.query(table, &Query::new().eq(field, value)).await
    }

    /// Records whose `field` is below `value`, ordered and limited.
    async fn filter_less_than(
        &self,
        table: Table,
        field: &str,
        value: Value,
        order_by: Vec<SortField>,
        limit: Option<usize>,
    ) -> AppResult<Vec<Record>> {
        let query = Query {
            filters: vec![crate::types::filter::FilterField::lt(field, value)],
            order_by,
            limit,
        };
        self.query(table, &query).await
    }
}
