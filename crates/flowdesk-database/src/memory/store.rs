//! In-memory record store using a Tokio lock for single-process deployments.
//!
//! Every trait call takes the lock once, so a single call is atomic but a
//! sequence of calls is not. That matches the external store the engine is
//! written against.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use flowdesk_core::error::AppError;
use flowdesk_core::result::AppResult;
use flowdesk_core::traits::{Record, RecordStore, Table};
use flowdesk_core::types::Query;

use super::compare::{compare_values, evaluate};
use super::snapshot::Snapshot;

/// A uniqueness constraint on one field of one table.
///
/// `null` values never conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    /// Constrained table.
    pub table: Table,
    /// Constrained field.
    pub field: String,
}

impl UniqueIndex {
    /// Create a unique index.
    pub fn new(table: Table, field: impl Into<String>) -> Self {
        Self {
            table,
            field: field.into(),
        }
    }
}

/// Rows per table, kept in insertion order.
#[derive(Debug, Default)]
struct InnerState {
    tables: BTreeMap<Table, Vec<Record>>,
}

impl InnerState {
    fn rows(&self, table: Table) -> &[Record] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Record> {
        self.tables.entry(table).or_default()
    }

    fn position(&self, table: Table, id: Uuid) -> Option<usize> {
        let id = Value::String(id.to_string());
        self.rows(table).iter().position(|r| r.get("id") == Some(&id))
    }
}

/// In-memory [`RecordStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    /// Protected table state.
    state: Arc<RwLock<InnerState>>,
    /// Uniqueness constraints checked on insert and update.
    unique: Arc<Vec<UniqueIndex>>,
}

impl MemoryRecordStore {
    /// Create an empty store without constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store enforcing the given unique indexes.
    pub fn with_unique_indexes(unique: Vec<UniqueIndex>) -> Self {
        Self {
            state: Arc::default(),
            unique: Arc::new(unique),
        }
    }

    /// Replace the store contents with a snapshot.
    pub async fn restore(&self, snapshot: Snapshot) {
        let mut state = self.state.write().await;
        state.tables.clear();
        state.tables.insert(Table::Users, snapshot.users);
        state.tables.insert(Table::FlowAccounts, snapshot.flow_accounts);
    }

    /// Capture the store contents.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        Snapshot {
            users: state.rows(Table::Users).to_vec(),
            flow_accounts: state.rows(Table::FlowAccounts).to_vec(),
        }
    }

    /// Load a snapshot file into the store. A missing file leaves it empty.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        match Snapshot::read(path).await? {
            Some(snapshot) => {
                info!(
                    path = %path.display(),
                    users = snapshot.users.len(),
                    flow_accounts = snapshot.flow_accounts.len(),
                    "Loaded store snapshot"
                );
                self.restore(snapshot).await;
            }
            None => debug!(path = %path.display(), "No snapshot found, starting empty"),
        }
        Ok(())
    }

    /// Write the store contents to a snapshot file.
    pub async fn save_file(&self, path: impl AsRef<Path>) -> AppResult<()> {
        self.snapshot().await.write(path.as_ref()).await
    }

    fn check_unique(
        &self,
        state: &InnerState,
        table: Table,
        skip_id: Option<&Value>,
        candidate: &Record,
    ) -> AppResult<()> {
        for index in self.unique.iter().filter(|i| i.table == table) {
            let Some(value) = candidate.get(&index.field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = state.rows(table).iter().any(|row| {
                row.get("id") != skip_id
                    && row
                        .get(&index.field)
                        .is_some_and(|other| compare_values(other, value) == Some(std::cmp::Ordering::Equal))
            });
            if clash {
                return Err(AppError::conflict(format!(
                    "Duplicate value for unique field {table}.{}",
                    index.field
                )));
            }
        }
        Ok(())
    }

    fn merge(
        &self,
        state: &mut InnerState,
        table: Table,
        pos: usize,
        fields: Record,
    ) -> AppResult<Record> {
        let mut merged = state.rows(table)[pos].clone();
        let id = merged.get("id").cloned();
        for (key, value) in fields {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        self.check_unique(state, table, id.as_ref(), &merged)?;
        state.rows_mut(table)[pos] = merged.clone();
        Ok(merged)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_by_id(&self, table: Table, id: Uuid) -> AppResult<Option<Record>> {
        let state = self.state.read().await;
        Ok(state
            .position(table, id)
            .map(|pos| state.rows(table)[pos].clone()))
    }

    async fn query(&self, table: Table, query: &Query) -> AppResult<Vec<Record>> {
        let state = self.state.read().await;
        Ok(evaluate(state.rows(table).iter(), query))
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<Record>> {
        let state = self.state.read().await;
        Ok(state.rows(table).to_vec())
    }

    async fn update(&self, table: Table, id: Uuid, fields: Record) -> AppResult<Record> {
        let mut state = self.state.write().await;
        let pos = state
            .position(table, id)
            .ok_or_else(|| AppError::not_found(format!("No record {id} in {table}")))?;
        self.merge(&mut state, table, pos, fields)
    }

    async fn update_if(
        &self,
        table: Table,
        id: Uuid,
        guard_field: &str,
        expected: &Value,
        fields: Record,
    ) -> AppResult<Option<Record>> {
        let mut state = self.state.write().await;
        let pos = state
            .position(table, id)
            .ok_or_else(|| AppError::not_found(format!("No record {id} in {table}")))?;

        let current = state.rows(table)[pos]
            .get(guard_field)
            .cloned()
            .unwrap_or(Value::Null);
        if compare_values(&current, expected) != Some(std::cmp::Ordering::Equal) {
            debug!(%table, %id, guard_field, "Conditional update guard failed");
            return Ok(None);
        }

        self.merge(&mut state, table, pos, fields).map(Some)
    }

    async fn insert(&self, table: Table, mut fields: Record) -> AppResult<Record> {
        let mut state = self.state.write().await;
        fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        self.check_unique(&state, table, None, &fields)?;
        state.rows_mut(table).push(fields.clone());
        Ok(fields)
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppResult<Record> {
        let mut state = self.state.write().await;
        let pos = state
            .position(table, id)
            .ok_or_else(|| AppError::not_found(format!("No record {id} in {table}")))?;
        Ok(state.rows_mut(table).remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdesk_core::types::SortField;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn id_of(record: &Record) -> Uuid {
        record["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_get_returns_it() {
        let store = MemoryRecordStore::new();
        let inserted = store
            .insert(Table::FlowAccounts, rec(json!({"code": "E1", "occupancy": 0})))
            .await
            .unwrap();
        let id = id_of(&inserted);

        let fetched = store.get_by_id(Table::FlowAccounts, id).await.unwrap();
        assert_eq!(fetched, Some(inserted));
        assert!(store.get_by_id(Table::Users, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_keeps_id() {
        let store = MemoryRecordStore::new();
        let inserted = store
            .insert(Table::Users, rec(json!({"username": "a", "pool_code": null})))
            .await
            .unwrap();
        let id = id_of(&inserted);

        let updated = store
            .update(
                Table::Users,
                id,
                rec(json!({"pool_code": "E1", "id": "ignored"})),
            )
            .await
            .unwrap();
        assert_eq!(updated["pool_code"], json!("E1"));
        assert_eq!(updated["username"], json!("a"));
        assert_eq!(id_of(&updated), id);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store
            .update(Table::Users, Uuid::new_v4(), Record::new())
            .await
            .unwrap_err();
        assert!(err.is(flowdesk_core::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates_but_not_nulls() {
        let store = MemoryRecordStore::with_unique_indexes(vec![UniqueIndex::new(
            Table::Users,
            "personal_token",
        )]);
        let a = store
            .insert(Table::Users, rec(json!({"personal_token": "tok"})))
            .await
            .unwrap();
        let b = store
            .insert(Table::Users, rec(json!({"personal_token": null})))
            .await
            .unwrap();
        store
            .insert(Table::Users, rec(json!({"personal_token": null})))
            .await
            .unwrap();

        let err = store
            .update(Table::Users, id_of(&b), rec(json!({"personal_token": "tok"})))
            .await
            .unwrap_err();
        assert!(err.is(flowdesk_core::ErrorKind::Conflict));

        // Re-saving the holder's own value is not a clash.
        store
            .update(Table::Users, id_of(&a), rec(json!({"personal_token": "tok"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_if_checks_guard() {
        let store = MemoryRecordStore::new();
        let inserted = store
            .insert(Table::FlowAccounts, rec(json!({"occupancy": 3})))
            .await
            .unwrap();
        let id = id_of(&inserted);

        let stale = store
            .update_if(
                Table::FlowAccounts,
                id,
                "occupancy",
                &json!(2),
                rec(json!({"occupancy": 3})),
            )
            .await
            .unwrap();
        assert!(stale.is_none());

        let swapped = store
            .update_if(
                Table::FlowAccounts,
                id,
                "occupancy",
                &json!(3),
                rec(json!({"occupancy": 4})),
            )
            .await
            .unwrap();
        assert_eq!(swapped.unwrap()["occupancy"], json!(4));
    }

    #[tokio::test]
    async fn test_filter_less_than_orders_and_limits() {
        let store = MemoryRecordStore::new();
        for (code, occupancy) in [("E1", 10), ("E2", 4), ("E3", 7), ("E4", 4), ("E5", 9)] {
            store
                .insert(
                    Table::FlowAccounts,
                    rec(json!({"code": code, "occupancy": occupancy})),
                )
                .await
                .unwrap();
        }

        let below = store
            .filter_less_than(
                Table::FlowAccounts,
                "occupancy",
                json!(9),
                vec![SortField::asc("occupancy"), SortField::desc("code")],
                Some(2),
            )
            .await
            .unwrap();
        let codes: Vec<_> = below.iter().map(|r| r["code"].clone()).collect();
        assert_eq!(codes, vec![json!("E4"), json!("E2")]);

        let all = store
            .filter_less_than(
                Table::FlowAccounts,
                "occupancy",
                json!(9),
                vec![SortField::desc("occupancy")],
                None,
            )
            .await
            .unwrap();
        let codes: Vec<_> = all.iter().map(|r| r["code"].clone()).collect();
        assert_eq!(codes.len(), 3);
        assert_eq!(codes[0], json!("E3"));
    }

    #[tokio::test]
    async fn test_delete_frees_unique_value() {
        let store = MemoryRecordStore::with_unique_indexes(vec![UniqueIndex::new(
            Table::Users,
            "personal_token",
        )]);
        let a = store
            .insert(Table::Users, rec(json!({"personal_token": "tok"})))
            .await
            .unwrap();

        let removed = store.delete(Table::Users, id_of(&a)).await.unwrap();
        assert_eq!(removed, a);
        assert!(store.get_by_id(Table::Users, id_of(&a)).await.unwrap().is_none());
        store
            .insert(Table::Users, rec(json!({"personal_token": "tok"})))
            .await
            .unwrap();

        let err = store.delete(Table::Users, id_of(&a)).await.unwrap_err();
        assert!(err.is(flowdesk_core::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowdesk.json");

        let store = MemoryRecordStore::new();
        store
            .insert(Table::FlowAccounts, rec(json!({"code": "E1", "occupancy": 3})))
            .await
            .unwrap();
        store.save_file(&path).await.unwrap();

        let loaded = MemoryRecordStore::new();
        loaded.load_file(&path).await.unwrap();
        assert_eq!(
            loaded.scan(Table::FlowAccounts).await.unwrap(),
            store.scan(Table::FlowAccounts).await.unwrap()
        );

        let empty = MemoryRecordStore::new();
        empty.load_file(dir.path().join("absent.json")).await.unwrap();
        assert!(empty.scan(Table::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_through_restore() {
        let store = MemoryRecordStore::new();
        store
            .insert(Table::Users, rec(json!({"username": "a"})))
            .await
            .unwrap();
        let snapshot = store.snapshot().await;

        let other = MemoryRecordStore::new();
        other.restore(snapshot).await;
        assert_eq!(other.scan(Table::Users).await.unwrap().len(), 1);
        assert!(other.scan(Table::FlowAccounts).await.unwrap().is_empty());
    }
}
