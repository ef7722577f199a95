//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use flowdesk_core::config::{AppConfig, OccupancyPolicy};
use flowdesk_core::error::AppError;
use flowdesk_core::result::AppResult;
use flowdesk_core::traits::{Record, RecordStore, Table};
use flowdesk_core::types::Query;
use flowdesk_database::MemoryRecordStore;
use flowdesk_entity::flow_account::{AccountCode, FlowAccount, FlowCredential};
use flowdesk_entity::user::{NewUser, User, UserStatus};
use flowdesk_service::AppServices;

/// Memory store that can be told to reject writes touching a given field,
/// or scans and queries of a table.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryRecordStore,
    failing: Mutex<HashSet<(Table, String)>>,
    failing_reads: Mutex<HashSet<Table>>,
}

impl FailingStore {
    /// Wrap a memory store.
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            failing: Mutex::default(),
            failing_reads: Mutex::default(),
        }
    }

    /// Reject every later scan or query of `table`. Lookups by id still work.
    pub fn fail_reads(&self, table: Table) {
        self.failing_reads.lock().unwrap().insert(table);
    }

    fn check_read(&self, table: Table) -> AppResult<()> {
        if self.failing_reads.lock().unwrap().contains(&table) {
            return Err(AppError::database(format!("Injected read failure on {table}")));
        }
        Ok(())
    }

    /// Reject every later write to `table` that sets `field`.
    pub fn fail_writes(&self, table: Table, field: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert((table, field.to_string()));
    }

    /// Stop rejecting reads and writes.
    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        self.failing_reads.lock().unwrap().clear();
    }

    fn check(&self, table: Table, fields: &Record) -> AppResult<()> {
        let failing = self.failing.lock().unwrap();
        match fields
            .keys()
            .find(|k| failing.contains(&(table, (*k).clone())))
        {
            Some(field) => Err(AppError::database(format!(
                "Injected write failure on {table}.{field}"
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn get_by_id(&self, table: Table, id: Uuid) -> AppResult<Option<Record>> {
        self.inner.get_by_id(table, id).await
    }

    async fn query(&self, table: Table, query: &Query) -> AppResult<Vec<Record>> {
        self.check_read(table)?;
        self.inner.query(table, query).await
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<Record>> {
        self.check_read(table)?;
        self.inner.scan(table).await
    }

    async fn update(&self, table: Table, id: Uuid, fields: Record) -> AppResult<Record> {
        self.check(table, &fields)?;
        self.inner.update(table, id, fields).await
    }

    async fn update_if(
        &self,
        table: Table,
        id: Uuid,
        guard_field: &str,
        expected: &Value,
        fields: Record,
    ) -> AppResult<Option<Record>> {
        self.check(table, &fields)?;
        self.inner
            .update_if(table, id, guard_field, expected, fields)
            .await
    }

    async fn insert(&self, table: Table, fields: Record) -> AppResult<Record> {
        self.check(table, &fields)?;
        self.inner.insert(table, fields).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppResult<Record> {
        self.inner.delete(table, id).await
    }
}

/// Test application context
pub struct TestApp {
    /// Store with failure injection
    pub store: Arc<FailingStore>,
    /// Wired services
    pub services: AppServices,
}

impl TestApp {
    /// Create a test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application using the given occupancy policy
    pub fn with_policy(policy: OccupancyPolicy) -> Self {
        let mut config = AppConfig::default();
        config.pool.occupancy_policy = policy;
        Self::with_config(config)
    }

    /// Create a test application from a config
    pub fn with_config(config: AppConfig) -> Self {
        let inner = MemoryRecordStore::with_unique_indexes(AppServices::unique_indexes(&config));
        let store = Arc::new(FailingStore::new(inner));
        let services = AppServices::new(config, store.clone());
        Self { store, services }
    }

    /// Insert an active account with the given occupancy
    pub async fn seed_account(&self, code: &str, occupancy: u32) -> FlowAccount {
        let account = self
            .services
            .account_repo
            .create(
                &AccountCode::from(code),
                &FlowCredential::new(&format!("{}@pool.test", code.to_lowercase()), "secret"),
            )
            .await
            .expect("Failed to seed account");
        self.services
            .account_repo
            .set_occupancy(account.id, occupancy)
            .await
            .expect("Failed to seed occupancy")
    }

    /// Insert a user
    pub async fn seed_user(&self, username: &str, status: UserStatus) -> User {
        self.services
            .user_repo
            .create(&NewUser {
                username: username.to_string(),
                email: None,
                status,
            })
            .await
            .expect("Failed to seed user")
    }

    /// Insert a user holding a personal token
    pub async fn seed_token_holder(&self, username: &str, token: &str) -> User {
        let user = self.seed_user(username, UserStatus::Lifetime).await;
        self.services
            .user_repo
            .set_personal_token(user.id, Some(token))
            .await
            .expect("Failed to seed token")
    }

    /// Reload a user
    pub async fn user(&self, user: &User) -> User {
        self.services
            .users
            .get_user(user.id)
            .await
            .expect("User vanished")
    }

    /// Reload an account
    pub async fn account(&self, account: &FlowAccount) -> FlowAccount {
        self.services
            .accounts
            .get_account(account.id)
            .await
            .expect("Account vanished")
    }
}
