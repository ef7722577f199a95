//! Flow account repository implementation.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use flowdesk_core::result::AppResult;
use flowdesk_core::traits::{Record, RecordStore, Table};
use flowdesk_core::types::id::FlowAccountId;
use flowdesk_core::types::{Query, SortField};
use flowdesk_entity::flow_account::{
    AccountCode, AccountStatus, FLOW_ACCOUNT_CAPACITY, FlowAccount, FlowCredential,
};

use super::{decode, decode_all, encode, read_error, write_error};

/// Repository for flow account reads and field-level updates.
#[derive(Clone)]
pub struct FlowAccountRepository {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for FlowAccountRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowAccountRepository").finish()
    }
}

impl FlowAccountRepository {
    /// Create a new flow account repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find an account by primary key, whatever its status.
    pub async fn find_by_id(&self, id: FlowAccountId) -> AppResult<Option<FlowAccount>> {
        self.store
            .get_by_id(Table::FlowAccounts, id.into_uuid())
            .await
            .map_err(read_error("Failed to find flow account by id"))?
            .map(decode::<FlowAccount>)
            .transpose()
    }

    /// List every account, active or not, in insertion order.
    pub async fn find_all(&self) -> AppResult<Vec<FlowAccount>> {
        let records = self
            .store
            .scan(Table::FlowAccounts)
            .await
            .map_err(read_error("Failed to list flow accounts"))?;
        decode_all(records)
    }

    /// List active accounts.
    pub async fn find_active(&self) -> AppResult<Vec<FlowAccount>> {
        let records = self
            .store
            .filter_equals(
                Table::FlowAccounts,
                "status",
                Value::from(AccountStatus::Active.as_str()),
            )
            .await
            .map_err(read_error("Failed to list active flow accounts"))?;
        decode_all(records)
    }

    /// Find the active account carrying `code`.
    pub async fn find_active_by_code(&self, code: &AccountCode) -> AppResult<Option<FlowAccount>> {
        let query = Query::new()
            .eq("code", code.as_str())
            .eq("status", AccountStatus::Active.as_str())
            .limit(1);
        let records = self
            .store
            .query(Table::FlowAccounts, &query)
            .await
            .map_err(read_error("Failed to find flow account by code"))?;
        records.into_iter().next().map(decode::<FlowAccount>).transpose()
    }

    /// Find the active account registered under `email`.
    pub async fn find_active_by_email(&self, email: &str) -> AppResult<Option<FlowAccount>> {
        let query = Query::new()
            .eq("email", email)
            .eq("status", AccountStatus::Active.as_str())
            .limit(1);
        let records = self
            .store
            .query(Table::FlowAccounts, &query)
            .await
            .map_err(read_error("Failed to find flow account by email"))?;
        records.into_iter().next().map(decode::<FlowAccount>).transpose()
    }

    /// Active accounts below capacity, least occupied first, ties by code.
    pub async fn find_available(&self) -> AppResult<Vec<FlowAccount>> {
        let query = Query::new()
            .eq("status", AccountStatus::Active.as_str())
            .lt("occupancy", FLOW_ACCOUNT_CAPACITY)
            .order_by(SortField::asc("occupancy"))
            .order_by(SortField::asc("code"));
        let records = self
            .store
            .query(Table::FlowAccounts, &query)
            .await
            .map_err(read_error("Failed to list available flow accounts"))?;
        decode_all(records)
    }

    /// Insert a new active account with zero occupancy.
    pub async fn create(
        &self,
        code: &AccountCode,
        credential: &FlowCredential,
    ) -> AppResult<FlowAccount> {
        let now = Utc::now();
        let fields = encode(&json!({
            "code": code,
            "email": credential.email,
            "secret": credential.secret,
            "occupancy": 0,
            "status": AccountStatus::Active,
            "created_at": now,
            "updated_at": now,
        }))?;

        let record = self
            .store
            .insert(Table::FlowAccounts, fields)
            .await
            .map_err(write_error("Failed to create flow account"))?;
        decode(record)
    }

    /// Overwrite the occupancy counter.
    pub async fn set_occupancy(&self, id: FlowAccountId, occupancy: u32) -> AppResult<FlowAccount> {
        let fields = encode(&json!({ "occupancy": occupancy }))?;
        self.update_fields(id, fields, "Failed to update occupancy")
            .await
    }

    /// Swap the occupancy counter from `expected` to `new`.
    ///
    /// Returns `Ok(None)` if another writer changed the counter first.
    pub async fn compare_and_set_occupancy(
        &self,
        id: FlowAccountId,
        expected: u32,
        new: u32,
    ) -> AppResult<Option<FlowAccount>> {
        let mut fields = encode(&json!({ "occupancy": new }))?;
        fields.insert("updated_at".to_string(), json!(Utc::now()));
        self.store
            .update_if(
                Table::FlowAccounts,
                id.into_uuid(),
                "occupancy",
                &Value::from(expected),
                fields,
            )
            .await
            .map_err(write_error("Failed to update occupancy"))?
            .map(decode::<FlowAccount>)
            .transpose()
    }

    /// Update the email, the secret, and the status; `None` leaves a field as is.
    pub async fn update(
        &self,
        id: FlowAccountId,
        email: Option<&str>,
        secret: Option<&str>,
        status: Option<AccountStatus>,
    ) -> AppResult<FlowAccount> {
        let mut fields = Record::new();
        if let Some(email) = email {
            fields.insert("email".to_string(), json!(email));
        }
        if let Some(secret) = secret {
            fields.insert("secret".to_string(), json!(secret));
        }
        if let Some(status) = status {
            fields.insert("status".to_string(), json!(status));
        }
        self.update_fields(id, fields, "Failed to update flow account")
            .await
    }

    /// Flip the account status.
    pub async fn set_status(
        &self,
        id: FlowAccountId,
        status: AccountStatus,
    ) -> AppResult<FlowAccount> {
        let fields = encode(&json!({ "status": status }))?;
        self.update_fields(id, fields, "Failed to update flow account status")
            .await
    }

    async fn update_fields(
        &self,
        id: FlowAccountId,
        mut fields: Record,
        context: &str,
    ) -> AppResult<FlowAccount> {
        fields.insert("updated_at".to_string(), json!(Utc::now()));
        let record = self
            .store
            .update(Table::FlowAccounts, id.into_uuid(), fields)
            .await
            .map_err(write_error(context))?;
        decode(record)
    }
}
