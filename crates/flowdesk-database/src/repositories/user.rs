//! User repository implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use flowdesk_core::result::AppResult;
use flowdesk_core::traits::{Record, RecordStore, Table};
use flowdesk_core::types::id::UserId;
use flowdesk_entity::flow_account::AccountCode;
use flowdesk_entity::user::{NewUser, User, UserStatus};

use super::{decode, decode_all, encode, read_error, write_error};

/// Repository for user reads and field-level updates.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRepository").finish()
    }
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.store
            .get_by_id(Table::Users, id.into_uuid())
            .await
            .map_err(read_error("Failed to find user by id"))?
            .map(decode::<User>)
            .transpose()
    }

    /// List every user in insertion order.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        let records = self
            .store
            .scan(Table::Users)
            .await
            .map_err(read_error("Failed to list users"))?;
        decode_all(records)
    }

    /// List users holding the given pool code.
    pub async fn find_by_pool_code(&self, code: &AccountCode) -> AppResult<Vec<User>> {
        let records = self
            .store
            .filter_equals(Table::Users, "pool_code", Value::from(code.as_str()))
            .await
            .map_err(read_error("Failed to list users by pool code"))?;
        decode_all(records)
    }

    /// Count users holding a non-blank personal token.
    ///
    /// Always reads the current user set; the result is never cached.
    pub async fn count_with_token(&self) -> AppResult<usize> {
        Ok(self
            .find_all()
            .await?
            .iter()
            .filter(|u| u.has_token())
            .count())
    }

    /// Insert a new user.
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let now = Utc::now();
        let fields = encode(&json!({
            "username": new_user.username,
            "email": new_user.email,
            "status": new_user.status,
            "subscription_expiry": null,
            "personal_token": null,
            "pool_code": null,
            "created_at": now,
            "updated_at": now,
        }))?;

        let record = self
            .store
            .insert(Table::Users, fields)
            .await
            .map_err(write_error("Failed to create user"))?;
        decode(record)
    }

    /// Point the user at a flow account code, or clear the pointer.
    pub async fn set_pool_code(&self, id: UserId, code: Option<&AccountCode>) -> AppResult<User> {
        let fields = encode(&json!({ "pool_code": code }))?;
        self.update_fields(id, fields, "Failed to update user pool code")
            .await
    }

    /// Write a new status together with its subscription expiry.
    pub async fn set_status(
        &self,
        id: UserId,
        status: UserStatus,
        subscription_expiry: Option<DateTime<Utc>>,
    ) -> AppResult<User> {
        let fields = encode(&json!({
            "status": status,
            "subscription_expiry": subscription_expiry,
        }))?;
        self.update_fields(id, fields, "Failed to update user status")
            .await
    }

    /// Write or clear the personal token.
    pub async fn set_personal_token(&self, id: UserId, token: Option<&str>) -> AppResult<User> {
        let fields = encode(&json!({ "personal_token": token }))?;
        self.update_fields(id, fields, "Failed to update personal token")
            .await
    }

    /// Delete a user record.
    pub async fn delete(&self, id: UserId) -> AppResult<User> {
        let record = self
            .store
            .delete(Table::Users, id.into_uuid())
            .await
            .map_err(write_error("Failed to delete user"))?;
        decode(record)
    }

    async fn update_fields(&self, id: UserId, mut fields: Record, context: &str) -> AppResult<User> {
        fields.insert("updated_at".to_string(), json!(Utc::now()));
        let record = self
            .store
            .update(Table::Users, id.into_uuid(), fields)
            .await
            .map_err(write_error(context))?;
        decode(record)
    }
}
