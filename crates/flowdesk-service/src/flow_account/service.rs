//! Flow account administration: listing, creation, edits, and soft removal.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use flowdesk_core::error::AppError;
use flowdesk_core::traits::Service;
use flowdesk_core::types::id::FlowAccountId;
use flowdesk_database::repositories::FlowAccountRepository;
use flowdesk_entity::flow_account::{
    AccountCode, AccountStatus, FlowAccount, FlowCredential, PoolStatus,
};

use crate::pool::next_code;

/// Editable fields of a flow account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    /// New login email.
    pub email: Option<String>,
    /// New secret.
    pub secret: Option<String>,
    /// New status.
    pub status: Option<AccountStatus>,
}

/// Manages the pool of shared flow accounts.
#[derive(Debug, Clone)]
pub struct FlowAccountService {
    /// Flow account repository.
    accounts: Arc<FlowAccountRepository>,
}

impl Service for FlowAccountService {}

impl FlowAccountService {
    /// Creates a new flow account service.
    pub fn new(accounts: Arc<FlowAccountRepository>) -> Self {
        Self { accounts }
    }

    /// Lists every account, newest first.
    pub async fn list_accounts(&self) -> Result<Vec<FlowAccount>, AppError> {
        let mut accounts = self.accounts.find_all().await?;
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    /// Active accounts with a free slot, least occupied first.
    pub async fn available_accounts(&self) -> Result<Vec<FlowAccount>, AppError> {
        self.accounts.find_available().await
    }

    /// Proposes the code for the next account.
    pub async fn next_code(&self) -> Result<AccountCode, AppError> {
        let active = self.accounts.find_active().await?;
        Ok(next_code(&active))
    }

    /// Adds an active account with zero occupancy.
    ///
    /// Without an explicit `code` the next free code is used. Code and email
    /// must not clash with another active account.
    pub async fn add_account(
        &self,
        email: &str,
        secret: &str,
        code: Option<AccountCode>,
    ) -> Result<FlowAccount, AppError> {
        let credential = FlowCredential::new(email, secret);
        validate_credential(&credential)?;

        let code = match code {
            Some(code) if code.as_str().trim().is_empty() => {
                return Err(AppError::validation("Account code must not be blank"));
            }
            Some(code) if code.number().is_none() => {
                return Err(AppError::validation(format!(
                    "Invalid account code: '{code}' (expected E<n>)"
                )));
            }
            Some(code) => code,
            None => self.next_code().await?,
        };

        if self.accounts.find_active_by_code(&code).await?.is_some() {
            return Err(AppError::conflict(format!("Code {code} already exists")));
        }
        if self
            .accounts
            .find_active_by_email(&credential.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Email already exists in pool"));
        }

        let account = self.accounts.create(&code, &credential).await?;
        info!(
            account_id = %account.id,
            code = %account.code,
            email = %account.credential.email,
            "Flow account added"
        );
        Ok(account)
    }

    /// Edits an account's credential or status.
    ///
    /// Deactivation goes through the same rule as [`Self::remove_account`];
    /// reactivation is refused if another active account took the code.
    pub async fn update_account(
        &self,
        id: FlowAccountId,
        update: AccountUpdate,
    ) -> Result<FlowAccount, AppError> {
        let account = self.get_account(id).await?;

        let email = match update.email.as_deref() {
            Some(email) => {
                let credential = FlowCredential::new(email, account.credential.secret.as_str());
                validate_credential(&credential)?;
                if let Some(other) = self.accounts.find_active_by_email(&credential.email).await?
                    && other.id != id
                {
                    return Err(AppError::conflict("Email already exists in pool"));
                }
                Some(credential.email)
            }
            None => None,
        };

        if let Some(secret) = update.secret.as_deref()
            && secret.trim().is_empty()
        {
            return Err(AppError::validation("Secret must not be empty"));
        }

        match update.status {
            Some(AccountStatus::Inactive) if account.is_active() => {
                ensure_unoccupied(&account)?;
            }
            Some(AccountStatus::Active) if !account.is_active() => {
                if self.accounts.find_active_by_code(&account.code).await?.is_some() {
                    return Err(AppError::conflict(format!(
                        "Code {} already exists",
                        account.code
                    )));
                }
            }
            _ => {}
        }

        let updated = self
            .accounts
            .update(id, email.as_deref(), update.secret.as_deref(), update.status)
            .await?;
        info!(account_id = %id, code = %updated.code, status = %updated.status, "Flow account updated");
        Ok(updated)
    }

    /// Soft-removes an account by marking it inactive.
    ///
    /// Refused while any user still holds the account's code.
    pub async fn remove_account(&self, id: FlowAccountId) -> Result<FlowAccount, AppError> {
        let account = self.get_account(id).await?;
        ensure_unoccupied(&account)?;

        let removed = self
            .accounts
            .set_status(id, AccountStatus::Inactive)
            .await?;
        info!(account_id = %id, code = %removed.code, "Flow account removed");
        Ok(removed)
    }

    /// Gets an account by ID, whatever its status.
    pub async fn get_account(&self, id: FlowAccountId) -> Result<FlowAccount, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Flow account {id} not found")))
    }

    /// Finds the active account carrying `code`.
    pub async fn find_active_by_code(&self, code: &AccountCode) -> Result<FlowAccount, AppError> {
        self.accounts
            .find_active_by_code(code)
            .await?
            .ok_or_else(|| AppError::account_not_found(code.as_str()))
    }

    /// Resolves a user-entered code to the credential of its active account.
    pub async fn credential_for_code(&self, code: &str) -> Result<FlowCredential, AppError> {
        let code = code.trim();
        if code.len() < 2 {
            return Err(AppError::validation(format!("Invalid flow account code: '{code}'")));
        }
        let account = self.find_active_by_code(&AccountCode::from(code)).await?;
        Ok(account.credential)
    }

    /// Aggregate capacity figures over active accounts.
    pub async fn pool_status(&self) -> Result<PoolStatus, AppError> {
        let active = self.accounts.find_active().await?;
        Ok(PoolStatus::from_accounts(&active))
    }
}

fn validate_credential(credential: &FlowCredential) -> Result<(), AppError> {
    if !credential.email.contains('@') {
        return Err(AppError::validation(format!(
            "Invalid email: '{}'",
            credential.email
        )));
    }
    if credential.secret.trim().is_empty() {
        return Err(AppError::validation("Secret must not be empty"));
    }
    Ok(())
}

fn ensure_unoccupied(account: &FlowAccount) -> Result<(), AppError> {
    if account.occupancy > 0 {
        return Err(AppError::conflict(format!(
            "Cannot remove flow account {} with {} active users",
            account.code, account.occupancy
        )));
    }
    Ok(())
}
