//! "Save changes" for a user: a status update and a token update applied
//! concurrently and independently.
//!
//! Neither sub-operation waits for or rolls back the other. Every failure is
//! collected into the outcome, so a rejected token never hides a status
//! change that did go through.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use flowdesk_core::error::AppError;
use flowdesk_core::traits::Service;
use flowdesk_database::repositories::UserRepository;
use flowdesk_entity::user::{SubscriptionDuration, User, UserStatus};

use crate::entitlement::EntitlementGate;

/// Requested status and the duration selected next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest {
    /// Selected status.
    pub status: UserStatus,
    /// Selected duration. `Lifetime` forces the lifetime status.
    pub duration: SubscriptionDuration,
}

impl StatusRequest {
    /// The status that will actually be written.
    pub fn effective_status(&self) -> UserStatus {
        if self.duration.is_lifetime() {
            UserStatus::Lifetime
        } else {
            self.status
        }
    }
}

/// Requested personal token. Surrounding whitespace is ignored and an
/// empty value clears the token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequest {
    /// Raw token input.
    pub token: String,
}

impl TokenRequest {
    /// Creates a token request.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// What a sub-operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Change {
    /// A write went through.
    Applied,
    /// Nothing to write.
    Unchanged,
    /// The sub-operation failed.
    Failed,
}

/// Aggregate result of [`UserMutationCoordinator::save_changes`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// `true` when no sub-operation failed.
    pub success: bool,
    /// Every failure, status first.
    pub errors: Vec<AppError>,
    /// Result of the status sub-operation.
    pub status: Change,
    /// Result of the token sub-operation.
    pub token: Change,
}

impl SaveOutcome {
    fn from_results(
        status: Result<Change, AppError>,
        token: Result<Change, AppError>,
    ) -> Self {
        let mut errors = Vec::new();
        let mut settle = |result: Result<Change, AppError>| match result {
            Ok(change) => change,
            Err(e) => {
                errors.push(e);
                Change::Failed
            }
        };
        let status = settle(status);
        let token = settle(token);
        Self {
            success: errors.is_empty(),
            errors,
            status,
            token,
        }
    }

    /// Converts to a result, aggregating failures into `PARTIAL_FAILURE`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::partial(self.errors))
        }
    }
}

/// Applies a user's status and token edits.
#[derive(Debug, Clone)]
pub struct UserMutationCoordinator {
    /// User repository.
    users: Arc<UserRepository>,
    /// Upgrade gate.
    gate: EntitlementGate,
}

impl Service for UserMutationCoordinator {}

impl UserMutationCoordinator {
    /// Creates a new coordinator.
    pub fn new(users: Arc<UserRepository>, gate: EntitlementGate) -> Self {
        Self { users, gate }
    }

    /// Applies the status and token requests concurrently.
    ///
    /// `user` is the state the edits were made against.
    pub async fn save_changes(
        &self,
        user: &User,
        status: &StatusRequest,
        token: &TokenRequest,
    ) -> SaveOutcome {
        let (status_result, token_result) =
            tokio::join!(self.apply_status(user, status), self.apply_token(user, token));

        let outcome = SaveOutcome::from_results(status_result, token_result);
        if outcome.success {
            info!(
                user_id = %user.id,
                status = ?outcome.status,
                token = ?outcome.token,
                "User changes saved"
            );
        } else {
            for e in &outcome.errors {
                warn!(user_id = %user.id, error = %e, "User change failed");
            }
        }
        outcome
    }

    async fn apply_status(&self, user: &User, req: &StatusRequest) -> Result<Change, AppError> {
        let target = req.effective_status();

        if EntitlementGate::is_upgrade(user.status, target) && !user.has_token() {
            let authorized = self.users.count_with_token().await?;
            self.gate.check(user, target, authorized)?;
        }

        if target == user.status && !req.duration.is_lifetime() {
            return Ok(Change::Unchanged);
        }

        let expiry = match target {
            UserStatus::Subscription => req.duration.expiry_from(Utc::now()),
            _ => None,
        };

        self.users.set_status(user.id, target, expiry).await?;
        info!(
            user_id = %user.id,
            from = %user.status,
            to = %target,
            expiry = ?expiry,
            "User status updated"
        );
        Ok(Change::Applied)
    }

    async fn apply_token(&self, user: &User, req: &TokenRequest) -> Result<Change, AppError> {
        let token = req.token.trim();
        if token == user.personal_token.as_deref().unwrap_or("") {
            return Ok(Change::Unchanged);
        }

        let value = (!token.is_empty()).then_some(token);
        self.users.set_personal_token(user.id, value).await?;
        info!(user_id = %user.id, cleared = value.is_none(), "Personal token updated");
        Ok(Change::Applied)
    }
}
