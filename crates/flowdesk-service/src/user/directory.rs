//! User directory: create, look up, list, and remove users.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use flowdesk_core::error::{AppError, ErrorKind};
use flowdesk_core::traits::Service;
use flowdesk_core::types::id::UserId;
use flowdesk_database::repositories::UserRepository;
use flowdesk_entity::user::{NewUser, User};

use crate::pool::PoolAllocator;

/// Read, create, and delete access to users.
#[derive(Debug, Clone)]
pub struct UserDirectoryService {
    /// User repository.
    users: Arc<UserRepository>,
    /// Releases a removed user's flow account.
    allocator: Arc<PoolAllocator>,
}

impl Service for UserDirectoryService {}

impl UserDirectoryService {
    /// Creates a new user directory service.
    pub fn new(users: Arc<UserRepository>, allocator: Arc<PoolAllocator>) -> Self {
        Self { users, allocator }
    }

    /// Creates a user after validating the username and email.
    pub async fn add_user(&self, mut new_user: NewUser) -> Result<User, AppError> {
        new_user.username = new_user.username.trim().to_string();
        if new_user.username.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }

        new_user.email = match new_user.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(email) if !email.contains('@') => {
                return Err(AppError::validation(format!("Invalid email: '{email}'")));
            }
            Some(email) => Some(email.to_lowercase()),
        };

        let user = self.users.create(&new_user).await?;
        info!(user_id = %user.id, username = %user.username, status = %user.status, "User created");
        Ok(user)
    }

    /// Gets a single user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    /// Lists every user, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.users.find_all().await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Subscribers whose expiry has passed at `now`, newest first.
    pub async fn expired_subscriptions(&self, now: DateTime<Utc>) -> Result<Vec<User>, AppError> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.is_subscription_expired(now))
            .collect())
    }

    /// Number of users currently holding a personal token.
    pub async fn authorized_token_count(&self) -> Result<usize, AppError> {
        self.users.count_with_token().await
    }

    /// Deletes a user.
    ///
    /// A held flow account is released first so its occupancy stays in step.
    /// If that release fails the user is kept.
    pub async fn remove_user(&self, id: UserId) -> Result<User, AppError> {
        match self.allocator.release(id).await {
            Ok(code) => info!(user_id = %id, code = %code, "Released flow account before removal"),
            Err(e) if e.is(ErrorKind::NothingAssigned) => {}
            Err(e) => return Err(e),
        }

        let removed = self.users.delete(id).await?;
        info!(user_id = %id, username = %removed.username, "User removed");
        Ok(removed)
    }
}
