//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowdesk_core::types::id::UserId;

use super::status::UserStatus;
use crate::flow_account::AccountCode;

/// A user of the AI platform as seen by the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Access tier.
    pub status: UserStatus,
    /// End of a paid subscription; only meaningful for `Subscription`.
    #[serde(default)]
    pub subscription_expiry: Option<DateTime<Utc>>,
    /// Personal credential token that authorizes the premium capability.
    #[serde(default)]
    pub personal_token: Option<String>,
    /// Code of the flow account this user holds, if any.
    #[serde(default)]
    pub pool_code: Option<AccountCode>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check whether the user holds a non-blank personal token.
    pub fn has_token(&self) -> bool {
        has_token(self.personal_token.as_deref())
    }

    /// Check whether the subscription has lapsed at `now`.
    pub fn is_subscription_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == UserStatus::Subscription
            && self.subscription_expiry.is_some_and(|expiry| now > expiry)
    }
}

/// Check whether an optional token counts as held (non-blank once trimmed).
pub fn has_token(token: Option<&str>) -> bool {
    token.is_some_and(|t| !t.trim().is_empty())
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: Option<String>,
    /// Initial access tier.
    pub status: UserStatus,
}
