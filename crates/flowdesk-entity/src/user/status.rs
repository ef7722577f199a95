//! User status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access tier of a console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Time-limited trial access.
    Trial,
    /// Paid access until `subscription_expiry`.
    Subscription,
    /// Paid access without expiry.
    Lifetime,
    /// Access disabled.
    Inactive,
    /// Console administrator.
    Admin,
}

impl UserStatus {
    /// Check whether this is one of the paid tiers gated by the token ceiling.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Subscription | Self::Lifetime)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Subscription => "subscription",
            Self::Lifetime => "lifetime",
            Self::Inactive => "inactive",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = flowdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(Self::Trial),
            "subscription" => Ok(Self::Subscription),
            "lifetime" => Ok(Self::Lifetime),
            "inactive" => Ok(Self::Inactive),
            "admin" => Ok(Self::Admin),
            _ => Err(flowdesk_core::AppError::validation(format!(
                "Invalid user status: '{s}'. Expected one of: trial, subscription, lifetime, inactive, admin"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_tiers() {
        assert!(UserStatus::Subscription.is_paid());
        assert!(UserStatus::Lifetime.is_paid());
        assert!(!UserStatus::Trial.is_paid());
        assert!(!UserStatus::Admin.is_paid());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("LIFETIME".parse::<UserStatus>().unwrap(), UserStatus::Lifetime);
        assert!("gold".parse::<UserStatus>().is_err());
    }
}
