//! Subscription duration selected alongside a status change.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use flowdesk_core::AppError;

/// How long a granted subscription lasts.
///
/// `Lifetime` overrides whatever status was selected next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionDuration {
    /// A fixed number of calendar months.
    Months(u32),
    /// No expiry.
    Lifetime,
}

impl SubscriptionDuration {
    /// Check whether this is the lifetime duration.
    pub fn is_lifetime(&self) -> bool {
        matches!(self, Self::Lifetime)
    }

    /// Compute the expiry of a subscription starting at `from`.
    ///
    /// Returns `None` for lifetime.
    pub fn expiry_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Months(n) => from.checked_add_months(Months::new(*n)),
            Self::Lifetime => None,
        }
    }
}

impl fmt::Display for SubscriptionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Months(n) => write!(f, "{n}"),
            Self::Lifetime => write!(f, "lifetime"),
        }
    }
}

impl FromStr for SubscriptionDuration {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("lifetime") {
            return Ok(Self::Lifetime);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Self::Months(n)),
            _ => Err(AppError::validation(format!(
                "Invalid subscription duration: '{s}'. Expected a positive number of months or 'lifetime'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_uses_calendar_months() {
        let start = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let expiry = SubscriptionDuration::Months(1).expiry_from(start).unwrap();
        assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap());
        assert_eq!(SubscriptionDuration::Lifetime.expiry_from(start), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "12".parse::<SubscriptionDuration>().unwrap(),
            SubscriptionDuration::Months(12)
        );
        assert!("Lifetime".parse::<SubscriptionDuration>().unwrap().is_lifetime());
        assert!("0".parse::<SubscriptionDuration>().is_err());
    }
}
