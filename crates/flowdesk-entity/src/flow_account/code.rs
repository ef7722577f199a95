//! Short human-readable flow account label (`E1`, `E2`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use flowdesk_core::AppError;

/// Prefix shared by every generated account code.
pub const CODE_PREFIX: char = 'E';

/// Label of a flow account, unique among active accounts.
///
/// Ordering is lexicographic on the label text, so `E10` sorts before `E2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(String);

impl AccountCode {
    /// Build the code for a pool slot number.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{CODE_PREFIX}{n}"))
    }

    /// Extract `n` from a code of the form `E<n>` with `n > 0`.
    pub fn number(&self) -> Option<u32> {
        let digits = self.0.strip_prefix(CODE_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().filter(|n| *n > 0)
    }

    /// Return the code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountCode {
    type Err = AppError;

    /// Accepts any non-blank label. Use [`AccountCode::number`] to check the
    /// `E<n>` pattern.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::validation("Account code cannot be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for AccountCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
