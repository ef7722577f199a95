//! Unified application error types for FlowDesk.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Errors are always returned as values:
//! an operator must be able to see why an action did not complete.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A generic record (usually a user) was not found.
    NotFound,
    /// The requested flow account does not exist or is inactive.
    AccountNotFound,
    /// The requested flow account has no free slot left.
    AccountFull,
    /// No active flow account has a free slot.
    NoCapacity,
    /// The user holds no pool assignment.
    NothingAssigned,
    /// The global authorized-token ceiling blocks a paid-tier upgrade.
    TokenCeilingReached,
    /// A write against the record store failed.
    StoreWriteFailed,
    /// One or more independent sub-operations failed.
    PartialFailure,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, resource still in use, etc.).
    Conflict,
    /// A read against the record store failed.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            Self::AccountFull => write!(f, "ACCOUNT_FULL"),
            Self::NoCapacity => write!(f, "NO_CAPACITY"),
            Self::NothingAssigned => write!(f, "NOTHING_ASSIGNED"),
            Self::TokenCeilingReached => write!(f, "TOKEN_CEILING_REACHED"),
            Self::StoreWriteFailed => write!(f, "STORE_WRITE_FAILED"),
            Self::PartialFailure => write!(f, "PARTIAL_FAILURE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout FlowDesk.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. A [`ErrorKind::PartialFailure`] keeps
/// every failed sub-operation in `causes`.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Aggregated sub-errors (only populated for partial failures).
    pub causes: Vec<AppError>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            causes: Vec::new(),
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            causes: Vec::new(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an account-not-found error for the given code.
    pub fn account_not_found(code: &str) -> Self {
        Self::new(
            ErrorKind::AccountNotFound,
            format!("Flow account {code} not found or inactive"),
        )
    }

    /// Create an account-full error for the given code.
    pub fn account_full(code: &str, capacity: u32) -> Self {
        Self::new(
            ErrorKind::AccountFull,
            format!("Flow account {code} is full ({capacity}/{capacity} users)"),
        )
    }

    /// Create a no-capacity error.
    pub fn no_capacity() -> Self {
        Self::new(
            ErrorKind::NoCapacity,
            "No available flow account. Please add more accounts.",
        )
    }

    /// Create a nothing-assigned error.
    pub fn nothing_assigned() -> Self {
        Self::new(
            ErrorKind::NothingAssigned,
            "User does not have a flow account assigned",
        )
    }

    /// Create a token-ceiling error.
    pub fn token_ceiling_reached(limit: usize) -> Self {
        Self::new(
            ErrorKind::TokenCeilingReached,
            format!(
                "Cannot upgrade user status. Token authorization is limited to fewer than {} users.",
                limit + 1
            ),
        )
    }

    /// Wrap an underlying store error as a failed write.
    pub fn store_write_failed(message: impl Into<String>, source: AppError) -> Self {
        let message = format!("{}: {}", message.into(), source.message);
        Self::with_source(ErrorKind::StoreWriteFailed, message, source)
    }

    /// Aggregate several failures into one partial-failure error.
    ///
    /// The message is every cause's message joined by a space.
    pub fn partial(causes: Vec<AppError>) -> Self {
        let message = causes
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            kind: ErrorKind::PartialFailure,
            message,
            source: None,
            causes,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database (read) error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Check whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            causes: self.causes.clone(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Database, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_joins_every_message() {
        let err = AppError::partial(vec![
            AppError::token_ceiling_reached(4),
            AppError::conflict("Token already in use"),
        ]);
        assert_eq!(err.kind, ErrorKind::PartialFailure);
        assert_eq!(err.causes.len(), 2);
        assert!(err.message.contains("fewer than 5 users"));
        assert!(err.message.ends_with("Token already in use"));
    }

    #[test]
    fn test_store_write_failed_keeps_source() {
        let inner = AppError::conflict("duplicate personal_token");
        let err = AppError::store_write_failed("Failed to update user", inner);
        assert!(err.is(ErrorKind::StoreWriteFailed));
        assert!(err.message.contains("duplicate personal_token"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::AccountFull.to_string(), "ACCOUNT_FULL");
        assert_eq!(
            AppError::no_capacity().to_string(),
            "NO_CAPACITY: No available flow account. Please add more accounts."
        );
    }
}
