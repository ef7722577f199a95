//! Convenience result type alias for FlowDesk.

use crate::error::AppError;

/// A specialized `Result` type for FlowDesk operations.
pub type AppResult<T> = Result<T, AppError>;
