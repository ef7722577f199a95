//! Typed repositories over a [`RecordStore`](flowdesk_core::traits::RecordStore).

pub mod flow_account;
pub mod user;

pub use flow_account::FlowAccountRepository;
pub use user::UserRepository;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use flowdesk_core::error::{AppError, ErrorKind};
use flowdesk_core::result::AppResult;
use flowdesk_core::traits::Record;

/// Decode a store record into an entity.
pub(crate) fn decode<T: DeserializeOwned>(record: Record) -> AppResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, format!("Malformed record: {e}"), e)
    })
}

/// Decode every record of a result set.
pub(crate) fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> AppResult<Vec<T>> {
    records.into_iter().map(decode).collect()
}

/// Encode a field set for insert or update.
pub(crate) fn encode<T: Serialize>(fields: &T) -> AppResult<Record> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::internal(format!(
            "Expected a field map, got {other}"
        ))),
    }
}

/// Map a failed read into a database error.
pub(crate) fn read_error(context: &str) -> impl FnOnce(AppError) -> AppError + '_ {
    move |e| AppError::with_source(ErrorKind::Database, format!("{context}: {}", e.message), e)
}

/// Map a failed write into `StoreWriteFailed`, keeping `NotFound` as is.
pub(crate) fn write_error(context: &str) -> impl FnOnce(AppError) -> AppError + '_ {
    move |e| {
        if e.is(ErrorKind::NotFound) {
            e
        } else {
            AppError::store_write_failed(context, e)
        }
    }
}
