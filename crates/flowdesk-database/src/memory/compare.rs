//! Value comparison and query evaluation over JSON records.

use std::cmp::Ordering;

use serde_json::Value;

use flowdesk_core::traits::Record;
use flowdesk_core::types::{FilterField, FilterOp, Query};

/// Compare two JSON values of the same type.
///
/// Numbers compare numerically and strings lexicographically. `null` sorts
/// before everything. Mixed or compound types are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn field<'a>(record: &'a Record, name: &str) -> &'a Value {
    record.get(name).unwrap_or(&Value::Null)
}

fn matches_filter(record: &Record, filter: &FilterField) -> bool {
    let value = field(record, &filter.field);
    match filter.op {
        FilterOp::Eq => compare_values(value, &filter.value) == Some(Ordering::Equal),
        FilterOp::Lt => {
            !value.is_null() && compare_values(value, &filter.value) == Some(Ordering::Less)
        }
    }
}

/// Apply the filters, ordering, and limit of `query` to `records`.
pub fn evaluate<'a>(records: impl Iterator<Item = &'a Record>, query: &Query) -> Vec<Record> {
    let mut out: Vec<Record> = records
        .filter(|r| query.filters.iter().all(|f| matches_filter(r, f)))
        .cloned()
        .collect();

    if !query.order_by.is_empty() {
        out.sort_by(|a, b| {
            for sort in &query.order_by {
                let ord = sort.direction.apply(
                    compare_values(field(a, &sort.field), field(b, &sort.field))
                        .unwrap_or(Ordering::Equal),
                );
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    if let Some(limit) = query.limit {
        out.truncate(limit);
    }
    out
}
