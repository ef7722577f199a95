//! Composable query passed to [`RecordStore::query`](crate::traits::RecordStore::query).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::FilterField;
use super::sorting::SortField;

/// Conjunction of filters, an ordered list of sort keys, and an optional limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// All filters must hold for a record to match.
    pub filters: Vec<FilterField>,
    /// Sort keys applied in order; later keys break ties of earlier ones.
    pub order_by: Vec<SortField>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Create an empty query matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FilterField::eq(field, value));
        self
    }

    /// Add a less-than filter.
    pub fn lt(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FilterField::lt(field, value));
        self
    }

    /// Append a sort key.
    pub fn order_by(mut self, sort: SortField) -> Self {
        self.order_by.push(sort);
        self
    }

    /// Cap the number of returned records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
