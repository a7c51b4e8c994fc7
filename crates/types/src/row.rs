//! Row results and mutations.

use crate::{ColumnKey, ColumnValue};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single column write within a row mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    /// The column to write. Must not be a whole-family selector.
    pub column: ColumnKey,
    /// The value to write.
    pub value: Bytes,
}

impl Mutation {
    /// Create a new mutation.
    pub fn new(column: ColumnKey, value: impl Into<Bytes>) -> Self {
        Self { column, value: value.into() }
    }
}

/// One row as returned by a read or scan fetch: the row key and the latest
/// version of each selected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowResult {
    /// The row key.
    pub key: Bytes,
    /// Selected columns with their latest values.
    pub columns: BTreeMap<ColumnKey, ColumnValue>,
}

impl RowResult {
    /// Create a new row result.
    pub fn new(key: impl Into<Bytes>, columns: BTreeMap<ColumnKey, ColumnValue>) -> Self {
        Self { key: key.into(), columns }
    }

    /// True if the row carries no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The greatest timestamp across all columns, or `None` for an empty row.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.columns.values().map(|v| v.timestamp).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_timestamp_is_column_max() {
        let mut columns = BTreeMap::new();
        columns.insert(
            ColumnKey::new("data", "age").unwrap(),
            ColumnValue::new(&b"55"[..], 10),
        );
        columns.insert(
            ColumnKey::new("data", "city").unwrap(),
            ColumnValue::new(&b"beijing"[..], 42),
        );
        let row = RowResult::new(&b"3"[..], columns);
        assert_eq!(row.latest_timestamp(), Some(42));

        let empty = RowResult::new(&b"4"[..], BTreeMap::new());
        assert_eq!(empty.latest_timestamp(), None);
    }
}
