//! Conformance tests for [`TableService`] backends.
//!
//! These functions verify that a backend behaves according to the
//! [`TableService`] contract, exercised through [`TableClient`]. To test a
//! custom backend, wrap it in a client and call [`conformance`]; the
//! in-crate suites run it against the in-memory backend and against
//! [`RemoteClient`](crate::RemoteClient) over a loopback connection.

use crate::{ServiceError, ServiceResult, TableClient, TableService};
use bytes::Bytes;
use rowgrid_types::{ColumnFamilyDescriptor, ColumnKey};

/// Run all conformance tests against a backend.
///
/// Each test uses its own `conf_*` table, so the backend should start empty.
pub fn conformance<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    test_create_and_list(client)?;
    test_put_then_get_latest(client)?;
    test_latest_timestamp_tracks_newest_write(client)?;
    test_version_retrieval(client)?;
    test_start_row_scan(client)?;
    test_prefix_scan(client)?;
    test_empty_range_scan(client)?;
    test_enabled_query_is_idempotent(client)?;
    test_double_disable_fails(client)?;
    test_bounded_deletes(client)?;
    test_drop_table_sequence(client)?;
    Ok(())
}

fn families(names: &[&str]) -> Vec<ColumnFamilyDescriptor> {
    names.iter().map(|name| ColumnFamilyDescriptor::new(*name)).collect()
}

fn column(s: &str) -> ColumnKey {
    s.parse().expect("valid column identifier")
}

fn put<S: TableService>(
    client: &mut TableClient<S>,
    table: &str,
    row: &[u8],
    col: &str,
    value: &str,
    timestamp: Option<u64>,
) -> ServiceResult<()> {
    let mut columns = std::collections::BTreeMap::new();
    columns.insert(column(col), Bytes::copy_from_slice(value.as_bytes()));
    client.put_row_with(table, row, &columns, timestamp, &Default::default())
}

/// A created table shows up in the listing.
pub fn test_create_and_list<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    let names = client.table_names()?;
    assert!(!names.contains(&"conf_list".to_string()));

    client.create_table("conf_list", &families(&["data"]))?;
    let names = client.table_names()?;
    assert!(names.contains(&"conf_list".to_string()));
    Ok(())
}

/// Reads return the latest write per column; absent rows read as `None`.
pub fn test_put_then_get_latest<S: TableService>(
    client: &mut TableClient<S>,
) -> ServiceResult<()> {
    client.create_table("conf_rw", &families(&["data", "name"]))?;

    put(client, "conf_rw", b"1", "name:", "zhangsan", None)?;
    put(client, "conf_rw", b"1", "data:age", "55", None)?;
    put(client, "conf_rw", b"1", "data:age", "56", None)?;

    let row = client.get_row("conf_rw", b"1")?.expect("row present");
    assert_eq!(row.columns[&column("name:")].value, Bytes::from_static(b"zhangsan"));
    assert_eq!(row.columns[&column("data:age")].value, Bytes::from_static(b"56"));

    assert!(client.get_row("conf_rw", b"missing")?.is_none());
    Ok(())
}

/// With writes at t1 < t2 on one column, the latest timestamp is t2, and an
/// absent row is `None` rather than a zero timestamp.
pub fn test_latest_timestamp_tracks_newest_write<S: TableService>(
    client: &mut TableClient<S>,
) -> ServiceResult<()> {
    client.create_table("conf_ts", &families(&["data"]))?;

    put(client, "conf_ts", b"r", "data:x", "old", Some(10))?;
    put(client, "conf_ts", b"r", "data:x", "new", Some(20))?;

    assert_eq!(client.latest_timestamp("conf_ts", b"r")?, Some(20));
    assert_eq!(client.latest_timestamp("conf_ts", b"absent")?, None);
    Ok(())
}

/// Version reads return up to the requested count, most-recent-first.
pub fn test_version_retrieval<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    client.create_table("conf_ver", &families(&["data"]))?;
    for (value, ts) in [("a", 1), ("b", 2), ("c", 3)] {
        put(client, "conf_ver", b"r", "data:x", value, Some(ts))?;
    }

    let versions = client.get_row_versions("conf_ver", b"r", &[column("data:x")], 2)?;
    let values = &versions[&column("data:x")];
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].timestamp, 3);
    assert_eq!(values[0].value, Bytes::from_static(b"c"));
    assert_eq!(values[1].timestamp, 2);
    Ok(())
}

/// A start-row scan over rows "1".."5" starting at "3" yields exactly
/// "3","4","5" in order, then terminates.
pub fn test_start_row_scan<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    client.create_table("conf_scan", &families(&["data"]))?;
    for key in ["1", "2", "3", "4", "5"] {
        put(client, "conf_scan", key.as_bytes(), "data:v", key, None)?;
    }

    let rows: Vec<_> = client
        .scan("conf_scan", b"3")?
        .collect::<ServiceResult<_>>()?;
    let keys: Vec<_> = rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec!["3", "4", "5"]);
    assert_eq!(rows[0].columns[&column("data:v")], Bytes::from_static(b"3"));
    Ok(())
}

/// A prefix scan yields exactly the rows under the prefix, in key order.
pub fn test_prefix_scan<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    client.create_table("conf_prefix", &families(&["data"]))?;
    for (key, value) in [("apple", "1"), ("ant", "2"), ("banana", "3")] {
        put(client, "conf_prefix", key.as_bytes(), "data:v", value, None)?;
    }

    let rows: Vec<_> = client
        .scan_prefix("conf_prefix", b"a")?
        .collect::<ServiceResult<_>>()?;
    let keys: Vec<_> = rows.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec!["ant", "apple"]);
    Ok(())
}

/// A bounded scan with end == start is empty, not an error.
pub fn test_empty_range_scan<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    client.create_table("conf_empty", &families(&["data"]))?;
    for key in ["1", "2", "3"] {
        put(client, "conf_empty", key.as_bytes(), "data:v", key, None)?;
    }

    let rows: Vec<_> = client
        .scan_range("conf_empty", b"2", b"2")?
        .collect::<ServiceResult<_>>()?;
    assert!(rows.is_empty());
    Ok(())
}

/// Two enabled-state queries with no intervening mutation agree.
pub fn test_enabled_query_is_idempotent<S: TableService>(
    client: &mut TableClient<S>,
) -> ServiceResult<()> {
    client.create_table("conf_enabled", &families(&["data"]))?;
    let first = client.is_table_enabled("conf_enabled")?;
    let second = client.is_table_enabled("conf_enabled")?;
    assert_eq!(first, second);
    assert!(first);
    Ok(())
}

/// Disabling twice in a row fails with a remote error on the second call.
pub fn test_double_disable_fails<S: TableService>(
    client: &mut TableClient<S>,
) -> ServiceResult<()> {
    client.create_table("conf_disable", &families(&["data"]))?;
    client.disable_table("conf_disable")?;
    assert!(matches!(
        client.disable_table("conf_disable"),
        Err(ServiceError::Remote { .. })
    ));
    assert!(!client.is_table_enabled("conf_disable")?);
    Ok(())
}

/// Timestamp-bounded deletes keep newer versions; unbounded row deletes
/// remove the row.
pub fn test_bounded_deletes<S: TableService>(client: &mut TableClient<S>) -> ServiceResult<()> {
    client.create_table("conf_del", &families(&["data"]))?;
    for ts in [1, 2, 3] {
        put(client, "conf_del", b"r", "data:x", "v", Some(ts))?;
    }

    client.delete_columns_before("conf_del", b"r", &[column("data:x")], 2)?;
    let row = client.get_row("conf_del", b"r")?.expect("row still present");
    assert_eq!(row.columns[&column("data:x")].timestamp, 3);

    client.delete_row("conf_del", b"r")?;
    assert!(client.get_row("conf_del", b"r")?.is_none());
    Ok(())
}

/// `drop_table` disables when needed and deletes; it also handles a table
/// that is already disabled.
pub fn test_drop_table_sequence<S: TableService>(
    client: &mut TableClient<S>,
) -> ServiceResult<()> {
    client.create_table("conf_drop", &families(&["data"]))?;
    client.drop_table("conf_drop")?;
    assert!(!client.table_names()?.contains(&"conf_drop".to_string()));

    // Recreate, pre-disable, and drop again through the other path.
    client.create_table("conf_drop", &families(&["data"]))?;
    client.disable_table("conf_drop")?;
    client.drop_table("conf_drop")?;
    assert!(!client.table_names()?.contains(&"conf_drop".to_string()));
    Ok(())
}
