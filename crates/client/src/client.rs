//! Ergonomic layer over a [`TableService`] backend.

use crate::{RemoteClient, ScanCursor, ServiceResult, TableService};
use crate::config::ClientConfig;
use bytes::Bytes;
use rowgrid_types::{
    Attributes, ColumnFamilyDescriptor, ColumnKey, ColumnValue, Mutation, RegionInfo, RowResult,
    ScanRange,
};
use std::collections::BTreeMap;

/// Typed convenience layer over any [`TableService`] backend.
///
/// Adds validated row writes, the disable-then-delete table drop sequence,
/// explicit latest-timestamp semantics, and the scan constructors that
/// produce [`ScanCursor`]s. All other operations delegate one-to-one to the
/// backend.
#[derive(Debug)]
pub struct TableClient<S> {
    service: S,
}

impl TableClient<RemoteClient> {
    /// Connect to a remote table service and wrap it.
    pub fn connect(config: &ClientConfig) -> ServiceResult<Self> {
        RemoteClient::connect(config).map(Self::new)
    }
}

impl<S: TableService> TableClient<S> {
    /// Wrap a service backend.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Borrow the underlying backend.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Unwrap the underlying backend.
    pub fn into_inner(self) -> S {
        self.service
    }

    // --- Table lifecycle ---

    /// List all table names.
    pub fn table_names(&mut self) -> ServiceResult<Vec<String>> {
        self.service.table_names()
    }

    /// Create a table with the given column families. The new table is
    /// enabled.
    pub fn create_table(
        &mut self,
        table: &str,
        families: &[ColumnFamilyDescriptor],
    ) -> ServiceResult<()> {
        self.service.create_table(table, families)
    }

    /// Enable a table. Errors if it is already enabled.
    pub fn enable_table(&mut self, table: &str) -> ServiceResult<()> {
        self.service.enable_table(table)
    }

    /// Disable a table. Errors if it is already disabled.
    pub fn disable_table(&mut self, table: &str) -> ServiceResult<()> {
        self.service.disable_table(table)
    }

    /// Whether the table is enabled.
    pub fn is_table_enabled(&mut self, table: &str) -> ServiceResult<bool> {
        self.service.is_table_enabled(table)
    }

    /// List the regions serving a table.
    pub fn table_regions(&mut self, table: &str) -> ServiceResult<Vec<RegionInfo>> {
        self.service.table_regions(table)
    }

    /// Describe a table's column families.
    pub fn column_descriptors(
        &mut self,
        table: &str,
    ) -> ServiceResult<BTreeMap<String, ColumnFamilyDescriptor>> {
        self.service.column_descriptors(table)
    }

    /// Disable a table if needed, then delete it.
    ///
    /// If the disable step fails the delete is not attempted, so a
    /// half-dropped table is never left behind by this call. A successful
    /// disable is not rolled back if the delete then fails; re-running
    /// `drop_table` is the recovery path.
    pub fn drop_table(&mut self, table: &str) -> ServiceResult<()> {
        if self.service.is_table_enabled(table)? {
            self.service.disable_table(table)?;
        }
        self.service.delete_table(table)
    }

    // --- Row operations ---

    /// Write a set of column values to one row in one call, with
    /// service-assigned timestamps.
    pub fn put_row(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &BTreeMap<ColumnKey, Bytes>,
    ) -> ServiceResult<()> {
        self.put_row_with(table, row, columns, None, &Attributes::new())
    }

    /// [`put_row`](Self::put_row) with an explicit timestamp and request
    /// attributes.
    pub fn put_row_with(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &BTreeMap<ColumnKey, Bytes>,
        timestamp: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()> {
        let mutations: Vec<Mutation> = columns
            .iter()
            .map(|(column, value)| Mutation::new(column.clone(), value.clone()))
            .collect();
        self.service.mutate_row(table, row, &mutations, timestamp, attributes)
    }

    /// Read the latest version of every column in a row. `Ok(None)` means
    /// the row is absent.
    pub fn get_row(&mut self, table: &str, row: &[u8]) -> ServiceResult<Option<RowResult>> {
        self.get_row_with(table, row, &[], &Attributes::new())
    }

    /// [`get_row`](Self::get_row) restricted to column selectors, with
    /// request attributes.
    pub fn get_row_with(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<Option<RowResult>> {
        self.service.get_row(table, row, columns, attributes)
    }

    /// Read up to `versions` most-recent versions per selected column,
    /// most-recent-first.
    pub fn get_row_versions(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        versions: u32,
    ) -> ServiceResult<BTreeMap<ColumnKey, Vec<ColumnValue>>> {
        self.service.get_row_versions(table, row, columns, versions, &Attributes::new())
    }

    /// The greatest timestamp across all columns of a row.
    ///
    /// `Ok(Some(ts))` for a populated row, `Ok(None)` for an absent (or
    /// empty) row. Failures propagate as errors; absence is never conflated
    /// with a failed call.
    pub fn latest_timestamp(&mut self, table: &str, row: &[u8]) -> ServiceResult<Option<u64>> {
        let result = self.service.get_row(table, row, &[], &Attributes::new())?;
        Ok(result.and_then(|row| row.latest_timestamp()))
    }

    /// Delete all versions of the selected columns in one row.
    pub fn delete_columns(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
    ) -> ServiceResult<()> {
        self.service.delete_cells(table, row, columns, None, &Attributes::new())
    }

    /// Delete versions of the selected columns at or before `timestamp`.
    pub fn delete_columns_before(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        timestamp: u64,
    ) -> ServiceResult<()> {
        self.service.delete_cells(table, row, columns, Some(timestamp), &Attributes::new())
    }

    /// Delete a whole row.
    pub fn delete_row(&mut self, table: &str, row: &[u8]) -> ServiceResult<()> {
        self.service.delete_row(table, row, None, &Attributes::new())
    }

    /// Delete whole-row versions at or before `timestamp`.
    pub fn delete_row_before(
        &mut self,
        table: &str,
        row: &[u8],
        timestamp: u64,
    ) -> ServiceResult<()> {
        self.service.delete_row(table, row, Some(timestamp), &Attributes::new())
    }

    // --- Scans ---

    /// Scan from `start` (inclusive) to the end of the table.
    pub fn scan(&mut self, table: &str, start: &[u8]) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::From { start: Bytes::copy_from_slice(start) };
        self.open_cursor(table, range, &[], &Attributes::new())
    }

    /// [`scan`](Self::scan) with column selectors and request attributes.
    pub fn scan_with(
        &mut self,
        table: &str,
        start: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::From { start: Bytes::copy_from_slice(start) };
        self.open_cursor(table, range, columns, attributes)
    }

    /// Scan from `start` (inclusive) to `end` (exclusive). `end == start`
    /// yields zero rows.
    pub fn scan_range(
        &mut self,
        table: &str,
        start: &[u8],
        end: &[u8],
    ) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::Between {
            start: Bytes::copy_from_slice(start),
            end: Bytes::copy_from_slice(end),
        };
        self.open_cursor(table, range, &[], &Attributes::new())
    }

    /// [`scan_range`](Self::scan_range) with column selectors and request
    /// attributes.
    pub fn scan_range_with(
        &mut self,
        table: &str,
        start: &[u8],
        end: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::Between {
            start: Bytes::copy_from_slice(start),
            end: Bytes::copy_from_slice(end),
        };
        self.open_cursor(table, range, columns, attributes)
    }

    /// Scan all rows whose key begins with `prefix`.
    pub fn scan_prefix(&mut self, table: &str, prefix: &[u8]) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::Prefix { prefix: Bytes::copy_from_slice(prefix) };
        self.open_cursor(table, range, &[], &Attributes::new())
    }

    /// [`scan_prefix`](Self::scan_prefix) with column selectors and request
    /// attributes.
    pub fn scan_prefix_with(
        &mut self,
        table: &str,
        prefix: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScanCursor<'_, S>> {
        let range = ScanRange::Prefix { prefix: Bytes::copy_from_slice(prefix) };
        self.open_cursor(table, range, columns, attributes)
    }

    fn open_cursor(
        &mut self,
        table: &str,
        range: ScanRange,
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScanCursor<'_, S>> {
        let scanner = self.service.scanner_open(table, range, columns, attributes)?;
        Ok(ScanCursor::new(&mut self.service, scanner))
    }
}
