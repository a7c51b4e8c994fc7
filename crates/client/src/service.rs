//! Core trait definition for table-service backends.
//!
//! The [`TableService`] trait is the remote operation set: one method per
//! round trip. The framed-transport implementation is
//! [`RemoteClient`](crate::RemoteClient); [`MemTableService`](crate::mem::MemTableService)
//! provides an in-memory implementation for testing. The ergonomic layer on
//! top of either is [`TableClient`](crate::TableClient).
//!
//! Methods take `&mut self`: a session carries at most one outstanding call,
//! and scanner handles must not be advanced from two places.

use crate::ServiceResult;
use rowgrid_types::{
    Attributes, ColumnFamilyDescriptor, ColumnKey, ColumnValue, Mutation, RegionInfo, RowResult,
    ScanRange, ScannerId,
};
use std::collections::BTreeMap;

/// The remote table service's operation set.
///
/// Every method is a single synchronous round trip. All failures surface as
/// [`ServiceError`](crate::ServiceError); a rejection by the service itself
/// is [`ServiceError::Remote`](crate::ServiceError::Remote) with the
/// service's message unchanged.
///
/// # Column selectors
///
/// Where a method takes `columns`, each entry is either an exact
/// `family:qualifier` key or a whole-family selector (empty qualifier). An
/// empty selector list selects all columns.
#[auto_impl::auto_impl(&mut, Box)]
pub trait TableService {
    /// List all table names, in the service's order.
    fn table_names(&mut self) -> ServiceResult<Vec<String>>;

    /// Create a table with the given column families.
    ///
    /// Fails if the table already exists or a descriptor is invalid. New
    /// tables are enabled.
    fn create_table(
        &mut self,
        table: &str,
        families: &[ColumnFamilyDescriptor],
    ) -> ServiceResult<()>;

    /// Enable a table. Fails if the table is already enabled or missing.
    fn enable_table(&mut self, table: &str) -> ServiceResult<()>;

    /// Disable a table. Fails if the table is already disabled or missing.
    fn disable_table(&mut self, table: &str) -> ServiceResult<()>;

    /// Whether the table is enabled.
    fn is_table_enabled(&mut self, table: &str) -> ServiceResult<bool>;

    /// List the regions serving a table, in key order.
    fn table_regions(&mut self, table: &str) -> ServiceResult<Vec<RegionInfo>>;

    /// Delete a table. The table must already be disabled; see
    /// [`TableClient::drop_table`](crate::TableClient::drop_table) for the
    /// disable-then-delete sequence.
    fn delete_table(&mut self, table: &str) -> ServiceResult<()>;

    /// Describe a table's column families, keyed by family name.
    fn column_descriptors(
        &mut self,
        table: &str,
    ) -> ServiceResult<BTreeMap<String, ColumnFamilyDescriptor>>;

    /// Apply a set of column writes to one row as one call.
    ///
    /// With `timestamp == None` the service assigns a strictly monotonic
    /// timestamp. Atomicity across columns is whatever the service provides.
    fn mutate_row(
        &mut self,
        table: &str,
        row: &[u8],
        mutations: &[Mutation],
        timestamp: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()>;

    /// Read the latest version of the selected columns in one row.
    ///
    /// `Ok(None)` means the row is absent. A present row with an empty column
    /// map means the row exists but no selected column does.
    fn get_row(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<Option<RowResult>>;

    /// Read up to `versions` most-recent versions per selected column,
    /// most-recent-first. An absent row yields an empty map.
    fn get_row_versions(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        versions: u32,
        attributes: &Attributes,
    ) -> ServiceResult<BTreeMap<ColumnKey, Vec<ColumnValue>>>;

    /// Delete versions of the selected columns in one row. With
    /// `up_to == Some(ts)` only versions at or before `ts` are removed.
    fn delete_cells(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        up_to: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()>;

    /// Delete a whole row, optionally bounded by timestamp as in
    /// [`delete_cells`](TableService::delete_cells).
    fn delete_row(
        &mut self,
        table: &str,
        row: &[u8],
        up_to: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()>;

    /// Open a server-side scanner over `range`.
    ///
    /// The handle must be released with
    /// [`scanner_close`](TableService::scanner_close) when iteration ends;
    /// [`ScanCursor`](crate::ScanCursor) does this for its own handle.
    fn scanner_open(
        &mut self,
        table: &str,
        range: ScanRange,
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScannerId>;

    /// Fetch the next row from an open scanner. `Ok(None)` means the scanner
    /// is exhausted; rows arrive in ascending row-key order.
    fn scanner_next(&mut self, scanner: ScannerId) -> ServiceResult<Option<RowResult>>;

    /// Release a scanner's server-side state. Fails for unknown handles.
    fn scanner_close(&mut self, scanner: ScannerId) -> ServiceResult<()>;
}
