//! In-memory table service for testing.
//!
//! Stores all data in standard Rust collections and implements the full
//! [`TableService`] contract, including lifecycle enforcement and scanner
//! state. Primarily intended for tests and development; the loopback
//! integration tests also serve it over the real wire protocol.

use crate::{ServiceError, ServiceResult, TableService};
use bytes::Bytes;
use rowgrid_types::{
    Attributes, ColumnFamilyDescriptor, ColumnKey, ColumnValue, Mutation, RegionInfo, RowResult,
    ScanRange, ScannerId,
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

/// All versions of one row, per column. Versions are most-recent-first.
type MemRow = BTreeMap<ColumnKey, Vec<ColumnValue>>;

struct MemTable {
    enabled: bool,
    families: BTreeMap<String, ColumnFamilyDescriptor>,
    rows: BTreeMap<Bytes, MemRow>,
}

struct MemScanner {
    table: String,
    range: ScanRange,
    columns: Vec<ColumnKey>,
    /// Lower bound for the next fetch. Advanced past each yielded key.
    pos: Bytes,
}

/// In-memory table service.
///
/// Server-assigned timestamps come from a strictly monotonic counter that
/// also ratchets past any caller-assigned timestamp, so "latest" is always
/// well defined.
#[derive(Default)]
pub struct MemTableService {
    tables: BTreeMap<String, MemTable>,
    scanners: HashMap<u64, MemScanner>,
    next_scanner: u64,
    clock: u64,
}

impl MemTableService {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scanner handles currently open. Lets tests observe that
    /// cursors release their handles.
    pub fn open_scanner_count(&self) -> usize {
        self.scanners.len()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn table(&self, name: &str) -> ServiceResult<&MemTable> {
        self.tables
            .get(name)
            .ok_or_else(|| ServiceError::remote(format!("table {name} not found")))
    }

    fn table_mut(&mut self, name: &str) -> ServiceResult<&mut MemTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| ServiceError::remote(format!("table {name} not found")))
    }

    fn enabled_table_mut(&mut self, name: &str) -> ServiceResult<&mut MemTable> {
        let table = self.table_mut(name)?;
        if !table.enabled {
            return Err(ServiceError::remote(format!("table {name} is disabled")));
        }
        Ok(table)
    }
}

impl fmt::Debug for MemTableService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemTableService")
            .field("tables", &self.tables.len())
            .field("open_scanners", &self.scanners.len())
            .finish_non_exhaustive()
    }
}

fn selected(selectors: &[ColumnKey], column: &ColumnKey) -> bool {
    selectors.is_empty() || selectors.iter().any(|s| s.selects(column))
}

/// Latest version of each selected column.
fn select_latest(row: &MemRow, selectors: &[ColumnKey]) -> BTreeMap<ColumnKey, ColumnValue> {
    row.iter()
        .filter(|(column, _)| selected(selectors, column))
        .filter_map(|(column, versions)| versions.first().map(|v| (column.clone(), v.clone())))
        .collect()
}

/// Insert a version keeping the list sorted most-recent-first and bounded by
/// the family's retention. A write at an existing timestamp replaces it.
fn insert_version(versions: &mut Vec<ColumnValue>, value: ColumnValue, max_versions: u32) {
    versions.retain(|v| v.timestamp != value.timestamp);
    let idx = versions
        .iter()
        .position(|v| v.timestamp < value.timestamp)
        .unwrap_or(versions.len());
    versions.insert(idx, value);
    versions.truncate(max_versions.max(1) as usize);
}

/// Remove versions at or before `up_to`, or all versions if unbounded.
fn prune_versions(versions: &mut Vec<ColumnValue>, up_to: Option<u64>) {
    match up_to {
        None => versions.clear(),
        Some(ts) => versions.retain(|v| v.timestamp > ts),
    }
}

/// The smallest key strictly greater than `key`.
fn next_key(key: &[u8]) -> Bytes {
    let mut next = Vec::with_capacity(key.len() + 1);
    next.extend_from_slice(key);
    next.push(0);
    Bytes::from(next)
}

impl TableService for MemTableService {
    fn table_names(&mut self) -> ServiceResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn create_table(
        &mut self,
        table: &str,
        families: &[ColumnFamilyDescriptor],
    ) -> ServiceResult<()> {
        if self.tables.contains_key(table) {
            return Err(ServiceError::remote(format!("table {table} already exists")));
        }
        let mut family_map = BTreeMap::new();
        for family in families {
            family
                .validate()
                .map_err(|e| ServiceError::remote(format!("invalid column family: {e}")))?;
            family_map.insert(family.name.clone(), family.clone());
        }
        self.tables.insert(
            table.to_string(),
            MemTable { enabled: true, families: family_map, rows: BTreeMap::new() },
        );
        Ok(())
    }

    fn enable_table(&mut self, table: &str) -> ServiceResult<()> {
        let name = table;
        let table = self.table_mut(name)?;
        if table.enabled {
            return Err(ServiceError::remote(format!("table {name} is already enabled")));
        }
        table.enabled = true;
        Ok(())
    }

    fn disable_table(&mut self, table: &str) -> ServiceResult<()> {
        let name = table;
        let table = self.table_mut(name)?;
        if !table.enabled {
            return Err(ServiceError::remote(format!("table {name} is already disabled")));
        }
        table.enabled = false;
        Ok(())
    }

    fn is_table_enabled(&mut self, table: &str) -> ServiceResult<bool> {
        Ok(self.table(table)?.enabled)
    }

    fn table_regions(&mut self, table: &str) -> ServiceResult<Vec<RegionInfo>> {
        self.table(table)?;
        // A single region spanning the whole table.
        Ok(vec![RegionInfo {
            start_key: Bytes::new(),
            end_key: Bytes::new(),
            id: 1,
            name: format!("{table},,1"),
            version: 1,
            server_host: "localhost".to_string(),
            server_port: 0,
        }])
    }

    fn delete_table(&mut self, table: &str) -> ServiceResult<()> {
        if self.table(table)?.enabled {
            return Err(ServiceError::remote(format!("table {table} is enabled")));
        }
        self.tables.remove(table);
        Ok(())
    }

    fn column_descriptors(
        &mut self,
        table: &str,
    ) -> ServiceResult<BTreeMap<String, ColumnFamilyDescriptor>> {
        Ok(self.table(table)?.families.clone())
    }

    fn mutate_row(
        &mut self,
        table: &str,
        row: &[u8],
        mutations: &[Mutation],
        timestamp: Option<u64>,
        _attributes: &Attributes,
    ) -> ServiceResult<()> {
        let ts = match timestamp {
            Some(ts) => {
                // Keep server-assigned timestamps ahead of caller-assigned
                // ones.
                self.clock = self.clock.max(ts);
                ts
            }
            None => self.tick(),
        };

        let name = table;
        let table = self.enabled_table_mut(name)?;

        // Validate every family before applying any write.
        let mut retention = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let family = table.families.get(mutation.column.family()).ok_or_else(|| {
                ServiceError::remote(format!(
                    "unknown column family {} in table {name}",
                    mutation.column.family()
                ))
            })?;
            retention.push(family.max_versions);
        }

        // Nothing to write; do not materialize an empty row.
        if mutations.is_empty() {
            return Ok(());
        }

        let row = table.rows.entry(Bytes::copy_from_slice(row)).or_default();
        for (mutation, max_versions) in mutations.iter().zip(retention) {
            let versions = row.entry(mutation.column.clone()).or_default();
            insert_version(versions, ColumnValue::new(mutation.value.clone(), ts), max_versions);
        }
        Ok(())
    }

    fn get_row(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        _attributes: &Attributes,
    ) -> ServiceResult<Option<RowResult>> {
        let table = self.table(table)?;
        Ok(table
            .rows
            .get(row)
            .map(|r| RowResult::new(Bytes::copy_from_slice(row), select_latest(r, columns))))
    }

    fn get_row_versions(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        versions: u32,
        _attributes: &Attributes,
    ) -> ServiceResult<BTreeMap<ColumnKey, Vec<ColumnValue>>> {
        let table = self.table(table)?;
        let Some(row) = table.rows.get(row) else { return Ok(BTreeMap::new()) };
        Ok(row
            .iter()
            .filter(|(column, _)| selected(columns, column))
            .map(|(column, values)| {
                (column.clone(), values.iter().take(versions as usize).cloned().collect())
            })
            .collect())
    }

    fn delete_cells(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        up_to: Option<u64>,
        _attributes: &Attributes,
    ) -> ServiceResult<()> {
        let table = self.enabled_table_mut(table)?;
        let mut row_empty = false;
        if let Some(cells) = table.rows.get_mut(row) {
            for (column, versions) in cells.iter_mut() {
                if selected(columns, column) {
                    prune_versions(versions, up_to);
                }
            }
            cells.retain(|_, versions| !versions.is_empty());
            row_empty = cells.is_empty();
        }
        if row_empty {
            table.rows.remove(row);
        }
        Ok(())
    }

    fn delete_row(
        &mut self,
        table: &str,
        row: &[u8],
        up_to: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()> {
        self.delete_cells(table, row, &[], up_to, attributes)
    }

    fn scanner_open(
        &mut self,
        table: &str,
        range: ScanRange,
        columns: &[ColumnKey],
        _attributes: &Attributes,
    ) -> ServiceResult<ScannerId> {
        let name = table;
        let table = self.table(name)?;
        if !table.enabled {
            return Err(ServiceError::remote(format!("table {name} is disabled")));
        }
        let id = self.next_scanner;
        self.next_scanner += 1;
        self.scanners.insert(
            id,
            MemScanner {
                table: name.to_string(),
                pos: range.lower_bound().clone(),
                range,
                columns: columns.to_vec(),
            },
        );
        Ok(ScannerId::new(id))
    }

    fn scanner_next(&mut self, scanner: ScannerId) -> ServiceResult<Option<RowResult>> {
        let state = self
            .scanners
            .get_mut(&scanner.raw())
            .ok_or_else(|| ServiceError::remote(format!("unknown scanner {scanner}")))?;
        let table = self
            .tables
            .get(&state.table)
            .ok_or_else(|| ServiceError::remote(format!("table {} not found", state.table)))?;

        // Rows whose selected column set is empty are skipped, not yielded.
        loop {
            let Some((key, row)) = table.rows.range(state.pos.clone()..).next() else {
                return Ok(None);
            };
            if state.range.is_past(key) {
                return Ok(None);
            }
            state.pos = next_key(key);
            let columns = select_latest(row, &state.columns);
            if columns.is_empty() {
                continue;
            }
            return Ok(Some(RowResult::new(key.clone(), columns)));
        }
    }

    fn scanner_close(&mut self, scanner: ScannerId) -> ServiceResult<()> {
        self.scanners
            .remove(&scanner.raw())
            .map(|_| ())
            .ok_or_else(|| ServiceError::remote(format!("unknown scanner {scanner}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn families(names: &[&str]) -> Vec<ColumnFamilyDescriptor> {
        names.iter().map(|name| ColumnFamilyDescriptor::new(*name)).collect()
    }

    fn put(
        service: &mut MemTableService,
        table: &str,
        row: &[u8],
        column: &str,
        value: &str,
        timestamp: Option<u64>,
    ) {
        let mutations =
            vec![Mutation::new(column.parse().unwrap(), Bytes::copy_from_slice(value.as_bytes()))];
        service.mutate_row(table, row, &mutations, timestamp, &Attributes::new()).unwrap();
    }

    #[test]
    fn lifecycle_misuse_is_rejected() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();

        assert!(matches!(
            service.create_table("t", &families(&["data"])),
            Err(ServiceError::Remote { .. })
        ));
        // New tables are enabled; enabling again is an error.
        assert!(service.enable_table("t").is_err());
        // Deleting an enabled table is an error.
        assert!(service.delete_table("t").is_err());

        service.disable_table("t").unwrap();
        assert!(service.disable_table("t").is_err());
        service.delete_table("t").unwrap();
        assert!(service.is_table_enabled("t").is_err());
    }

    #[test]
    fn disabled_table_rejects_writes() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();
        service.disable_table("t").unwrap();

        let mutations = vec![Mutation::new("data:age".parse().unwrap(), &b"1"[..])];
        let err = service
            .mutate_row("t", b"r", &mutations, None, &Attributes::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Remote { .. }));
        assert!(service.scanner_open("t", ScanRange::From { start: Bytes::new() }, &[], &Attributes::new()).is_err());
    }

    #[test]
    fn unknown_family_rejected_before_any_write() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();

        let mutations = vec![
            Mutation::new("data:age".parse().unwrap(), &b"1"[..]),
            Mutation::new("ghost:x".parse().unwrap(), &b"2"[..]),
        ];
        assert!(service.mutate_row("t", b"r", &mutations, None, &Attributes::new()).is_err());
        // The valid first mutation must not have been applied.
        assert!(service
            .get_row("t", b"r", &[], &Attributes::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn empty_mutation_set_writes_nothing() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();

        service.mutate_row("t", b"r", &[], None, &Attributes::new()).unwrap();
        assert!(service
            .get_row("t", b"r", &[], &Attributes::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn version_retention_follows_family_descriptor() {
        let mut service = MemTableService::new();
        let family = vec![ColumnFamilyDescriptor::new("data").with_max_versions(2)];
        service.create_table("t", &family).unwrap();

        for (value, ts) in [("a", 1), ("b", 2), ("c", 3)] {
            put(&mut service, "t", b"r", "data:x", value, Some(ts));
        }
        let versions = service
            .get_row_versions("t", b"r", &[], 10, &Attributes::new())
            .unwrap();
        let column: ColumnKey = "data:x".parse().unwrap();
        let values = &versions[&column];
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].timestamp, 3);
        assert_eq!(values[1].timestamp, 2);
    }

    #[test]
    fn bounded_delete_keeps_newer_versions() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();
        for ts in [1, 2, 3] {
            put(&mut service, "t", b"r", "data:x", "v", Some(ts));
        }

        service
            .delete_cells("t", b"r", &["data:x".parse().unwrap()], Some(2), &Attributes::new())
            .unwrap();
        let column: ColumnKey = "data:x".parse().unwrap();
        let row = service.get_row("t", b"r", &[], &Attributes::new()).unwrap().unwrap();
        assert_eq!(row.columns[&column].timestamp, 3);

        // Unbounded delete removes the row entirely.
        service.delete_row("t", b"r", None, &Attributes::new()).unwrap();
        assert!(service.get_row("t", b"r", &[], &Attributes::new()).unwrap().is_none());
    }

    #[test]
    fn scanner_handles_are_tracked() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();

        let id = service
            .scanner_open("t", ScanRange::From { start: Bytes::new() }, &[], &Attributes::new())
            .unwrap();
        assert_eq!(service.open_scanner_count(), 1);
        service.scanner_close(id).unwrap();
        assert_eq!(service.open_scanner_count(), 0);
        assert!(service.scanner_close(id).is_err());
        assert!(service.scanner_next(id).is_err());
    }

    #[test]
    fn server_clock_stays_ahead_of_caller_timestamps() {
        let mut service = MemTableService::new();
        service.create_table("t", &families(&["data"])).unwrap();

        put(&mut service, "t", b"r", "data:x", "old", Some(100));
        put(&mut service, "t", b"r", "data:x", "new", None);

        let column: ColumnKey = "data:x".parse().unwrap();
        let row = service.get_row("t", b"r", &[], &Attributes::new()).unwrap().unwrap();
        let cell = &row.columns[&column];
        assert!(cell.timestamp > 100);
        assert_eq!(cell.value, Bytes::from_static(b"new"));
    }
}
