//! Lazy, forward-only scan cursor over a server-side scanner handle.
//!
//! A [`ScanCursor`] owns one [`ScannerId`] for its whole life: it is created
//! with the handle already open, performs one remote fetch per advancement,
//! and releases the handle when iteration ends. Release happens on
//! exhaustion, on an explicit [`close`](ScanCursor::close), and as a best
//! effort on drop, so abandoning a scan early does not leak server-side
//! state.

use crate::{ServiceResult, TableService};
use bytes::Bytes;
use rowgrid_types::{ColumnKey, RowResult, ScannerId};
use std::collections::BTreeMap;

/// One scanned row: the row key and the latest value of each selected
/// column. Per-column timestamps are not part of the scan view; use
/// [`TableService::get_row`] for timestamped cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRow {
    /// The row key.
    pub key: Bytes,
    /// Selected columns and their raw values.
    pub columns: BTreeMap<ColumnKey, Bytes>,
}

impl From<RowResult> for ScanRow {
    fn from(row: RowResult) -> Self {
        let columns = row.columns.into_iter().map(|(k, v)| (k, v.value)).collect();
        Self { key: row.key, columns }
    }
}

/// Cursor over a server-side scanner.
///
/// Yields rows in ascending row-key order, one remote fetch per step, and
/// holds at most one row at a time. The cursor is fused: after exhaustion or
/// an error it yields nothing further.
#[derive(Debug)]
pub struct ScanCursor<'c, S: TableService> {
    service: &'c mut S,
    /// The open handle. `None` once released.
    scanner: Option<ScannerId>,
}

impl<'c, S: TableService> ScanCursor<'c, S> {
    pub(crate) fn new(service: &'c mut S, scanner: ScannerId) -> Self {
        Self { service, scanner: Some(scanner) }
    }

    /// Release the scanner handle now.
    ///
    /// Idempotent: closing an already-released cursor is a no-op. Prefer
    /// this over relying on drop when the release outcome matters.
    pub fn close(&mut self) -> ServiceResult<()> {
        match self.scanner.take() {
            Some(scanner) => self.service.scanner_close(scanner),
            None => Ok(()),
        }
    }
}

impl<S: TableService> Iterator for ScanCursor<'_, S> {
    type Item = ServiceResult<ScanRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let scanner = self.scanner?;
        match self.service.scanner_next(scanner) {
            Ok(Some(row)) => Some(Ok(row.into())),
            Ok(None) => {
                // Exhausted: release the handle eagerly. The sequence has
                // already terminated cleanly, so a failed release is only
                // worth a warning.
                self.scanner = None;
                if let Err(error) = self.service.scanner_close(scanner) {
                    tracing::warn!(%scanner, %error, "failed to close exhausted scanner");
                }
                None
            }
            Err(error) => {
                // Fused after an error. Release is best effort; the
                // transport may already be unusable.
                self.scanner = None;
                let _ = self.service.scanner_close(scanner);
                Some(Err(error))
            }
        }
    }
}

impl<S: TableService> std::iter::FusedIterator for ScanCursor<'_, S> {}

impl<S: TableService> Drop for ScanCursor<'_, S> {
    fn drop(&mut self) {
        if let Some(scanner) = self.scanner.take() {
            if let Err(error) = self.service.scanner_close(scanner) {
                tracing::warn!(%scanner, %error, "failed to release abandoned scanner");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mem::MemTableService, ServiceError, TableClient};
    use rowgrid_types::ColumnFamilyDescriptor;

    /// Client over a fresh service with rows "1".."5" in table `t`.
    fn seeded_client() -> TableClient<MemTableService> {
        let mut client = TableClient::new(MemTableService::new());
        client.create_table("t", &[ColumnFamilyDescriptor::new("data")]).unwrap();
        for key in ["1", "2", "3", "4", "5"] {
            let mut columns = BTreeMap::new();
            columns.insert("data:v".parse().unwrap(), Bytes::copy_from_slice(key.as_bytes()));
            client.put_row("t", key.as_bytes(), &columns).unwrap();
        }
        client
    }

    fn keys(rows: Vec<ScanRow>) -> Vec<Bytes> {
        rows.into_iter().map(|r| r.key).collect()
    }

    #[test]
    fn start_row_scan_yields_tail_in_order() {
        let mut client = seeded_client();
        let rows: Vec<_> = client
            .scan("t", &b"3"[..])
            .unwrap()
            .collect::<ServiceResult<_>>()
            .unwrap();
        assert_eq!(keys(rows), vec!["3", "4", "5"]);
        // Exhaustion released the handle.
        assert_eq!(client.service().open_scanner_count(), 0);
    }

    #[test]
    fn cursor_is_fused_after_exhaustion() {
        let mut client = seeded_client();
        let mut cursor = client.scan("t", &b"5"[..]).unwrap();
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn early_drop_releases_the_handle() {
        let mut client = seeded_client();
        {
            let mut cursor = client.scan("t", &b"1"[..]).unwrap();
            let first = cursor.next().unwrap().unwrap();
            assert_eq!(first.key, Bytes::from_static(b"1"));
            // Dropped here with four rows unread.
        }
        assert_eq!(client.service().open_scanner_count(), 0);
    }

    #[test]
    fn explicit_close_is_idempotent() {
        let mut client = seeded_client();
        let mut cursor = client.scan("t", &b"1"[..]).unwrap();
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.next().is_none());
        drop(cursor);
        assert_eq!(client.service().open_scanner_count(), 0);
    }

    #[test]
    fn fetch_error_propagates_then_fuses() {
        let mut service = MemTableService::new();
        // A handle the service never issued, so the first fetch fails.
        let mut cursor = ScanCursor::new(&mut service, ScannerId::new(42));
        assert!(matches!(cursor.next(), Some(Err(ServiceError::Remote { .. }))));
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn scan_view_drops_timestamps_but_keeps_keys() {
        let mut client = seeded_client();
        let row = client
            .scan("t", &b"2"[..])
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.key, Bytes::from_static(b"2"));
        let column: ColumnKey = "data:v".parse().unwrap();
        assert_eq!(row.columns[&column], Bytes::from_static(b"2"));
    }
}
