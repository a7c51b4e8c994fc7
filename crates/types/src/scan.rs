//! Scanner addressing and handles.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Opaque request metadata passed through to the service.
///
/// Attributes never influence return values; they exist for service-side
/// concerns such as auditing or priority hints.
pub type Attributes = BTreeMap<String, Bytes>;

/// How a scanner addresses its row range. Exactly one mode per scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanRange {
    /// From `start` (inclusive) to the end of the table.
    From {
        /// First row key of the scan.
        start: Bytes,
    },
    /// From `start` (inclusive) to `end` (exclusive). `end == start` is an
    /// empty scan, not an error.
    Between {
        /// First row key of the scan.
        start: Bytes,
        /// Exclusive upper bound.
        end: Bytes,
    },
    /// All rows whose key begins with `prefix`.
    Prefix {
        /// The key prefix.
        prefix: Bytes,
    },
}

impl ScanRange {
    /// The smallest row key that could be yielded by this range.
    pub fn lower_bound(&self) -> &Bytes {
        match self {
            Self::From { start } | Self::Between { start, .. } => start,
            Self::Prefix { prefix } => prefix,
        }
    }

    /// True once `key` lies beyond the range. Keys ascend during a scan, so
    /// the first past-the-end key terminates iteration.
    pub fn is_past(&self, key: &[u8]) -> bool {
        match self {
            Self::From { .. } => false,
            Self::Between { end, .. } => key >= end.as_ref(),
            Self::Prefix { prefix } => !key.starts_with(prefix),
        }
    }
}

/// Opaque identifier for server-side iteration state.
///
/// A handle is consumed by at most one cursor; advancing the same handle from
/// two places is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScannerId(u64);

impl ScannerId {
    /// Create a scanner id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn open_range_never_ends() {
        let range = ScanRange::From { start: b("3") };
        assert!(!range.is_past(b"9999"));
    }

    #[test]
    fn bounded_range_is_end_exclusive() {
        let range = ScanRange::Between { start: b("3"), end: b("5") };
        assert!(!range.is_past(b"4"));
        assert!(range.is_past(b"5"));
        assert!(range.is_past(b"6"));
    }

    #[test]
    fn prefix_ends_at_first_mismatch() {
        let range = ScanRange::Prefix { prefix: b("a") };
        assert!(!range.is_past(b"apple"));
        assert!(range.is_past(b"banana"));
    }
}
