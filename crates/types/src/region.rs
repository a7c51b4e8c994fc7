//! Region descriptors.
//!
//! Regions are opaque pass-through structures: the client reports what the
//! service says and makes no decisions based on them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Location and key range of one table region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// First row key of the region (inclusive). Empty for the table start.
    pub start_key: Bytes,
    /// End row key of the region (exclusive). Empty for the table end.
    pub end_key: Bytes,
    /// Region id.
    pub id: u64,
    /// Region name.
    pub name: String,
    /// Region version.
    pub version: u8,
    /// Host serving the region.
    pub server_host: String,
    /// Port of the serving host.
    pub server_port: u16,
}
