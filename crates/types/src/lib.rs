//! Types used by the RowGrid client crates.
//!
//! These are the low-level types shared between the client layers: the row
//! and column data model, scanner addressing, and the wire codec for the
//! length-framed binary protocol.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod column;
pub use column::{
    ColumnFamilyDescriptor, ColumnKey, ColumnValue, InvalidColumn, DEFAULT_MAX_VERSIONS,
};

mod row;
pub use row::{Mutation, RowResult};

mod region;
pub use region::RegionInfo;

mod scan;
pub use scan::{Attributes, ScanRange, ScannerId};

pub mod wire;
pub use wire::WireError;
