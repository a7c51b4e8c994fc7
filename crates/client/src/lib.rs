//! Client library for the RowGrid table service.
//!
//! This crate is a convenience layer over the table service's remote
//! procedure interface: table lifecycle, single-row mutation and retrieval,
//! prefix/range scanning, and deletion, each translated into one call over a
//! length-framed binary transport.
//!
//! # Overview
//!
//! The [`TableService`] trait is the remote operation set — one method per
//! round trip. [`RemoteClient`] implements it over one blocking TCP session;
//! [`MemTableService`](mem::MemTableService) implements it in memory for
//! tests. [`TableClient`] wraps either with the ergonomic surface, and
//! [`ScanCursor`] is the lazy row sequence backed by a server-side scanner
//! handle.
//!
//! # Quick Start
//!
//! ```no_run
//! use rowgrid_client::{ClientConfig, TableClient};
//! use rowgrid_types::ColumnFamilyDescriptor;
//!
//! # fn main() -> rowgrid_client::ServiceResult<()> {
//! let config: ClientConfig = "grid.internal:9090".parse().unwrap();
//! let mut client = TableClient::connect(&config)?;
//!
//! client.create_table("users", &[ColumnFamilyDescriptor::new("name")])?;
//! for row in client.scan_prefix("users", b"a")? {
//!     let row = row?;
//!     println!("{:?} -> {} columns", row.key, row.columns.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Scans
//!
//! A [`ScanCursor`] performs one remote fetch per advancement and holds one
//! row at a time, so memory use is bounded by a single row's column set
//! regardless of scan size. The cursor releases its server-side handle on
//! exhaustion, on [`close`](ScanCursor::close), and on drop; abandoning a
//! scan early does not leak the handle.
//!
//! # Sessions
//!
//! One transport session per client, opened at construction, blocking, with
//! no automatic reconnection. Calls are strictly sequential; there is no
//! internal concurrency.

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

mod client;
pub use client::TableClient;

pub mod config;
pub use config::{ClientConfig, ConfigError, ENV_ADDR, ENV_CALL_TIMEOUT_MS, ENV_CONNECT_TIMEOUT_MS};

pub mod conformance;

mod error;
pub use error::{ServiceError, ServiceResult};

pub mod mem;

mod remote;
pub use remote::{dispatch, serve_connection, RemoteClient};

mod scan;
pub use scan::{ScanCursor, ScanRow};

mod service;
pub use service::TableService;
