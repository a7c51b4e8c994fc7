//! Length-framed binary codec for the table-service protocol.
//!
//! Every frame on the wire is a `u32` big-endian payload length followed by
//! the payload. A request payload is a method tag byte followed by the
//! method's fields; a response payload is a response tag byte (tag `0` is a
//! remote error) followed by the result fields.
//!
//! Field primitives are big-endian integers, length-prefixed blobs, UTF-8
//! validated strings, presence-byte options, and count-prefixed lists and
//! maps. Both directions are implemented for every message so in-process
//! harnesses can serve the protocol.

use crate::{
    Attributes, ColumnFamilyDescriptor, ColumnKey, ColumnValue, InvalidColumn, Mutation,
    RegionInfo, RowResult, ScanRange, ScannerId,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;

/// Maximum accepted payload length. Guards against hostile frame headers.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Error type for frame and payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Not enough data to complete decoding.
    #[error("insufficient data: needed {needed} bytes, but only {available} available")]
    InsufficientData {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Decoding ended with extra bytes remaining.
    #[error("inexact decode: {extra_bytes} extra bytes remaining")]
    Trailing {
        /// Number of extra bytes remaining.
        extra_bytes: usize,
    },

    /// An unrecognized tag byte.
    #[error("unknown {context} tag: {tag}")]
    UnknownTag {
        /// What was being decoded.
        context: &'static str,
        /// The offending tag byte.
        tag: u8,
    },

    /// A string field was not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// The frame header declared a payload larger than [`MAX_FRAME_SIZE`].
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Declared payload length.
        len: usize,
        /// The limit.
        max: usize,
    },

    /// A column identifier on the wire failed validation.
    #[error(transparent)]
    Column(#[from] InvalidColumn),
}

/// Prepend the length header to a payload, producing one complete frame.
///
/// Enforces [`MAX_FRAME_SIZE`] on the encode side too, so an oversized
/// payload fails here instead of truncating the length header.
pub fn frame(payload: Bytes) -> Result<Bytes, WireError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge { len: payload.len(), max: MAX_FRAME_SIZE });
    }
    let mut out = BytesMut::with_capacity(4 + payload.len());
    out.put_u32(payload.len() as u32);
    out.put_slice(&payload);
    Ok(out.freeze())
}

/// Parse a frame header into a payload length, enforcing [`MAX_FRAME_SIZE`].
pub fn frame_len(header: [u8; 4]) -> Result<usize, WireError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge { len, max: MAX_FRAME_SIZE });
    }
    Ok(len)
}

/// A request to the table service. One variant per remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// List all table names.
    TableNames,
    /// Create a table with the given column families.
    CreateTable {
        /// Table name.
        table: String,
        /// Column-family descriptors.
        families: Vec<ColumnFamilyDescriptor>,
    },
    /// Enable a table.
    EnableTable {
        /// Table name.
        table: String,
    },
    /// Disable a table.
    DisableTable {
        /// Table name.
        table: String,
    },
    /// Query a table's enabled flag.
    IsTableEnabled {
        /// Table name.
        table: String,
    },
    /// List a table's regions.
    TableRegions {
        /// Table name.
        table: String,
    },
    /// Delete a (disabled) table.
    DeleteTable {
        /// Table name.
        table: String,
    },
    /// Describe a table's column families.
    ColumnDescriptors {
        /// Table name.
        table: String,
    },
    /// Apply column writes to one row.
    MutateRow {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Column writes.
        mutations: Vec<Mutation>,
        /// Caller-assigned timestamp, or `None` for server-assigned.
        timestamp: Option<u64>,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Read the latest version of selected columns in one row.
    GetRow {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Column selectors. Empty selects all columns.
        columns: Vec<ColumnKey>,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Read up to `versions` most-recent versions of selected columns.
    GetRowVersions {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Column selectors. Empty selects all columns.
        columns: Vec<ColumnKey>,
        /// Maximum versions per column.
        versions: u32,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Delete versions of selected columns in one row.
    DeleteCells {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Column selectors.
        columns: Vec<ColumnKey>,
        /// Delete only versions at or before this timestamp, if set.
        up_to: Option<u64>,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Delete a whole row.
    DeleteRow {
        /// Table name.
        table: String,
        /// Row key.
        row: Bytes,
        /// Delete only versions at or before this timestamp, if set.
        up_to: Option<u64>,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Open a server-side scanner.
    ScannerOpen {
        /// Table name.
        table: String,
        /// Addressing mode.
        range: ScanRange,
        /// Column selectors. Empty selects all columns.
        columns: Vec<ColumnKey>,
        /// Pass-through request metadata.
        attributes: Attributes,
    },
    /// Fetch the next row from an open scanner.
    ScannerNext {
        /// The scanner handle.
        scanner: ScannerId,
    },
    /// Release an open scanner.
    ScannerClose {
        /// The scanner handle.
        scanner: ScannerId,
    },
}

// Request method tags.
const REQ_TABLE_NAMES: u8 = 0x01;
const REQ_CREATE_TABLE: u8 = 0x02;
const REQ_ENABLE_TABLE: u8 = 0x03;
const REQ_DISABLE_TABLE: u8 = 0x04;
const REQ_IS_TABLE_ENABLED: u8 = 0x05;
const REQ_TABLE_REGIONS: u8 = 0x06;
const REQ_DELETE_TABLE: u8 = 0x07;
const REQ_COLUMN_DESCRIPTORS: u8 = 0x08;
const REQ_MUTATE_ROW: u8 = 0x09;
const REQ_GET_ROW: u8 = 0x0a;
const REQ_GET_ROW_VERSIONS: u8 = 0x0b;
const REQ_DELETE_CELLS: u8 = 0x0c;
const REQ_DELETE_ROW: u8 = 0x0d;
const REQ_SCANNER_OPEN: u8 = 0x0e;
const REQ_SCANNER_NEXT: u8 = 0x0f;
const REQ_SCANNER_CLOSE: u8 = 0x10;

impl Request {
    /// Encode this request into a payload (unframed).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::TableNames => buf.put_u8(REQ_TABLE_NAMES),
            Self::CreateTable { table, families } => {
                buf.put_u8(REQ_CREATE_TABLE);
                put_str(&mut buf, table);
                buf.put_u32(families.len() as u32);
                for family in families {
                    put_family(&mut buf, family);
                }
            }
            Self::EnableTable { table } => {
                buf.put_u8(REQ_ENABLE_TABLE);
                put_str(&mut buf, table);
            }
            Self::DisableTable { table } => {
                buf.put_u8(REQ_DISABLE_TABLE);
                put_str(&mut buf, table);
            }
            Self::IsTableEnabled { table } => {
                buf.put_u8(REQ_IS_TABLE_ENABLED);
                put_str(&mut buf, table);
            }
            Self::TableRegions { table } => {
                buf.put_u8(REQ_TABLE_REGIONS);
                put_str(&mut buf, table);
            }
            Self::DeleteTable { table } => {
                buf.put_u8(REQ_DELETE_TABLE);
                put_str(&mut buf, table);
            }
            Self::ColumnDescriptors { table } => {
                buf.put_u8(REQ_COLUMN_DESCRIPTORS);
                put_str(&mut buf, table);
            }
            Self::MutateRow { table, row, mutations, timestamp, attributes } => {
                buf.put_u8(REQ_MUTATE_ROW);
                put_str(&mut buf, table);
                put_blob(&mut buf, row);
                buf.put_u32(mutations.len() as u32);
                for mutation in mutations {
                    put_column(&mut buf, &mutation.column);
                    put_blob(&mut buf, &mutation.value);
                }
                put_opt_u64(&mut buf, *timestamp);
                put_attributes(&mut buf, attributes);
            }
            Self::GetRow { table, row, columns, attributes } => {
                buf.put_u8(REQ_GET_ROW);
                put_str(&mut buf, table);
                put_blob(&mut buf, row);
                put_columns(&mut buf, columns);
                put_attributes(&mut buf, attributes);
            }
            Self::GetRowVersions { table, row, columns, versions, attributes } => {
                buf.put_u8(REQ_GET_ROW_VERSIONS);
                put_str(&mut buf, table);
                put_blob(&mut buf, row);
                put_columns(&mut buf, columns);
                buf.put_u32(*versions);
                put_attributes(&mut buf, attributes);
            }
            Self::DeleteCells { table, row, columns, up_to, attributes } => {
                buf.put_u8(REQ_DELETE_CELLS);
                put_str(&mut buf, table);
                put_blob(&mut buf, row);
                put_columns(&mut buf, columns);
                put_opt_u64(&mut buf, *up_to);
                put_attributes(&mut buf, attributes);
            }
            Self::DeleteRow { table, row, up_to, attributes } => {
                buf.put_u8(REQ_DELETE_ROW);
                put_str(&mut buf, table);
                put_blob(&mut buf, row);
                put_opt_u64(&mut buf, *up_to);
                put_attributes(&mut buf, attributes);
            }
            Self::ScannerOpen { table, range, columns, attributes } => {
                buf.put_u8(REQ_SCANNER_OPEN);
                put_str(&mut buf, table);
                put_range(&mut buf, range);
                put_columns(&mut buf, columns);
                put_attributes(&mut buf, attributes);
            }
            Self::ScannerNext { scanner } => {
                buf.put_u8(REQ_SCANNER_NEXT);
                buf.put_u64(scanner.raw());
            }
            Self::ScannerClose { scanner } => {
                buf.put_u8(REQ_SCANNER_CLOSE);
                buf.put_u64(scanner.raw());
            }
        }
        buf.freeze()
    }

    /// Decode a request from a complete payload, consuming it exactly.
    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        let tag = get_u8(buf)?;
        let request = match tag {
            REQ_TABLE_NAMES => Self::TableNames,
            REQ_CREATE_TABLE => {
                let table = get_str(buf)?;
                let count = get_u32(buf)? as usize;
                let mut families = Vec::with_capacity(count);
                for _ in 0..count {
                    families.push(get_family(buf)?);
                }
                Self::CreateTable { table, families }
            }
            REQ_ENABLE_TABLE => Self::EnableTable { table: get_str(buf)? },
            REQ_DISABLE_TABLE => Self::DisableTable { table: get_str(buf)? },
            REQ_IS_TABLE_ENABLED => Self::IsTableEnabled { table: get_str(buf)? },
            REQ_TABLE_REGIONS => Self::TableRegions { table: get_str(buf)? },
            REQ_DELETE_TABLE => Self::DeleteTable { table: get_str(buf)? },
            REQ_COLUMN_DESCRIPTORS => Self::ColumnDescriptors { table: get_str(buf)? },
            REQ_MUTATE_ROW => {
                let table = get_str(buf)?;
                let row = get_blob(buf)?;
                let count = get_u32(buf)? as usize;
                let mut mutations = Vec::with_capacity(count);
                for _ in 0..count {
                    let column = get_column(buf)?;
                    let value = get_blob(buf)?;
                    mutations.push(Mutation { column, value });
                }
                let timestamp = get_opt_u64(buf)?;
                let attributes = get_attributes(buf)?;
                Self::MutateRow { table, row, mutations, timestamp, attributes }
            }
            REQ_GET_ROW => {
                let table = get_str(buf)?;
                let row = get_blob(buf)?;
                let columns = get_columns(buf)?;
                let attributes = get_attributes(buf)?;
                Self::GetRow { table, row, columns, attributes }
            }
            REQ_GET_ROW_VERSIONS => {
                let table = get_str(buf)?;
                let row = get_blob(buf)?;
                let columns = get_columns(buf)?;
                let versions = get_u32(buf)?;
                let attributes = get_attributes(buf)?;
                Self::GetRowVersions { table, row, columns, versions, attributes }
            }
            REQ_DELETE_CELLS => {
                let table = get_str(buf)?;
                let row = get_blob(buf)?;
                let columns = get_columns(buf)?;
                let up_to = get_opt_u64(buf)?;
                let attributes = get_attributes(buf)?;
                Self::DeleteCells { table, row, columns, up_to, attributes }
            }
            REQ_DELETE_ROW => {
                let table = get_str(buf)?;
                let row = get_blob(buf)?;
                let up_to = get_opt_u64(buf)?;
                let attributes = get_attributes(buf)?;
                Self::DeleteRow { table, row, up_to, attributes }
            }
            REQ_SCANNER_OPEN => {
                let table = get_str(buf)?;
                let range = get_range(buf)?;
                let columns = get_columns(buf)?;
                let attributes = get_attributes(buf)?;
                Self::ScannerOpen { table, range, columns, attributes }
            }
            REQ_SCANNER_NEXT => Self::ScannerNext { scanner: ScannerId::new(get_u64(buf)?) },
            REQ_SCANNER_CLOSE => Self::ScannerClose { scanner: ScannerId::new(get_u64(buf)?) },
            tag => return Err(WireError::UnknownTag { context: "request", tag }),
        };
        finish(buf)?;
        Ok(request)
    }
}

/// A response from the table service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The service rejected or failed the operation.
    Error(String),
    /// Success with no payload.
    Unit,
    /// A boolean result.
    Bool(bool),
    /// An ordered list of names.
    Names(Vec<String>),
    /// An ordered list of region descriptors.
    Regions(Vec<RegionInfo>),
    /// Column-family descriptors by family name.
    Families(BTreeMap<String, ColumnFamilyDescriptor>),
    /// A row, or `None` if the row is absent (also used for scanner fetches,
    /// where `None` signals exhaustion).
    Row(Option<RowResult>),
    /// Versioned column values, most-recent-first.
    Versions(BTreeMap<ColumnKey, Vec<ColumnValue>>),
    /// A freshly opened scanner handle.
    Scanner(ScannerId),
}

const RESP_ERROR: u8 = 0x00;
const RESP_UNIT: u8 = 0x01;
const RESP_BOOL: u8 = 0x02;
const RESP_NAMES: u8 = 0x03;
const RESP_REGIONS: u8 = 0x04;
const RESP_FAMILIES: u8 = 0x05;
const RESP_ROW: u8 = 0x06;
const RESP_VERSIONS: u8 = 0x07;
const RESP_SCANNER: u8 = 0x08;

impl Response {
    /// Short name of the payload variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Names(_) => "names",
            Self::Regions(_) => "regions",
            Self::Families(_) => "families",
            Self::Row(_) => "row",
            Self::Versions(_) => "versions",
            Self::Scanner(_) => "scanner",
        }
    }

    /// Encode this response into a payload (unframed).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::Error(message) => {
                buf.put_u8(RESP_ERROR);
                put_str(&mut buf, message);
            }
            Self::Unit => buf.put_u8(RESP_UNIT),
            Self::Bool(value) => {
                buf.put_u8(RESP_BOOL);
                buf.put_u8(u8::from(*value));
            }
            Self::Names(names) => {
                buf.put_u8(RESP_NAMES);
                buf.put_u32(names.len() as u32);
                for name in names {
                    put_str(&mut buf, name);
                }
            }
            Self::Regions(regions) => {
                buf.put_u8(RESP_REGIONS);
                buf.put_u32(regions.len() as u32);
                for region in regions {
                    put_region(&mut buf, region);
                }
            }
            Self::Families(families) => {
                buf.put_u8(RESP_FAMILIES);
                buf.put_u32(families.len() as u32);
                for (name, family) in families {
                    put_str(&mut buf, name);
                    put_family(&mut buf, family);
                }
            }
            Self::Row(row) => {
                buf.put_u8(RESP_ROW);
                match row {
                    Some(row) => {
                        buf.put_u8(1);
                        put_row(&mut buf, row);
                    }
                    None => buf.put_u8(0),
                }
            }
            Self::Versions(versions) => {
                buf.put_u8(RESP_VERSIONS);
                buf.put_u32(versions.len() as u32);
                for (column, values) in versions {
                    put_column(&mut buf, column);
                    buf.put_u32(values.len() as u32);
                    for value in values {
                        put_value(&mut buf, value);
                    }
                }
            }
            Self::Scanner(scanner) => {
                buf.put_u8(RESP_SCANNER);
                buf.put_u64(scanner.raw());
            }
        }
        buf.freeze()
    }

    /// Decode a response from a complete payload, consuming it exactly.
    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        let tag = get_u8(buf)?;
        let response = match tag {
            RESP_ERROR => Self::Error(get_str(buf)?),
            RESP_UNIT => Self::Unit,
            RESP_BOOL => Self::Bool(get_u8(buf)? != 0),
            RESP_NAMES => {
                let count = get_u32(buf)? as usize;
                let mut names = Vec::with_capacity(count);
                for _ in 0..count {
                    names.push(get_str(buf)?);
                }
                Self::Names(names)
            }
            RESP_REGIONS => {
                let count = get_u32(buf)? as usize;
                let mut regions = Vec::with_capacity(count);
                for _ in 0..count {
                    regions.push(get_region(buf)?);
                }
                Self::Regions(regions)
            }
            RESP_FAMILIES => {
                let count = get_u32(buf)? as usize;
                let mut families = BTreeMap::new();
                for _ in 0..count {
                    let name = get_str(buf)?;
                    families.insert(name, get_family(buf)?);
                }
                Self::Families(families)
            }
            RESP_ROW => match get_u8(buf)? {
                0 => Self::Row(None),
                _ => Self::Row(Some(get_row(buf)?)),
            },
            RESP_VERSIONS => {
                let count = get_u32(buf)? as usize;
                let mut versions = BTreeMap::new();
                for _ in 0..count {
                    let column = get_column(buf)?;
                    let value_count = get_u32(buf)? as usize;
                    let mut values = Vec::with_capacity(value_count);
                    for _ in 0..value_count {
                        values.push(get_value(buf)?);
                    }
                    versions.insert(column, values);
                }
                Self::Versions(versions)
            }
            RESP_SCANNER => Self::Scanner(ScannerId::new(get_u64(buf)?)),
            tag => return Err(WireError::UnknownTag { context: "response", tag }),
        };
        finish(buf)?;
        Ok(response)
    }
}

// --- field primitives ---

fn need(buf: &Bytes, needed: usize) -> Result<(), WireError> {
    let available = buf.remaining();
    if available < needed {
        return Err(WireError::InsufficientData { needed, available });
    }
    Ok(())
}

fn finish(buf: &Bytes) -> Result<(), WireError> {
    if buf.has_remaining() {
        return Err(WireError::Trailing { extra_bytes: buf.remaining() });
    }
    Ok(())
}

fn get_u8(buf: &mut Bytes) -> Result<u8, WireError> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut Bytes) -> Result<u16, WireError> {
    need(buf, 2)?;
    Ok(buf.get_u16())
}

fn get_u32(buf: &mut Bytes) -> Result<u32, WireError> {
    need(buf, 4)?;
    Ok(buf.get_u32())
}

fn get_u64(buf: &mut Bytes) -> Result<u64, WireError> {
    need(buf, 8)?;
    Ok(buf.get_u64())
}

fn put_blob(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u32(data.len() as u32);
    buf.put_slice(data);
}

fn get_blob(buf: &mut Bytes) -> Result<Bytes, WireError> {
    let len = get_u32(buf)? as usize;
    need(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

fn put_str(buf: &mut BytesMut, s: &str) {
    put_blob(buf, s.as_bytes());
}

fn get_str(buf: &mut Bytes) -> Result<String, WireError> {
    let blob = get_blob(buf)?;
    String::from_utf8(blob.to_vec()).map_err(|_| WireError::InvalidUtf8)
}

fn put_opt_u64(buf: &mut BytesMut, value: Option<u64>) {
    match value {
        Some(v) => {
            buf.put_u8(1);
            buf.put_u64(v);
        }
        None => buf.put_u8(0),
    }
}

fn get_opt_u64(buf: &mut Bytes) -> Result<Option<u64>, WireError> {
    match get_u8(buf)? {
        0 => Ok(None),
        _ => Ok(Some(get_u64(buf)?)),
    }
}

fn get_opt_u32(buf: &mut Bytes) -> Result<Option<u32>, WireError> {
    match get_u8(buf)? {
        0 => Ok(None),
        _ => Ok(Some(get_u32(buf)?)),
    }
}

fn put_column(buf: &mut BytesMut, column: &ColumnKey) {
    put_str(buf, column.family());
    put_str(buf, column.qualifier());
}

fn get_column(buf: &mut Bytes) -> Result<ColumnKey, WireError> {
    let family = get_str(buf)?;
    let qualifier = get_str(buf)?;
    Ok(ColumnKey::new(family, qualifier)?)
}

fn put_columns(buf: &mut BytesMut, columns: &[ColumnKey]) {
    buf.put_u32(columns.len() as u32);
    for column in columns {
        put_column(buf, column);
    }
}

fn get_columns(buf: &mut Bytes) -> Result<Vec<ColumnKey>, WireError> {
    let count = get_u32(buf)? as usize;
    let mut columns = Vec::with_capacity(count);
    for _ in 0..count {
        columns.push(get_column(buf)?);
    }
    Ok(columns)
}

fn put_attributes(buf: &mut BytesMut, attributes: &Attributes) {
    buf.put_u32(attributes.len() as u32);
    for (key, value) in attributes {
        put_str(buf, key);
        put_blob(buf, value);
    }
}

fn get_attributes(buf: &mut Bytes) -> Result<Attributes, WireError> {
    let count = get_u32(buf)? as usize;
    let mut attributes = Attributes::new();
    for _ in 0..count {
        let key = get_str(buf)?;
        attributes.insert(key, get_blob(buf)?);
    }
    Ok(attributes)
}

fn put_value(buf: &mut BytesMut, value: &ColumnValue) {
    put_blob(buf, &value.value);
    buf.put_u64(value.timestamp);
}

fn get_value(buf: &mut Bytes) -> Result<ColumnValue, WireError> {
    let value = get_blob(buf)?;
    let timestamp = get_u64(buf)?;
    Ok(ColumnValue { value, timestamp })
}

fn put_family(buf: &mut BytesMut, family: &ColumnFamilyDescriptor) {
    put_str(buf, &family.name);
    buf.put_u32(family.max_versions);
    buf.put_u8(u8::from(family.in_memory));
    match family.ttl_secs {
        Some(ttl) => {
            buf.put_u8(1);
            buf.put_u32(ttl);
        }
        None => buf.put_u8(0),
    }
}

fn get_family(buf: &mut Bytes) -> Result<ColumnFamilyDescriptor, WireError> {
    let name = get_str(buf)?;
    let max_versions = get_u32(buf)?;
    let in_memory = get_u8(buf)? != 0;
    let ttl_secs = get_opt_u32(buf)?;
    Ok(ColumnFamilyDescriptor { name, max_versions, in_memory, ttl_secs })
}

fn put_region(buf: &mut BytesMut, region: &RegionInfo) {
    put_blob(buf, &region.start_key);
    put_blob(buf, &region.end_key);
    buf.put_u64(region.id);
    put_str(buf, &region.name);
    buf.put_u8(region.version);
    put_str(buf, &region.server_host);
    buf.put_u16(region.server_port);
}

fn get_region(buf: &mut Bytes) -> Result<RegionInfo, WireError> {
    Ok(RegionInfo {
        start_key: get_blob(buf)?,
        end_key: get_blob(buf)?,
        id: get_u64(buf)?,
        name: get_str(buf)?,
        version: get_u8(buf)?,
        server_host: get_str(buf)?,
        server_port: get_u16(buf)?,
    })
}

fn put_row(buf: &mut BytesMut, row: &RowResult) {
    put_blob(buf, &row.key);
    buf.put_u32(row.columns.len() as u32);
    for (column, value) in &row.columns {
        put_column(buf, column);
        put_value(buf, value);
    }
}

fn get_row(buf: &mut Bytes) -> Result<RowResult, WireError> {
    let key = get_blob(buf)?;
    let count = get_u32(buf)? as usize;
    let mut columns = BTreeMap::new();
    for _ in 0..count {
        let column = get_column(buf)?;
        columns.insert(column, get_value(buf)?);
    }
    Ok(RowResult { key, columns })
}

const RANGE_FROM: u8 = 0x01;
const RANGE_BETWEEN: u8 = 0x02;
const RANGE_PREFIX: u8 = 0x03;

fn put_range(buf: &mut BytesMut, range: &ScanRange) {
    match range {
        ScanRange::From { start } => {
            buf.put_u8(RANGE_FROM);
            put_blob(buf, start);
        }
        ScanRange::Between { start, end } => {
            buf.put_u8(RANGE_BETWEEN);
            put_blob(buf, start);
            put_blob(buf, end);
        }
        ScanRange::Prefix { prefix } => {
            buf.put_u8(RANGE_PREFIX);
            put_blob(buf, prefix);
        }
    }
}

fn get_range(buf: &mut Bytes) -> Result<ScanRange, WireError> {
    match get_u8(buf)? {
        RANGE_FROM => Ok(ScanRange::From { start: get_blob(buf)? }),
        RANGE_BETWEEN => Ok(ScanRange::Between { start: get_blob(buf)?, end: get_blob(buf)? }),
        RANGE_PREFIX => Ok(ScanRange::Prefix { prefix: get_blob(buf)? }),
        tag => Err(WireError::UnknownTag { context: "scan range", tag }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_request(request: Request) {
        let mut payload = request.encode();
        let decoded = Request::decode(&mut payload).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn mutate_row_roundtrip() {
        let mut attributes = Attributes::new();
        attributes.insert("trace".to_string(), Bytes::from_static(b"abc"));
        roundtrip_request(Request::MutateRow {
            table: "test".to_string(),
            row: Bytes::from_static(b"3"),
            mutations: vec![
                Mutation::new("name:".parse().unwrap(), &b"wangwu"[..]),
                Mutation::new("data:age".parse().unwrap(), &b"55"[..]),
            ],
            timestamp: Some(7),
            attributes,
        });
    }

    #[test]
    fn scanner_open_roundtrip_all_ranges() {
        for range in [
            ScanRange::From { start: Bytes::from_static(b"3") },
            ScanRange::Between {
                start: Bytes::from_static(b"3"),
                end: Bytes::from_static(b"5"),
            },
            ScanRange::Prefix { prefix: Bytes::from_static(b"a") },
        ] {
            roundtrip_request(Request::ScannerOpen {
                table: "test".to_string(),
                range,
                columns: vec!["data".parse().unwrap()],
                attributes: Attributes::new(),
            });
        }
    }

    #[test]
    fn error_response_roundtrip() {
        let response = Response::Error("table test already exists".to_string());
        let mut payload = response.encode();
        assert_eq!(Response::decode(&mut payload).unwrap(), response);
    }

    #[test]
    fn truncated_payload_reports_shortfall() {
        let payload = Request::TableNames.encode();
        let mut truncated = Bytes::new();
        assert!(matches!(
            Request::decode(&mut truncated),
            Err(WireError::InsufficientData { needed: 1, available: 0 })
        ));
        // A valid payload with garbage appended must be rejected too.
        let mut extended = BytesMut::from(&payload[..]);
        extended.put_u8(0xff);
        let mut extended = extended.freeze();
        assert!(matches!(
            Request::decode(&mut extended),
            Err(WireError::Trailing { extra_bytes: 1 })
        ));
    }

    #[test]
    fn oversized_frame_header_rejected() {
        let header = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        assert!(matches!(frame_len(header), Err(WireError::FrameTooLarge { .. })));
        assert_eq!(frame_len(8u32.to_be_bytes()).unwrap(), 8);
    }

    #[test]
    fn oversized_payload_rejected_on_encode() {
        let payload = Bytes::from(vec![0u8; MAX_FRAME_SIZE + 1]);
        assert!(matches!(frame(payload), Err(WireError::FrameTooLarge { .. })));

        let framed = frame(Bytes::from_static(b"ok")).unwrap();
        assert_eq!(&framed[..4], &2u32.to_be_bytes());
        assert_eq!(&framed[4..], b"ok");
    }
}
