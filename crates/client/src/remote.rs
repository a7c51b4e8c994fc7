//! Framed-transport backend: [`RemoteClient`] and the server-side
//! [`dispatch`] inverse.
//!
//! A [`RemoteClient`] owns one blocking TCP session for its whole lifetime.
//! Each operation encodes one request frame, writes it, reads exactly one
//! response frame, and decodes it. There is no automatic reconnection: a
//! transport fault surfaces as [`ServiceError::Io`] and the client should be
//! discarded.

use crate::{ClientConfig, ServiceError, ServiceResult, TableService};
use bytes::Bytes;
use rowgrid_types::{
    wire::{self, Request, Response},
    Attributes, ColumnFamilyDescriptor, ColumnKey, ColumnValue, Mutation, RegionInfo, RowResult,
    ScanRange, ScannerId,
};
use std::{
    collections::BTreeMap,
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
};

/// A [`TableService`] backed by one framed TCP session.
#[derive(Debug)]
pub struct RemoteClient {
    stream: TcpStream,
}

impl RemoteClient {
    /// Open the transport session described by `config`.
    pub fn connect(config: &ClientConfig) -> ServiceResult<Self> {
        let stream = match config.connect_timeout {
            Some(timeout) => {
                let addr = (config.host.as_str(), config.port)
                    .to_socket_addrs()?
                    .next()
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::AddrNotAvailable,
                            "endpoint resolved to no addresses",
                        )
                    })?;
                TcpStream::connect_timeout(&addr, timeout)?
            }
            None => TcpStream::connect((config.host.as_str(), config.port))?,
        };
        stream.set_nodelay(true)?;
        if let Some(timeout) = config.call_timeout {
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
        }
        tracing::debug!(host = %config.host, port = config.port, "connected to table service");
        Ok(Self { stream })
    }

    /// One round trip: write a request frame, read a response frame.
    ///
    /// A [`Response::Error`] payload is converted to
    /// [`ServiceError::Remote`] here so callers only see success payloads.
    fn call(&mut self, request: &Request) -> ServiceResult<Response> {
        self.stream.write_all(&wire::frame(request.encode())?)?;

        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;
        let len = wire::frame_len(header)?;
        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload)?;

        let mut payload = Bytes::from(payload);
        match Response::decode(&mut payload)? {
            Response::Error(message) => Err(ServiceError::Remote { message }),
            response => Ok(response),
        }
    }
}

fn unexpected(expected: &'static str, got: Response) -> ServiceError {
    ServiceError::UnexpectedResponse { expected, got: got.kind() }
}

impl TableService for RemoteClient {
    fn table_names(&mut self) -> ServiceResult<Vec<String>> {
        match self.call(&Request::TableNames)? {
            Response::Names(names) => Ok(names),
            other => Err(unexpected("names", other)),
        }
    }

    fn create_table(
        &mut self,
        table: &str,
        families: &[ColumnFamilyDescriptor],
    ) -> ServiceResult<()> {
        let request = Request::CreateTable {
            table: table.to_string(),
            families: families.to_vec(),
        };
        match self.call(&request)? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn enable_table(&mut self, table: &str) -> ServiceResult<()> {
        match self.call(&Request::EnableTable { table: table.to_string() })? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn disable_table(&mut self, table: &str) -> ServiceResult<()> {
        match self.call(&Request::DisableTable { table: table.to_string() })? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn is_table_enabled(&mut self, table: &str) -> ServiceResult<bool> {
        match self.call(&Request::IsTableEnabled { table: table.to_string() })? {
            Response::Bool(enabled) => Ok(enabled),
            other => Err(unexpected("bool", other)),
        }
    }

    fn table_regions(&mut self, table: &str) -> ServiceResult<Vec<RegionInfo>> {
        match self.call(&Request::TableRegions { table: table.to_string() })? {
            Response::Regions(regions) => Ok(regions),
            other => Err(unexpected("regions", other)),
        }
    }

    fn delete_table(&mut self, table: &str) -> ServiceResult<()> {
        match self.call(&Request::DeleteTable { table: table.to_string() })? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn column_descriptors(
        &mut self,
        table: &str,
    ) -> ServiceResult<BTreeMap<String, ColumnFamilyDescriptor>> {
        match self.call(&Request::ColumnDescriptors { table: table.to_string() })? {
            Response::Families(families) => Ok(families),
            other => Err(unexpected("families", other)),
        }
    }

    fn mutate_row(
        &mut self,
        table: &str,
        row: &[u8],
        mutations: &[Mutation],
        timestamp: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()> {
        let request = Request::MutateRow {
            table: table.to_string(),
            row: Bytes::copy_from_slice(row),
            mutations: mutations.to_vec(),
            timestamp,
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn get_row(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<Option<RowResult>> {
        let request = Request::GetRow {
            table: table.to_string(),
            row: Bytes::copy_from_slice(row),
            columns: columns.to_vec(),
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Row(result) => Ok(result),
            other => Err(unexpected("row", other)),
        }
    }

    fn get_row_versions(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        versions: u32,
        attributes: &Attributes,
    ) -> ServiceResult<BTreeMap<ColumnKey, Vec<ColumnValue>>> {
        let request = Request::GetRowVersions {
            table: table.to_string(),
            row: Bytes::copy_from_slice(row),
            columns: columns.to_vec(),
            versions,
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Versions(versions) => Ok(versions),
            other => Err(unexpected("versions", other)),
        }
    }

    fn delete_cells(
        &mut self,
        table: &str,
        row: &[u8],
        columns: &[ColumnKey],
        up_to: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()> {
        let request = Request::DeleteCells {
            table: table.to_string(),
            row: Bytes::copy_from_slice(row),
            columns: columns.to_vec(),
            up_to,
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn delete_row(
        &mut self,
        table: &str,
        row: &[u8],
        up_to: Option<u64>,
        attributes: &Attributes,
    ) -> ServiceResult<()> {
        let request = Request::DeleteRow {
            table: table.to_string(),
            row: Bytes::copy_from_slice(row),
            up_to,
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }

    fn scanner_open(
        &mut self,
        table: &str,
        range: ScanRange,
        columns: &[ColumnKey],
        attributes: &Attributes,
    ) -> ServiceResult<ScannerId> {
        let request = Request::ScannerOpen {
            table: table.to_string(),
            range,
            columns: columns.to_vec(),
            attributes: attributes.clone(),
        };
        match self.call(&request)? {
            Response::Scanner(scanner) => Ok(scanner),
            other => Err(unexpected("scanner", other)),
        }
    }

    fn scanner_next(&mut self, scanner: ScannerId) -> ServiceResult<Option<RowResult>> {
        match self.call(&Request::ScannerNext { scanner })? {
            Response::Row(result) => Ok(result),
            other => Err(unexpected("row", other)),
        }
    }

    fn scanner_close(&mut self, scanner: ScannerId) -> ServiceResult<()> {
        match self.call(&Request::ScannerClose { scanner })? {
            Response::Unit => Ok(()),
            other => Err(unexpected("unit", other)),
        }
    }
}

/// Execute one decoded request against a service, producing the response.
///
/// This is the server-side inverse of [`RemoteClient`]'s call path. Service
/// rejections become [`Response::Error`] payloads; the protocol itself never
/// fails a dispatch.
pub fn dispatch<S: TableService>(service: &mut S, request: Request) -> Response {
    let result = match request {
        Request::TableNames => service.table_names().map(Response::Names),
        Request::CreateTable { table, families } => {
            service.create_table(&table, &families).map(|()| Response::Unit)
        }
        Request::EnableTable { table } => service.enable_table(&table).map(|()| Response::Unit),
        Request::DisableTable { table } => service.disable_table(&table).map(|()| Response::Unit),
        Request::IsTableEnabled { table } => {
            service.is_table_enabled(&table).map(Response::Bool)
        }
        Request::TableRegions { table } => service.table_regions(&table).map(Response::Regions),
        Request::DeleteTable { table } => service.delete_table(&table).map(|()| Response::Unit),
        Request::ColumnDescriptors { table } => {
            service.column_descriptors(&table).map(Response::Families)
        }
        Request::MutateRow { table, row, mutations, timestamp, attributes } => service
            .mutate_row(&table, &row, &mutations, timestamp, &attributes)
            .map(|()| Response::Unit),
        Request::GetRow { table, row, columns, attributes } => {
            service.get_row(&table, &row, &columns, &attributes).map(Response::Row)
        }
        Request::GetRowVersions { table, row, columns, versions, attributes } => service
            .get_row_versions(&table, &row, &columns, versions, &attributes)
            .map(Response::Versions),
        Request::DeleteCells { table, row, columns, up_to, attributes } => service
            .delete_cells(&table, &row, &columns, up_to, &attributes)
            .map(|()| Response::Unit),
        Request::DeleteRow { table, row, up_to, attributes } => service
            .delete_row(&table, &row, up_to, &attributes)
            .map(|()| Response::Unit),
        Request::ScannerOpen { table, range, columns, attributes } => service
            .scanner_open(&table, range, &columns, &attributes)
            .map(Response::Scanner),
        Request::ScannerNext { scanner } => service.scanner_next(scanner).map(Response::Row),
        Request::ScannerClose { scanner } => {
            service.scanner_close(scanner).map(|()| Response::Unit)
        }
    };
    result.unwrap_or_else(|e| Response::Error(e.to_string()))
}

/// Serve the framed protocol on one connection until the peer disconnects.
///
/// Intended for loopback test harnesses and embedding; each request is
/// dispatched against `service` and answered with one response frame.
pub fn serve_connection<S: TableService>(
    service: &mut S,
    mut stream: TcpStream,
) -> ServiceResult<()> {
    loop {
        let mut header = [0u8; 4];
        match stream.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let len = wire::frame_len(header)?;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload)?;

        let mut payload = Bytes::from(payload);
        let request = Request::decode(&mut payload)?;
        let response = dispatch(service, request);
        stream.write_all(&wire::frame(response.encode())?)?;
    }
}
