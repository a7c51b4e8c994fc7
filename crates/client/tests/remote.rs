//! Integration tests for [`RemoteClient`] against a loopback server.
//!
//! The server side is the in-memory service behind `serve_connection`, so
//! these tests exercise the full wire protocol in both directions.

use rowgrid_client::{
    conformance::conformance, mem::MemTableService, serve_connection, ClientConfig, ServiceError,
    TableClient,
};
use rowgrid_types::ColumnFamilyDescriptor;
use std::{
    net::TcpListener,
    thread::{self, JoinHandle},
};

/// Serve one connection on an ephemeral port, returning the client config
/// for it and the server thread handle.
fn loopback_server() -> (ClientConfig, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut service = MemTableService::new();
        serve_connection(&mut service, stream).unwrap();
    });
    (ClientConfig::new(addr.ip().to_string(), addr.port()), handle)
}

#[test]
fn remote_client_conformance() {
    let (config, server) = loopback_server();
    let mut client = TableClient::connect(&config).unwrap();
    conformance(&mut client).unwrap();
    drop(client);
    server.join().unwrap();
}

#[test]
fn remote_errors_carry_the_service_message() {
    let (config, server) = loopback_server();
    let mut client = TableClient::connect(&config).unwrap();

    let families = [ColumnFamilyDescriptor::new("data")];
    client.create_table("dup", &families).unwrap();
    let err = client.create_table("dup", &families).unwrap_err();
    match err {
        ServiceError::Remote { message } => assert!(message.contains("already exists")),
        other => panic!("expected remote error, got {other:?}"),
    }

    drop(client);
    server.join().unwrap();
}
