//! Conformance tests for the in-memory table service.

use rowgrid_client::{conformance::conformance, mem::MemTableService, TableClient};

#[test]
fn mem_service_conformance() {
    let mut client = TableClient::new(MemTableService::new());
    conformance(&mut client).unwrap();
}
