//! Unit tests for the message kinds, opcode registry, and value types.

use bytes::Bytes;
use rstest::rstest;

use super::*;
use crate::request::{Batch, BatchType, Execute, Query, QueryParameters, Startup};

#[rstest]
#[case::startup(RequestKind::Startup, 0x01)]
#[case::credentials(RequestKind::Credentials, 0x04)]
#[case::options(RequestKind::Options, 0x05)]
#[case::query(RequestKind::Query, 0x07)]
#[case::prepare(RequestKind::Prepare, 0x09)]
#[case::execute(RequestKind::Execute, 0x0A)]
#[case::register(RequestKind::Register, 0x0B)]
#[case::batch(RequestKind::Batch, 0x0D)]
#[case::auth_response(RequestKind::AuthResponse, 0x0F)]
fn request_opcodes_are_stable(#[case] kind: RequestKind, #[case] opcode: u8) {
    assert_eq!(kind.opcode(), opcode);
}

#[rstest]
#[case::error(ResponseKind::Error, 0x00)]
#[case::ready(ResponseKind::Ready, 0x02)]
#[case::authenticate(ResponseKind::Authenticate, 0x03)]
#[case::supported(ResponseKind::Supported, 0x06)]
#[case::result(ResponseKind::Result, 0x08)]
#[case::event(ResponseKind::Event, 0x0C)]
#[case::auth_challenge(ResponseKind::AuthChallenge, 0x0E)]
#[case::auth_success(ResponseKind::AuthSuccess, 0x10)]
fn response_opcodes_reverse_resolve(#[case] kind: ResponseKind, #[case] opcode: u8) {
    assert_eq!(kind.opcode(), opcode);
    assert_eq!(ResponseKind::from_opcode(opcode).expect("known opcode"), kind);
}

#[rstest]
#[case::request_only(0x07)]
#[case::unassigned(0x11)]
#[case::high(0xFF)]
fn unknown_opcodes_fail_reverse_lookup(#[case] opcode: u8) {
    assert_eq!(
        ResponseKind::from_opcode(opcode),
        Err(CodecError::UnknownOpcode { opcode })
    );
}

#[test]
fn duplicate_opcode_registration_fails_at_build_time() {
    let entries = [
        (0x02, ResponseKind::Ready),
        (0x02, ResponseKind::Authenticate),
    ];
    assert_eq!(
        build_opcode_table(&entries),
        Err(DuplicateOpcode { opcode: 0x02 })
    );
}

#[test]
fn full_registry_builds_without_duplicates() {
    let entries = ResponseKind::ALL.map(|kind| (kind.opcode(), kind));
    let table = build_opcode_table(&entries).expect("registry must build");
    let registered = table.iter().filter(|slot| slot.is_some()).count();
    assert_eq!(registered, ResponseKind::ALL.len());
}

#[rstest]
#[case::credentials_v2(RequestKind::Credentials, ProtocolVersion::V2, false)]
#[case::credentials_v1(RequestKind::Credentials, ProtocolVersion::V1, true)]
#[case::batch_v1(RequestKind::Batch, ProtocolVersion::V1, false)]
#[case::batch_v2(RequestKind::Batch, ProtocolVersion::V2, true)]
#[case::query_v1(RequestKind::Query, ProtocolVersion::V1, true)]
#[case::query_v2(RequestKind::Query, ProtocolVersion::V2, true)]
fn coder_support_matrix(
    #[case] kind: RequestKind,
    #[case] version: ProtocolVersion,
    #[case] expected: bool,
) {
    assert_eq!(kind.supported(version), expected);
}

#[test]
fn stream_id_is_assignable_after_construction() {
    let mut request = Request::new(RequestBody::Options);
    assert_eq!(request.stream_id(), 0);
    request.set_stream_id(42);
    assert_eq!(request.stream_id(), 42);
}

#[test]
fn tracing_defaults_off_and_sets_once() {
    let request = Request::new(RequestBody::Startup(Startup::default()));
    assert!(!request.is_tracing_requested());
    let request = request.with_tracing();
    assert!(request.is_tracing_requested());
}

fn query_request(params: QueryParameters) -> Request {
    Request::new(RequestBody::Query(Query {
        query: "SELECT * FROM t".to_owned(),
        params,
    }))
}

#[test]
fn execution_accessors_expose_query_parameters() {
    let paging_state = Bytes::from_static(b"page-token");
    let params = QueryParameters {
        consistency: Consistency::Quorum,
        serial_consistency: Some(Consistency::LocalSerial),
        paging_state: Some(paging_state.clone()),
        ..QueryParameters::default()
    };
    let request = query_request(params);

    assert_eq!(request.consistency(), Some(Consistency::Quorum));
    assert_eq!(
        request.serial_consistency(),
        Some(Consistency::LocalSerial)
    );
    assert_eq!(request.paging_state(), Some(&paging_state));
}

#[test]
fn execution_accessors_expose_execute_parameters() {
    let request = Request::new(RequestBody::Execute(Execute {
        id: Bytes::from_static(b"\x01\x02"),
        params: QueryParameters::with_consistency(Consistency::Two),
    }));

    assert_eq!(request.consistency(), Some(Consistency::Two));
    assert_eq!(request.serial_consistency(), None);
    assert_eq!(request.paging_state(), None);
}

#[test]
fn batch_exposes_consistency_only() {
    let request = Request::new(RequestBody::Batch(Batch {
        batch_type: BatchType::Logged,
        statements: Vec::new(),
        consistency: Consistency::All,
    }));

    assert_eq!(request.consistency(), Some(Consistency::All));
    assert_eq!(request.serial_consistency(), None);
    assert_eq!(request.paging_state(), None);
}

#[rstest]
#[case::options(RequestBody::Options)]
#[case::startup(RequestBody::Startup(Startup::default()))]
fn non_execution_kinds_expose_no_parameters(#[case] body: RequestBody) {
    let request = Request::new(body);
    assert_eq!(request.consistency(), None);
    assert_eq!(request.serial_consistency(), None);
    assert_eq!(request.paging_state(), None);
}
