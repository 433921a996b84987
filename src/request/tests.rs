//! Unit tests for the request coders.
//!
//! The central property is the size-then-write contract: for every kind
//! and every version with a registered coder, `encode` writes exactly
//! `encoded_size` bytes. A handful of exact-layout checks pin the wire
//! format of representative kinds.

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::wire::Consistency;

fn encode_to_vec(body: &RequestBody, version: ProtocolVersion) -> Vec<u8> {
    let size = body.encoded_size(version);
    let mut dst = BytesMut::with_capacity(size);
    body.encode(version, &mut dst);
    assert_eq!(
        dst.len(),
        size,
        "{:?} under {version:?} declared {size} bytes but wrote {}",
        body.kind(),
        dst.len()
    );
    dst.to_vec()
}

fn sample_params() -> QueryParameters {
    QueryParameters {
        consistency: Consistency::Quorum,
        values: vec![Some(Bytes::from_static(b"\x00\x01")), None],
        skip_metadata: false,
        page_size: Some(5000),
        paging_state: Some(Bytes::from_static(b"resume-here")),
        serial_consistency: Some(Consistency::Serial),
    }
}

fn every_kind() -> Vec<RequestBody> {
    vec![
        RequestBody::Startup(Startup {
            cql_version: Startup::DEFAULT_CQL_VERSION.to_owned(),
            compression: Some("snappy".to_owned()),
        }),
        RequestBody::Credentials(Credentials {
            credentials: vec![("username".to_owned(), "cassandra".to_owned())],
        }),
        RequestBody::Options,
        RequestBody::Query(Query {
            query: "SELECT * FROM system.peers".to_owned(),
            params: sample_params(),
        }),
        RequestBody::Prepare(Prepare {
            query: "INSERT INTO t (k, v) VALUES (?, ?)".to_owned(),
        }),
        RequestBody::Execute(Execute {
            id: Bytes::from_static(b"\xAA\xBB\xCC\xDD"),
            params: sample_params(),
        }),
        RequestBody::Register(Register {
            events: vec![EventType::TopologyChange, EventType::StatusChange],
        }),
        RequestBody::Batch(Batch {
            batch_type: BatchType::Unlogged,
            statements: vec![
                BatchStatement::Query {
                    query: "UPDATE t SET v = ? WHERE k = ?".to_owned(),
                    values: vec![Some(Bytes::from_static(b"\x01")), None],
                },
                BatchStatement::Prepared {
                    id: Bytes::from_static(b"\x10\x20"),
                    values: vec![],
                },
            ],
            consistency: Consistency::LocalQuorum,
        }),
        RequestBody::AuthResponse(AuthResponse {
            token: Some(Bytes::from_static(b"token")),
        }),
    ]
}

#[rstest]
#[case::v1(ProtocolVersion::V1)]
#[case::v2(ProtocolVersion::V2)]
fn every_supported_coder_writes_its_declared_size(#[case] version: ProtocolVersion) {
    for body in every_kind() {
        if !body.kind().supported(version) {
            continue;
        }
        encode_to_vec(&body, version);
    }
}

#[test]
fn startup_layout_is_a_string_map() {
    let body = RequestBody::Startup(Startup::default());
    let encoded = encode_to_vec(&body, ProtocolVersion::V2);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x01]);
    expected.extend_from_slice(&[0x00, 0x0B]);
    expected.extend_from_slice(b"CQL_VERSION");
    expected.extend_from_slice(&[0x00, 0x05]);
    expected.extend_from_slice(b"3.0.0");
    assert_eq!(encoded, expected);
}

#[test]
fn options_body_is_empty() {
    assert!(encode_to_vec(&RequestBody::Options, ProtocolVersion::V1).is_empty());
}

#[test]
fn query_v1_writes_only_query_and_consistency() {
    let body = RequestBody::Query(Query {
        query: "SELECT 1".to_owned(),
        params: sample_params(),
    });
    let encoded = encode_to_vec(&body, ProtocolVersion::V1);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x08]);
    expected.extend_from_slice(b"SELECT 1");
    expected.extend_from_slice(&[0x00, 0x04]); // QUORUM
    assert_eq!(encoded, expected);
}

#[test]
fn query_v2_writes_flagged_parameter_sections_in_order() {
    let body = RequestBody::Query(Query {
        query: "SELECT 1".to_owned(),
        params: sample_params(),
    });
    let encoded = encode_to_vec(&body, ProtocolVersion::V2);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x08]);
    expected.extend_from_slice(b"SELECT 1");
    expected.extend_from_slice(&[0x00, 0x04]); // QUORUM
    // VALUES | PAGE_SIZE | PAGING_STATE | SERIAL_CONSISTENCY
    expected.push(0x1D);
    expected.extend_from_slice(&[0x00, 0x02]); // two values
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    expected.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]); // null value
    expected.extend_from_slice(&[0x00, 0x00, 0x13, 0x88]); // page size 5000
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x0B]);
    expected.extend_from_slice(b"resume-here");
    expected.extend_from_slice(&[0x00, 0x08]); // SERIAL
    assert_eq!(encoded, expected);
}

#[test]
fn execute_v1_writes_values_then_consistency() {
    let body = RequestBody::Execute(Execute {
        id: Bytes::from_static(b"\xAA\xBB"),
        params: QueryParameters {
            values: vec![Some(Bytes::from_static(b"\x07"))],
            ..QueryParameters::with_consistency(Consistency::One)
        },
    });
    let encoded = encode_to_vec(&body, ProtocolVersion::V1);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x02, 0xAA, 0xBB]);
    expected.extend_from_slice(&[0x00, 0x01]); // one value
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x07]);
    expected.extend_from_slice(&[0x00, 0x01]); // ONE
    assert_eq!(encoded, expected);
}

#[test]
fn auth_response_null_token_encodes_negative_length() {
    let body = RequestBody::AuthResponse(AuthResponse { token: None });
    assert_eq!(
        encode_to_vec(&body, ProtocolVersion::V2),
        vec![0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn register_writes_event_names() {
    let body = RequestBody::Register(Register {
        events: vec![EventType::SchemaChange],
    });
    let encoded = encode_to_vec(&body, ProtocolVersion::V1);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x01, 0x00, 0x0D]);
    expected.extend_from_slice(b"SCHEMA_CHANGE");
    assert_eq!(encoded, expected);
}

#[test]
#[should_panic(expected = "no coder registered for Batch under protocol v1")]
fn batch_under_v1_is_a_programming_error() {
    let body = RequestBody::Batch(Batch {
        batch_type: BatchType::Logged,
        statements: Vec::new(),
        consistency: Consistency::One,
    });
    let _ = body.encoded_size(ProtocolVersion::V1);
}

#[test]
#[should_panic(expected = "no coder registered for Credentials under protocol v2")]
fn credentials_under_v2_is_a_programming_error() {
    let body = RequestBody::Credentials(Credentials {
        credentials: Vec::new(),
    });
    let mut dst = BytesMut::new();
    body.encode(ProtocolVersion::V2, &mut dst);
}

fn consistency_strategy() -> impl Strategy<Value = Consistency> {
    proptest::sample::select(vec![
        Consistency::Any,
        Consistency::One,
        Consistency::Two,
        Consistency::Three,
        Consistency::Quorum,
        Consistency::All,
        Consistency::LocalQuorum,
        Consistency::EachQuorum,
        Consistency::Serial,
        Consistency::LocalSerial,
        Consistency::LocalOne,
    ])
}

fn value_strategy() -> impl Strategy<Value = Option<Bytes>> {
    proptest::option::of(proptest::collection::vec(any::<u8>(), 0..48).prop_map(Bytes::from))
}

fn params_strategy() -> impl Strategy<Value = QueryParameters> {
    (
        consistency_strategy(),
        proptest::collection::vec(value_strategy(), 0..5),
        any::<bool>(),
        proptest::option::of(1..100_000_i32),
        proptest::option::of(
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(Bytes::from),
        ),
        proptest::option::of(consistency_strategy()),
    )
        .prop_map(
            |(consistency, values, skip_metadata, page_size, paging_state, serial)| {
                QueryParameters {
                    consistency,
                    values,
                    skip_metadata,
                    page_size,
                    paging_state,
                    serial_consistency: serial,
                }
            },
        )
}

proptest! {
    #[test]
    fn query_coders_honour_the_size_contract(
        query in ".{0,64}",
        params in params_strategy(),
    ) {
        let body = RequestBody::Query(Query { query, params });
        for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
            let size = body.encoded_size(version);
            let mut dst = BytesMut::with_capacity(size);
            body.encode(version, &mut dst);
            prop_assert_eq!(dst.len(), size);
        }
    }

    #[test]
    fn execute_coders_honour_the_size_contract(
        id in proptest::collection::vec(any::<u8>(), 1..32),
        params in params_strategy(),
    ) {
        let body = RequestBody::Execute(Execute {
            id: Bytes::from(id),
            params,
        });
        for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
            let size = body.encoded_size(version);
            let mut dst = BytesMut::with_capacity(size);
            body.encode(version, &mut dst);
            prop_assert_eq!(dst.len(), size);
        }
    }
}
