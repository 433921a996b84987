//! Unit tests for the frame envelope codec.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};

use super::*;

fn sample_frame(version: ProtocolVersion, flags: Flags, stream_id: i8, opcode: u8) -> Frame {
    Frame::new(
        FrameHeader {
            version,
            flags,
            stream_id,
            opcode,
        },
        Bytes::from_static(b"\x00\x01\x02\x03"),
    )
}

#[rstest]
#[case::v1(ProtocolVersion::V1)]
#[case::v2(ProtocolVersion::V2)]
fn frame_round_trips(#[case] version: ProtocolVersion) {
    let mut codec = FrameCodec::default();
    let frame = sample_frame(version, Flags::TRACING, 7, 0x08);

    let mut wire = BytesMut::new();
    codec
        .encode(frame.clone(), &mut wire)
        .expect("encode should succeed");
    assert_eq!(wire.len(), HEADER_LEN + frame.body.len());

    let decoded = codec
        .decode(&mut wire)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(decoded.header, frame.header);
    assert_eq!(decoded.body, frame.body);
    assert!(wire.is_empty());
}

#[test]
fn decode_waits_for_a_complete_header() {
    let mut codec = FrameCodec::default();
    let mut wire = BytesMut::from(&[0x01_u8, 0x00, 0x00][..]);
    assert!(matches!(codec.decode(&mut wire), Ok(None)));
}

#[test]
fn decode_waits_for_a_complete_body() {
    let mut codec = FrameCodec::default();
    let mut wire = BytesMut::new();
    wire.put_u8(0x02);
    wire.put_u8(0x00);
    wire.put_i8(1);
    wire.put_u8(0x02);
    wire.put_u32(10);
    wire.extend_from_slice(&[0_u8; 4]);
    assert!(matches!(codec.decode(&mut wire), Ok(None)));
    // Nothing consumed while waiting.
    assert_eq!(wire.len(), HEADER_LEN + 4);
}

#[test]
fn decode_strips_the_response_direction_bit() {
    let mut codec = FrameCodec::default();
    let mut wire = BytesMut::new();
    wire.put_u8(0x82);
    wire.put_u8(0x00);
    wire.put_i8(3);
    wire.put_u8(0x02);
    wire.put_u32(0);

    let frame = codec
        .decode(&mut wire)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(frame.header.version, ProtocolVersion::V2);
    assert_eq!(frame.header.stream_id, 3);
}

#[rstest]
#[case::zero(0x00)]
#[case::v3(0x03)]
#[case::response_v3(0x83)]
fn decode_rejects_unsupported_versions(#[case] version_byte: u8) {
    let mut codec = FrameCodec::default();
    let mut wire = BytesMut::new();
    wire.put_u8(version_byte);
    wire.put_u8(0x00);
    wire.put_i8(0);
    wire.put_u8(0x02);
    wire.put_u32(0);

    let err = codec.decode(&mut wire).expect_err("expected version error");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(
        err.to_string().contains("unsupported protocol version"),
        "unexpected error: {err}"
    );
}

#[test]
fn decode_rejects_oversized_bodies_before_buffering() {
    let mut codec = FrameCodec::new(16);
    let mut wire = BytesMut::new();
    wire.put_u8(0x01);
    wire.put_u8(0x00);
    wire.put_i8(0);
    wire.put_u8(0x02);
    wire.put_u32(17);

    let err = codec.decode(&mut wire).expect_err("expected size error");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn encode_rejects_oversized_bodies() {
    let mut codec = FrameCodec::new(4);
    let frame = Frame::new(
        FrameHeader {
            version: ProtocolVersion::V1,
            flags: Flags::empty(),
            stream_id: 0,
            opcode: 0x05,
        },
        Bytes::from(vec![0_u8; 5]),
    );

    let mut wire = BytesMut::new();
    let err = codec
        .encode(frame, &mut wire)
        .expect_err("expected encode to fail");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn negative_stream_ids_survive_the_round_trip() {
    let mut codec = FrameCodec::default();
    let frame = sample_frame(ProtocolVersion::V2, Flags::empty(), -1, 0x0C);

    let mut wire = BytesMut::new();
    codec
        .encode(frame, &mut wire)
        .expect("encode should succeed");
    let decoded = codec
        .decode(&mut wire)
        .expect("decode should succeed")
        .expect("expected a frame");
    assert_eq!(decoded.header.stream_id, -1);
}

#[test]
fn unknown_flag_bits_are_preserved() {
    let flags = Flags::from_bits(0xF0);
    assert_eq!(flags.bits(), 0xF0);
    assert!(!flags.contains(Flags::TRACING));

    let mut flags = flags;
    flags.insert(Flags::TRACING);
    assert!(flags.contains(Flags::TRACING));
    assert_eq!(flags.bits(), 0xF2);
}

#[test]
fn back_to_back_frames_decode_in_order() {
    let mut codec = FrameCodec::default();
    let mut wire = BytesMut::new();
    for stream_id in [1_i8, 2, 3] {
        let frame = sample_frame(ProtocolVersion::V1, Flags::empty(), stream_id, 0x07);
        codec
            .encode(frame, &mut wire)
            .expect("encode should succeed");
    }

    for expected in [1_i8, 2, 3] {
        let frame = codec
            .decode(&mut wire)
            .expect("decode should succeed")
            .expect("expected a frame");
        assert_eq!(frame.header.stream_id, expected);
    }
    assert!(wire.is_empty());
}
