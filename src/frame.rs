//! Wire envelope for the binary protocol.
//!
//! A [`Frame`] is the unit exchanged with the transport: an 8-byte header
//! (version byte with direction bit, flag byte, stream id, opcode, 32-bit
//! body length) followed by an opaque body. [`FrameCodec`] adapts the
//! envelope to `tokio_util`'s [`Decoder`]/[`Encoder`] traits so a transport
//! can frame a raw byte stream without understanding message semantics.
//!
//! The message layer treats the body as an opaque cursor; only the protocol
//! codec interprets it.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

/// Envelope header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Largest body the codec will accept (256 MiB, the protocol's frame cap).
pub const MAX_BODY_LENGTH: usize = 256 * 1024 * 1024;

/// Direction bit carried in the version byte: set on responses.
const DIRECTION_RESPONSE: u8 = 0x80;

/// Protocol versions served by this core.
///
/// Version negotiation happens upstream; everything downstream of the
/// negotiation works with this two-variant enum, so an out-of-range version
/// is unrepresentable past the frame boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Version 1 of the binary protocol.
    V1,
    /// Version 2 of the binary protocol.
    V2,
}

impl ProtocolVersion {
    /// Numeric version as carried on the wire (direction bit clear).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Parse a raw header version byte, stripping the direction bit.
    ///
    /// # Errors
    /// Returns [`FrameError::UnsupportedVersion`] for versions outside
    /// {1, 2}.
    pub const fn from_header_byte(byte: u8) -> Result<Self, FrameError> {
        match byte & !DIRECTION_RESPONSE {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            version => Err(FrameError::UnsupportedVersion { version }),
        }
    }
}

/// Header flag set.
///
/// Unknown bits are preserved as read so a newer peer's flags survive a
/// decode/re-encode cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    /// Body is compressed with the negotiated algorithm. The compression
    /// codec itself lives outside this crate; the flag is only carried.
    pub const COMPRESSED: Self = Self(0x01);

    /// Tracing requested (on requests) or tracing id present (on
    /// responses).
    pub const TRACING: Self = Self(0x02);

    /// The empty flag set.
    #[must_use]
    pub const fn empty() -> Self { Self(0) }

    /// Construct from a raw flag byte.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self { Self(bits) }

    /// Raw flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 { self.0 }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    /// Set every bit of `other`.
    pub fn insert(&mut self, other: Self) { self.0 |= other.0; }
}

/// Decoded frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol version the frame was produced under.
    pub version: ProtocolVersion,
    /// Header flag set.
    pub flags: Flags,
    /// Stream correlation id; one signed byte on the wire.
    pub stream_id: i8,
    /// Operation code of the message the body carries.
    pub opcode: u8,
}

/// The wire envelope: header plus opaque body bytes.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Envelope header.
    pub header: FrameHeader,
    /// Message body; ownership passes to whoever consumes the frame.
    pub body: Bytes,
}

impl Frame {
    /// Assemble a frame from its parts.
    #[must_use]
    pub fn new(header: FrameHeader, body: Bytes) -> Self { Self { header, body } }
}

/// Envelope codec: splits a byte stream into [`Frame`]s and writes frames
/// back out.
///
/// Structured [`FrameError`]s convert into `io::Error` at the trait
/// boundary, as `tokio_util` requires.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    max_body_length: usize,
}

impl FrameCodec {
    /// Construct a codec with a maximum accepted body length.
    #[must_use]
    pub const fn new(max_body_length: usize) -> Self { Self { max_body_length } }

    /// Maximum body length this codec will accept.
    #[must_use]
    pub const fn max_body_length(&self) -> usize { self.max_body_length }
}

impl Default for FrameCodec {
    fn default() -> Self { Self::new(MAX_BODY_LENGTH) }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = src.as_ref();
        let version_byte = header.get_u8();
        let flags = Flags::from_bits(header.get_u8());
        let stream_id = header.get_i8();
        let opcode = header.get_u8();
        let body_len = header.get_u32() as usize;

        // Reject bad headers before waiting for (or buffering) the body.
        let version = ProtocolVersion::from_header_byte(version_byte)?;
        if body_len > self.max_body_length {
            return Err(FrameError::OversizedBody {
                size: body_len,
                max: self.max_body_length,
            }
            .into());
        }

        if src.len() < HEADER_LEN + body_len {
            return Ok(None);
        }

        let mut frame_bytes = src.split_to(HEADER_LEN + body_len);
        frame_bytes.advance(HEADER_LEN);

        Ok(Some(Frame {
            header: FrameHeader {
                version,
                flags,
                stream_id,
                opcode,
            },
            body: frame_bytes.freeze(),
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body_len = item.body.len();
        if body_len > self.max_body_length {
            return Err(FrameError::OversizedBody {
                size: body_len,
                max: self.max_body_length,
            }
            .into());
        }
        let body_len_u32 =
            u32::try_from(body_len).map_err(|_| FrameError::BodyTooLong { size: body_len })?;

        dst.reserve(HEADER_LEN + body_len);
        dst.put_u8(item.header.version.as_u8());
        dst.put_u8(item.header.flags.bits());
        dst.put_i8(item.header.stream_id);
        dst.put_u8(item.header.opcode);
        dst.put_u32(body_len_u32);
        dst.extend_from_slice(&item.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
